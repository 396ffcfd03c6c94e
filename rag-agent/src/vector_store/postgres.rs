// Postgres vector store: calls the same match function directly over a sqlx pool

use super::{vector_literal, VectorStore};
use crate::embeddings::Embeddings;
use crate::error::{RagError, Result};
use crate::models::Document;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres, Row};
use std::sync::Arc;
use tracing::info;

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(database_url: &str) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    Ok(pool)
}

pub struct PgVectorStore {
    pool: DbPool,
    query_name: String,
    embeddings: Arc<dyn Embeddings>,
}

impl PgVectorStore {
    pub fn new(pool: DbPool, query_name: &str, embeddings: Arc<dyn Embeddings>) -> Result<Self> {
        if !is_identifier(query_name) {
            return Err(RagError::Config(format!(
                "`{}` is not a valid SQL function name",
                query_name
            )));
        }

        Ok(Self {
            pool,
            query_name: query_name.to_string(),
            embeddings,
        })
    }

    fn search_sql(&self) -> String {
        format!(
            "SELECT id::text AS id, content, metadata \
             FROM {}($1::vector, $2::jsonb) LIMIT $3",
            self.query_name
        )
    }
}

#[async_trait]
impl VectorStore for PgVectorStore {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let embedding = self.embeddings.embed_query(query).await?;

        let rows = sqlx::query(&self.search_sql())
            .bind(vector_literal(&embedding))
            .bind(serde_json::json!({}))
            .bind(k as i64)
            .fetch_all(&self.pool)
            .await?;
        info!("Postgres: {} rows matched via {}", rows.len(), self.query_name);

        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let content: Option<String> = row.try_get("content")?;
            let Some(content) = content.filter(|c| !c.is_empty()) else {
                continue;
            };
            let metadata: Option<Value> = row.try_get("metadata")?;

            documents.push(Document {
                id: row.try_get("id")?,
                metadata: match metadata {
                    Some(Value::Object(map)) => map,
                    _ => Default::default(),
                },
                page_content: content,
            });
        }
        documents.truncate(k);

        Ok(documents)
    }
}

/// Accepts `name` or `schema.name` made of ASCII letters, digits and underscores.
fn is_identifier(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_validation() {
        assert!(is_identifier("match_documents"));
        assert!(is_identifier("public.match_documents"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1match"));
        assert!(!is_identifier("match_documents; DROP TABLE documents"));
        assert!(!is_identifier("a.b.c"));
    }
}
