// Supabase vector store: pgvector similarity search through the PostgREST RPC endpoint

use super::VectorStore;
use crate::embeddings::Embeddings;
use crate::error::{RagError, Result};
use crate::models::Document;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SupabaseVectorStore {
    client: Client,
    url: String,
    service_key: String,
    table_name: String,
    query_name: String,
    embeddings: Arc<dyn Embeddings>,
}

#[derive(Debug, Deserialize)]
struct MatchRow {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    metadata: Option<Map<String, Value>>,
    #[serde(default)]
    similarity: Option<f64>,
}

impl SupabaseVectorStore {
    pub fn new(
        url: &str,
        service_key: &str,
        table_name: &str,
        query_name: &str,
        embeddings: Arc<dyn Embeddings>,
    ) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            table_name: table_name.to_string(),
            query_name: query_name.to_string(),
            embeddings,
        })
    }

    async fn match_documents(&self, embedding: Vec<f32>, k: usize) -> Result<Vec<MatchRow>> {
        let url = format!("{}/rest/v1/rpc/{}", self.url, self.query_name);

        let response = self
            .client
            .post(&url)
            .query(&[("limit", k.to_string())])
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&json!({
                "query_embedding": embedding,
                "filter": {},
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::VectorStore(format!(
                "{} on `{}` returned HTTP {}: {}",
                self.query_name, self.table_name, status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl VectorStore for SupabaseVectorStore {
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>> {
        let embedding = self.embeddings.embed_query(query).await?;
        let rows = self.match_documents(embedding, k).await?;
        info!("Supabase: {} rows matched in `{}`", rows.len(), self.table_name);

        let documents: Vec<Document> = rows
            .into_iter()
            .filter_map(|row| {
                let content = row.content.filter(|c| !c.is_empty())?;
                debug!("match id={} similarity={:?}", row.id, row.similarity);
                Some(Document {
                    id: match row.id {
                        Value::Null => None,
                        Value::String(s) => Some(s),
                        other => Some(other.to_string()),
                    },
                    metadata: row.metadata.unwrap_or_default(),
                    page_content: content,
                })
            })
            .take(k)
            .collect();

        Ok(documents)
    }
}
