use crate::error::Result;
use crate::models::Document;
use async_trait::async_trait;

pub mod postgres;
pub mod supabase;

pub use postgres::PgVectorStore;
pub use supabase::SupabaseVectorStore;

/// A pre-populated index that ranks stored documents by similarity to a query.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Returns at most `k` documents, most similar first.
    async fn similarity_search(&self, query: &str, k: usize) -> Result<Vec<Document>>;
}

/// pgvector's text input format, e.g. `[0.1,0.2,0.3]`.
pub(crate) fn vector_literal(embedding: &[f32]) -> String {
    let parts: Vec<String> = embedding.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
        assert_eq!(vector_literal(&[]), "[]");
    }
}
