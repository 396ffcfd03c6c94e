// Embeddings: maps query text to a dense vector for similarity search

use crate::error::{RagError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Embeddings: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;
}

/// Hosted sentence-transformers model served by the Hugging Face feature-extraction pipeline.
#[derive(Debug, Clone)]
pub struct HuggingFaceEmbeddings {
    client: Client,
    base_url: String,
    model: String,
    api_token: Option<String>,
}

/// The pipeline answers with a flat vector for pooled models, or one vector per token otherwise.
#[derive(Deserialize)]
#[serde(untagged)]
enum FeatureExtraction {
    Pooled(Vec<f32>),
    Batched(Vec<Vec<f32>>),
}

impl HuggingFaceEmbeddings {
    pub fn new(base_url: &str, model: &str, api_token: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_token,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}/pipeline/feature-extraction",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl Embeddings for HuggingFaceEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Embedding query with {}", self.model);

        let mut request = self
            .client
            .post(self.endpoint())
            .json(&json!({ "inputs": text }));
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::Embedding(format!("HTTP {}: {}", status, body)));
        }

        let vector = match response.json::<FeatureExtraction>().await? {
            FeatureExtraction::Pooled(vector) => vector,
            FeatureExtraction::Batched(mut rows) if rows.len() == 1 => rows.remove(0),
            FeatureExtraction::Batched(rows) => mean_pool(&rows),
        };

        if vector.is_empty() {
            return Err(RagError::Embedding(
                "embedding service returned an empty vector".to_string(),
            ));
        }

        Ok(vector)
    }
}

fn mean_pool(rows: &[Vec<f32>]) -> Vec<f32> {
    let Some(width) = rows.first().map(Vec::len) else {
        return vec![];
    };

    let mut pooled = vec![0.0; width];
    for row in rows {
        for (acc, v) in pooled.iter_mut().zip(row) {
            *acc += v;
        }
    }
    let n = rows.len() as f32;
    pooled.iter_mut().for_each(|v| *v /= n);
    pooled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool() {
        let pooled = mean_pool(&[vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(pooled, vec![2.0, 3.0]);
        assert!(mean_pool(&[]).is_empty());
    }

    #[test]
    fn test_endpoint_includes_model() {
        let embeddings = HuggingFaceEmbeddings::new(
            "https://router.huggingface.co/hf-inference/models/",
            "sentence-transformers/all-MiniLM-L6-v2",
            None,
        )
        .unwrap();

        assert_eq!(
            embeddings.endpoint(),
            "https://router.huggingface.co/hf-inference/models/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction"
        );
    }
}
