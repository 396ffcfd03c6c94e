// Retrieve tool: similarity search plus the text block handed back to the model

use super::{Tool, ToolOutput};
use crate::error::{RagError, Result};
use crate::models::{Document, ToolDefinition};
use crate::vector_store::VectorStore;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

pub const RETRIEVE_TOOL_NAME: &str = "retrieve";

pub struct RetrieveTool {
    store: Arc<dyn VectorStore>,
    k: usize,
}

#[derive(Debug, Deserialize)]
struct RetrieveArgs {
    query: String,
}

impl RetrieveTool {
    pub fn new(store: Arc<dyn VectorStore>, k: usize) -> Self {
        Self { store, k }
    }

    /// Runs a top-k similarity search and returns the serialized text with the raw documents.
    pub async fn retrieve(&self, query: &str) -> Result<(String, Vec<Document>)> {
        info!("Retriever: Searching for: {}", query);

        let mut documents = self.store.similarity_search(query, self.k).await?;
        documents.truncate(self.k);

        let serialized = serialize_documents(&documents);
        Ok((serialized, documents))
    }
}

/// `Source: {metadata}\nContent: {content}` per document, separated by a blank line.
pub fn serialize_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| {
            format!(
                "Source: {}\nContent: {}",
                Value::Object(doc.metadata.clone()),
                doc.page_content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for RetrieveTool {
    fn name(&self) -> &str {
        RETRIEVE_TOOL_NAME
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: RETRIEVE_TOOL_NAME.to_string(),
            description: "Retrieve information related to a query.".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn call(&self, args: Value) -> Result<ToolOutput> {
        let args: RetrieveArgs = serde_json::from_value(args).map_err(|e| RagError::Tool {
            tool: RETRIEVE_TOOL_NAME.to_string(),
            message: format!("invalid arguments: {}", e),
        })?;

        let (content, documents) = self.retrieve(&args.query).await?;
        Ok(ToolOutput {
            content,
            artifact: serde_json::to_value(documents)?,
        })
    }
}
