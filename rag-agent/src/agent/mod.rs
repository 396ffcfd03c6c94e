pub mod executor;

pub use executor::{AgentExecutor, MAX_ITERATIONS_OUTPUT};

use crate::config::{Config, VectorStoreBackend};
use crate::embeddings::{Embeddings, HuggingFaceEmbeddings};
use crate::error::{RagError, Result};
use crate::llm::ChatGroq;
use crate::prompt::ChatPromptTemplate;
use crate::tools::{RetrieveTool, ToolRegistry};
use crate::vector_store::{postgres, PgVectorStore, SupabaseVectorStore, VectorStore};
use std::sync::Arc;
use tracing::info;

/// Builds the whole client graph: embeddings, vector store, retrieve tool, chat model and prompt.
pub async fn from_config(config: &Config) -> Result<AgentExecutor> {
    let embeddings: Arc<dyn Embeddings> = Arc::new(HuggingFaceEmbeddings::new(
        &config.embeddings_url,
        &config.embeddings_model,
        config.hf_api_token.clone(),
    )?);
    info!("Embeddings model: {}", config.embeddings_model);

    let store: Arc<dyn VectorStore> = match config.vector_store {
        VectorStoreBackend::Supabase => {
            let (Some(url), Some(key)) = (&config.supabase_url, &config.supabase_service_key)
            else {
                return Err(RagError::Config(
                    "SUPABASE_URL and SUPABASE_SERVICE_KEY must be set".to_string(),
                ));
            };
            Arc::new(SupabaseVectorStore::new(
                url,
                key,
                &config.table_name,
                &config.query_name,
                embeddings,
            )?)
        }
        VectorStoreBackend::Postgres => {
            let database_url = config.database_url.as_deref().ok_or_else(|| {
                RagError::Config("DATABASE_URL must be set when VECTOR_STORE=postgres".to_string())
            })?;
            let pool = postgres::create_pool(database_url).await?;
            info!("Database connection pool created");
            Arc::new(PgVectorStore::new(pool, &config.query_name, embeddings)?)
        }
    };
    info!(
        "Vector store: {:?} ({} via {})",
        config.vector_store, config.table_name, config.query_name
    );

    let llm = Arc::new(ChatGroq::new(
        &config.llm_base_url,
        &config.groq_api_key,
        &config.llm_model,
        config.temperature,
    )?);
    info!("Chat model: {} (temperature {})", config.llm_model, config.temperature);

    let prompt = match &config.prompt_url {
        Some(url) => ChatPromptTemplate::pull(&reqwest::Client::new(), url).await?,
        None => ChatPromptTemplate::openai_functions_agent(),
    };

    let tools = ToolRegistry::new().with(Arc::new(RetrieveTool::new(store, config.retrieve_k)));

    Ok(AgentExecutor::new(llm, tools, prompt)
        .max_iterations(config.max_iterations)
        .verbose(config.verbose))
}
