//! Tool-calling agent that answers questions with documents retrieved from a
//! Supabase (pgvector) index.

pub mod agent;
pub mod api;
pub mod cli;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod prompt;
pub mod tools;
pub mod vector_store;

pub use agent::AgentExecutor;
pub use config::Config;
pub use error::{RagError, Result};
pub use models::Document;
