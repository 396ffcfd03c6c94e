use crate::error::{RagError, Result};
use serde::Deserialize;

pub const DEFAULT_QUERY: &str = "why is agentic rag better than naive rag?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreBackend {
    /// PostgREST RPC against a Supabase project
    Supabase,
    /// Direct connection to the same Postgres database
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub log_level: String,

    pub vector_store: VectorStoreBackend,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub database_url: Option<String>,
    pub table_name: String,
    pub query_name: String,
    pub retrieve_k: usize,

    pub embeddings_url: String,
    pub embeddings_model: String,
    pub hf_api_token: Option<String>,

    pub groq_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub temperature: f32,

    pub max_iterations: usize,
    pub verbose: bool,
    pub prompt_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let vector_store = match or("VECTOR_STORE", "supabase").to_lowercase().as_str() {
            "supabase" => VectorStoreBackend::Supabase,
            "postgres" => VectorStoreBackend::Postgres,
            other => {
                return Err(RagError::Config(format!(
                    "VECTOR_STORE must be `supabase` or `postgres`, got `{}`",
                    other
                )))
            }
        };

        let config = Config {
            port: parse(&or("PORT", "8080"), "PORT")?,
            log_level: or("LOG_LEVEL", "info"),

            vector_store,
            supabase_url: get("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            supabase_service_key: get("SUPABASE_SERVICE_KEY"),
            database_url: get("DATABASE_URL"),
            table_name: or("SUPABASE_TABLE", "documents"),
            query_name: or("SUPABASE_QUERY_NAME", "match_documents"),
            retrieve_k: parse(&or("RETRIEVE_K", "2"), "RETRIEVE_K")?,

            embeddings_url: or(
                "EMBEDDINGS_URL",
                "https://router.huggingface.co/hf-inference/models",
            )
            .trim_end_matches('/')
            .to_string(),
            embeddings_model: or("EMBEDDINGS_MODEL", "sentence-transformers/all-MiniLM-L6-v2"),
            hf_api_token: get("HF_API_TOKEN"),

            groq_api_key: get("GROQ_API_KEY")
                .ok_or_else(|| RagError::Config("GROQ_API_KEY must be set".to_string()))?,
            llm_base_url: or("GROQ_BASE_URL", "https://api.groq.com/openai/v1")
                .trim_end_matches('/')
                .to_string(),
            llm_model: or("LLM_MODEL", "llama-3.3-70b-versatile"),
            temperature: parse(&or("LLM_TEMPERATURE", "0"), "LLM_TEMPERATURE")?,

            max_iterations: parse(&or("MAX_ITERATIONS", "15"), "MAX_ITERATIONS")?,
            verbose: parse_flag(&or("AGENT_VERBOSE", "true"), "AGENT_VERBOSE")?,
            prompt_url: get("PROMPT_URL"),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        match self.vector_store {
            VectorStoreBackend::Supabase => {
                if self.supabase_url.is_none() {
                    return Err(RagError::Config("SUPABASE_URL must be set".to_string()));
                }
                if self.supabase_service_key.is_none() {
                    return Err(RagError::Config(
                        "SUPABASE_SERVICE_KEY must be set".to_string(),
                    ));
                }
            }
            VectorStoreBackend::Postgres => {
                if self.database_url.is_none() {
                    return Err(RagError::Config(
                        "DATABASE_URL must be set when VECTOR_STORE=postgres".to_string(),
                    ));
                }
            }
        }

        if self.retrieve_k == 0 {
            return Err(RagError::Config("RETRIEVE_K must be at least 1".to_string()));
        }
        if self.max_iterations == 0 {
            return Err(RagError::Config(
                "MAX_ITERATIONS must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse<T: std::str::FromStr>(raw: &str, key: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| RagError::Config(format!("{} has an invalid value: `{}`", key, raw)))
}

/// Accepts `true/false`, `1/0`, `yes/no` and `on/off`, case-insensitively.
fn parse_flag(raw: &str, key: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(RagError::Config(format!(
            "{} has an invalid value: `{}`",
            key, raw
        ))),
    }
}
