use async_trait::async_trait;
use rag_agent::embeddings::Embeddings;
use rag_agent::tools::RetrieveTool;
use rag_agent::vector_store::postgres::{create_pool, DbPool};
use rag_agent::vector_store::{PgVectorStore, VectorStore};
use serde_json::json;
use std::sync::Arc;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

const POSTGRES_PORT: u16 = 5432;

struct StaticEmbeddings;

#[async_trait]
impl Embeddings for StaticEmbeddings {
    async fn embed_query(&self, _text: &str) -> rag_agent::Result<Vec<f32>> {
        Ok(vec![1.0, 0.0, 0.0])
    }
}

#[tokio::test]
async fn vector_search_test() {
    let container = start_container().await;

    let host = container.get_host().await.unwrap().to_string();
    let port = container
        .get_host_port_ipv4(POSTGRES_PORT)
        .await
        .expect("Error getting docker port");

    let pool = create_pool(&format!("postgres://postgres:postgres@{}:{}/rag", host, port))
        .await
        .expect("Failed to create postgres pool");

    sqlx::migrate!("./tests/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    seed(&pool).await;

    let store = PgVectorStore::new(pool.clone(), "match_documents", Arc::new(StaticEmbeddings))
        .expect("valid function name");

    // ranking is closest, empty, second, far; the empty row is dropped
    let documents = store.similarity_search("anything", 3).await.unwrap();
    assert_eq!(documents.len(), 2);
    assert_eq!(documents[0].id.as_deref(), Some("1"));
    assert_eq!(documents[0].page_content, "closest");
    assert_eq!(documents[0].metadata.get("source"), Some(&json!("a.md")));
    assert_eq!(documents[1].id.as_deref(), Some("2"));
    assert_eq!(documents[1].page_content, "second");

    let documents = store.similarity_search("anything", 1).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].page_content, "closest");

    let tool = RetrieveTool::new(Arc::new(store), 3);
    let (serialized, _) = tool.retrieve("anything").await.unwrap();
    assert_eq!(
        serialized,
        "Source: {\"source\":\"a.md\"}\nContent: closest\n\nSource: {\"source\":\"b.md\"}\nContent: second"
    );
}

async fn seed(pool: &DbPool) {
    let rows = [
        ("closest", json!({"source": "a.md"}), "[1,0,0]"),
        ("second", json!({"source": "b.md"}), "[0.9,0.1,0]"),
        ("far", json!({"source": "c.md"}), "[0,1,0]"),
        ("", json!({"source": "d.md"}), "[0.99,0.01,0]"),
    ];

    for (content, metadata, embedding) in rows {
        sqlx::query("INSERT INTO documents (content, metadata, embedding) VALUES ($1, $2, $3::vector)")
            .bind(content)
            .bind(metadata)
            .bind(embedding)
            .execute(pool)
            .await
            .expect("Failed to insert document");
    }
}

async fn start_container() -> ContainerAsync<GenericImage> {
    // Setup a local postgres container for testing. NOTE: docker service must be running.
    GenericImage::new("pgvector/pgvector", "pg17")
        .with_wait_for(WaitFor::message_on_stderr(
            "database system is ready to accept connections",
        ))
        .with_exposed_port(POSTGRES_PORT.tcp())
        .with_env_var("POSTGRES_USER", "postgres")
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .with_env_var("POSTGRES_DB", "rag")
        .start()
        .await
        .expect("Failed to start postgres with pgvector container")
}
