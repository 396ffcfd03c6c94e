//! End-to-end agent run against mocked embeddings, Supabase and Groq endpoints.

use httpmock::{Method::POST, MockServer};
use rag_agent::{agent, Config};
use serde_json::json;
use std::collections::HashMap;

const QUESTION: &str = "why is agentic rag better than naive rag?";

fn config_for(server: &MockServer) -> Config {
    let env: HashMap<&str, String> = HashMap::from([
        ("SUPABASE_URL", server.base_url()),
        ("SUPABASE_SERVICE_KEY", "service-key".to_string()),
        ("GROQ_API_KEY", "gsk_test".to_string()),
        ("GROQ_BASE_URL", server.url("/openai/v1")),
        ("EMBEDDINGS_URL", server.base_url()),
        ("AGENT_VERBOSE", "false".to_string()),
    ]);
    Config::from_lookup(|key| env.get(key).cloned()).unwrap()
}

fn retrieve_tool_spec() -> serde_json::Value {
    json!({
        "type": "function",
        "function": {
            "name": "retrieve",
            "description": "Retrieve information related to a query.",
            "parameters": {
                "type": "object",
                "properties": {"query": {"type": "string"}},
                "required": ["query"]
            }
        }
    })
}

fn tool_call() -> serde_json::Value {
    json!({
        "id": "call_1",
        "type": "function",
        "function": {
            "name": "retrieve",
            "arguments": "{\"query\":\"agentic rag\"}"
        }
    })
}

#[tokio::test]
async fn test_agent_retrieves_then_answers() {
    let server = MockServer::start_async().await;

    let embed = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/sentence-transformers/all-MiniLM-L6-v2/pipeline/feature-extraction")
                .json_body(json!({"inputs": "agentic rag"}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([0.5, 0.25, -1.0]));
        })
        .await;

    let search = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/v1/rpc/match_documents")
                .query_param("limit", "2")
                .header("apikey", "service-key")
                .header("Authorization", "Bearer service-key")
                .json_body(json!({"query_embedding": [0.5, 0.25, -1.0], "filter": {}}));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!([
                    {"id": 1, "content": "Agentic RAG plans.", "metadata": {"source": "blog.md"}, "similarity": 0.9},
                    {"id": 2, "content": "Naive RAG retrieves once.", "metadata": {"source": "notes.md"}, "similarity": 0.8}
                ]));
        })
        .await;

    let first_turn = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/v1/chat/completions")
                .header("Authorization", "Bearer gsk_test")
                .json_body(json!({
                    "model": "llama-3.3-70b-versatile",
                    "messages": [
                        {"role": "system", "content": "You are a helpful assistant"},
                        {"role": "user", "content": QUESTION}
                    ],
                    "temperature": 0.0,
                    "tools": [retrieve_tool_spec()]
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "choices": [{
                        "message": {"role": "assistant", "content": null, "tool_calls": [tool_call()]},
                        "finish_reason": "tool_calls"
                    }]
                }));
        })
        .await;

    let observation = "Source: {\"source\":\"blog.md\"}\nContent: Agentic RAG plans.\n\n\
                       Source: {\"source\":\"notes.md\"}\nContent: Naive RAG retrieves once.";

    let second_turn = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/openai/v1/chat/completions")
                .json_body(json!({
                    "model": "llama-3.3-70b-versatile",
                    "messages": [
                        {"role": "system", "content": "You are a helpful assistant"},
                        {"role": "user", "content": QUESTION},
                        {"role": "assistant", "content": null, "tool_calls": [tool_call()]},
                        {"role": "tool", "tool_call_id": "call_1", "content": observation}
                    ],
                    "temperature": 0.0,
                    "tools": [retrieve_tool_spec()]
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "choices": [{
                        "message": {"role": "assistant", "content": "Agentic RAG can retrieve iteratively."},
                        "finish_reason": "stop"
                    }]
                }));
        })
        .await;

    let executor = agent::from_config(&config_for(&server)).await.unwrap();
    let response = executor.invoke(QUESTION).await.unwrap();

    embed.assert_async().await;
    search.assert_async().await;
    first_turn.assert_async().await;
    second_turn.assert_async().await;

    assert_eq!(response.output, "Agentic RAG can retrieve iteratively.");
    assert_eq!(response.intermediate_steps.len(), 1);

    let step = &response.intermediate_steps[0];
    assert_eq!(step.tool, "retrieve");
    assert_eq!(step.tool_input, json!({"query": "agentic rag"}));
    assert_eq!(step.observation, observation);
    assert_eq!(
        step.artifact,
        json!([
            {"id": "1", "metadata": {"source": "blog.md"}, "page_content": "Agentic RAG plans."},
            {"id": "2", "metadata": {"source": "notes.md"}, "page_content": "Naive RAG retrieves once."}
        ])
    );
}

#[tokio::test]
async fn test_provider_error_propagates() {
    let server = MockServer::start_async().await;

    let completion = server
        .mock_async(|when, then| {
            when.method(POST).path("/openai/v1/chat/completions");
            then.status(429).body("rate limited");
        })
        .await;

    let executor = agent::from_config(&config_for(&server)).await.unwrap();
    let err = executor.invoke(QUESTION).await.unwrap_err();

    completion.assert_async().await;
    assert!(matches!(err, rag_agent::RagError::Llm(_)));
    assert!(err.to_string().contains("rate limited"));
}
