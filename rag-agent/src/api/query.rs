use crate::agent::AgentExecutor;
use crate::error::RagError;
use crate::models::{QueryRequest, QueryResponse};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use warp::{Rejection, Reply};

pub async fn handle_query(
    request: QueryRequest,
    agent: Arc<AgentExecutor>,
) -> Result<impl Reply, Rejection> {
    let request_id = Uuid::new_v4();

    if request.input.trim().is_empty() {
        return Err(warp::reject::custom(RagError::BadRequest(
            "`input` must not be empty".to_string(),
        )));
    }
    info!("Processing query [{}]: {}", request_id, request.input);

    let response = agent
        .invoke_with_history(&request.input, &request.chat_history)
        .await
        .map_err(|e| {
            error!("Query [{}] failed: {}", request_id, e);
            warp::reject::custom(e)
        })?;

    Ok(warp::reply::json(&QueryResponse {
        request_id,
        output: response.output,
        intermediate_steps: response.intermediate_steps,
    }))
}
