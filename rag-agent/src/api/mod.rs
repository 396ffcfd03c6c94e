use crate::agent::AgentExecutor;
use crate::error::handle_rejection;
use std::sync::Arc;
use warp::{Filter, Rejection, Reply};

mod query;

pub fn routes(
    agent: Arc<AgentExecutor>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let api = warp::path("api").and(warp::path("v1"));

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&serde_json::json!({"status": "healthy"})));

    let query_route = api
        .and(warp::path("query"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(1024 * 1024))
        .and(warp::body::json())
        .and(with_agent(agent))
        .and_then(query::handle_query);

    health.or(query_route).recover(handle_rejection)
}

fn with_agent(
    agent: Arc<AgentExecutor>,
) -> impl Filter<Extract = (Arc<AgentExecutor>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || agent.clone())
}
