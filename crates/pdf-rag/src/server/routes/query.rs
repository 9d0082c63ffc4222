//! Query endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /query - Answer a natural-language query
pub async fn query(
    State(state): State<AppState>,
    payload: std::result::Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>> {
    let Json(request) = payload?;
    let query = request.query.trim();
    if query.is_empty() {
        return Err(Error::InvalidRequest("Query cannot be empty".to_string()));
    }
    if request.top_k == Some(0) {
        return Err(Error::InvalidRequest("top_k must be greater than zero".to_string()));
    }

    let start = Instant::now();
    tracing::info!("Query: \"{}\"", query);

    let response = state
        .query_handler()
        .process_query(query, request.top_k)
        .await;

    tracing::info!(
        "Answered in {}ms with decision {}",
        start.elapsed().as_millis(),
        response.decision
    );

    Ok(Json(response))
}
