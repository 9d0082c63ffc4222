//! API routes for the RAG server

pub mod documents;
pub mod ingest;
pub mod query;

use axum::{
    extract::State,
    routing::{delete, get, post},
    Json, Router,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{MessageResponse, StatusResponse};

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/status", get(status))
        .route("/query", post(query::query))
        .route("/ingest", post(ingest::ingest_pdfs))
        .route("/documents", get(documents::list_documents))
        .route("/documents/:filename", delete(documents::delete_document))
        .route("/info", get(info))
}

/// GET / - Liveness message
async fn root() -> Json<MessageResponse> {
    Json(MessageResponse::new("RAG PDF Query API is running with Gemini"))
}

/// GET /status - Store counters
async fn status(State(state): State<AppState>) -> Result<Json<StatusResponse>> {
    if !state.is_ready() {
        return Err(Error::NotReady("Service not initialized".to_string()));
    }

    let stats = state.store().stats();
    Ok(Json(StatusResponse {
        status: "healthy".to_string(),
        documents_count: stats.documents,
        chunks_count: stats.chunks,
    }))
}

/// GET /info - API info
async fn info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": "pdf-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Query PDF documents in natural language with Retrieval-Augmented Generation",
        "endpoints": {
            "GET /": "Liveness message",
            "GET /health": "Health check",
            "GET /ready": "Readiness check",
            "GET /status": "Indexed document and chunk counts",
            "POST /query": "Answer a query against the indexed PDFs",
            "POST /ingest": "Index new PDFs from the PDFs folder in the background",
            "GET /documents": "List indexed PDFs",
            "DELETE /documents/:filename": "Remove a PDF from the index"
        }
    }))
}
