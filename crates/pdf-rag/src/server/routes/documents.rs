//! Indexed document listing and removal

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::DocumentListResponse;

/// GET /documents - List indexed PDFs
pub async fn list_documents(State(state): State<AppState>) -> Json<DocumentListResponse> {
    Json(DocumentListResponse {
        documents: state.store().list_documents(),
    })
}

/// DELETE /documents/:filename - Drop a PDF's chunks from the index
///
/// The file in the PDFs folder is left alone, so the next ingestion run
/// indexes it again.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let removed = state.store().delete_document(&filename).await?;

    if removed == 0 {
        return Err(Error::DocumentNotFound(filename));
    }

    tracing::info!("Deleted document: {} ({} chunks)", filename, removed);

    Ok(Json(serde_json::json!({
        "deleted": true,
        "filename": filename,
        "chunks_removed": removed
    })))
}
