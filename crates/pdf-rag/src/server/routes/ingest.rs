//! Background ingestion trigger

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::MessageResponse;

/// POST /ingest - Index new PDFs without blocking the request
pub async fn ingest_pdfs(State(state): State<AppState>) -> Json<MessageResponse> {
    tokio::spawn(async move {
        match state.ingestor().process_pdfs_folder().await {
            Ok(report) => tracing::info!(
                "Background ingestion done: {} processed, {} chunks added",
                report.processed,
                report.chunks_added
            ),
            Err(e) => tracing::error!("Background ingestion failed: {}", e),
        }
    });

    Json(MessageResponse::new("PDF ingestion started in background"))
}
