//! pdf-rag: PDF question answering over a REST API
//!
//! PDFs dropped into a folder are split into overlapping chunks, embedded with
//! Gemini and kept in a persistent vector store. Queries are answered with
//! Retrieval-Augmented Generation: the most similar chunks are handed to the
//! LLM, which returns a structured decision with cited justifications.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod query;
pub mod retrieval;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use ingestion::{IngestReport, PdfIngestor};
pub use query::QueryHandler;
pub use retrieval::VectorStore;
pub use server::{AppState, RagServer};
pub use types::{
    chunk::{ChunkRecord, SearchResult},
    query::{QueryRequest, StructuredQuery},
    response::{Decision, JustificationItem, QueryResponse, StatusResponse},
};
