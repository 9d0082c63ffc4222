//! Core types for the RAG service

pub mod chunk;
pub mod query;
pub mod response;

pub use chunk::{ChunkRecord, SearchResult, StoreStats};
pub use query::{QueryRequest, StructuredQuery};
pub use response::{
    Decision, DocumentListResponse, JustificationItem, MessageResponse, QueryResponse,
    StatusResponse,
};
