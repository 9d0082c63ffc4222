//! Provider abstractions for embeddings and LLM generation
//!
//! The RAG pipeline only talks to these traits, so the Gemini backend can be
//! swapped (or mocked in tests) without touching ingestion or query code.

pub mod embedding;
pub mod gemini;
pub mod llm;

pub use embedding::{EmbeddingProvider, EmbeddingTask};
pub use gemini::GeminiClient;
pub use llm::LlmProvider;
