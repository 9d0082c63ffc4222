//! Retrieval: persisted chunk embeddings and similarity search

mod store;

pub use store::{cosine_similarity, VectorStore};
