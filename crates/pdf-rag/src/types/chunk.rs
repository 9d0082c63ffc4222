//! Chunk records and search results

use serde::{Deserialize, Serialize};

/// A chunk of page text with its citation metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Chunk text
    pub content: String,
    /// Source PDF file name
    pub source: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Stable identifier, `{stem}-p{page}-c{index}`
    pub chunk_id: String,
    /// Chunk index within its page
    #[serde(default)]
    pub chunk_index: u32,
}

impl ChunkRecord {
    /// Create a chunk record, deriving its ID from source, page and index
    pub fn new(content: String, source: impl Into<String>, page: u32, chunk_index: u32) -> Self {
        let source = source.into();
        let chunk_id = chunk_id(&source, page, chunk_index);
        Self {
            content,
            source,
            page,
            chunk_id,
            chunk_index,
        }
    }
}

/// Build the chunk ID for a file, page and chunk index
pub fn chunk_id(filename: &str, page: u32, chunk_index: u32) -> String {
    let stem = match filename.rfind('.') {
        Some(pos) if pos > 0 => &filename[..pos],
        _ => filename,
    };
    format!("{}-p{}-c{}", stem, page, chunk_index)
}

/// A retrieved chunk with its similarity to the query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub content: String,
    pub source: String,
    pub page: u32,
    pub chunk_id: String,
    /// Cosine similarity (higher is closer)
    pub similarity: f32,
    /// `1 - similarity`
    pub distance: f32,
}

impl SearchResult {
    pub fn from_chunk(chunk: &ChunkRecord, similarity: f32) -> Self {
        Self {
            content: chunk.content.clone(),
            source: chunk.source.clone(),
            page: chunk.page,
            chunk_id: chunk.chunk_id.clone(),
            similarity,
            distance: 1.0 - similarity,
        }
    }
}

/// Vector store counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Distinct source files
    pub documents: usize,
    /// Stored chunks
    pub chunks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_id() {
        assert_eq!(chunk_id("policy.pdf", 3, 0), "policy-p3-c0");
        assert_eq!(chunk_id("health.policy.PDF", 1, 2), "health.policy-p1-c2");
        assert_eq!(chunk_id("noext", 1, 1), "noext-p1-c1");
        assert_eq!(chunk_id(".hidden", 2, 0), ".hidden-p2-c0");
    }

    #[test]
    fn test_search_result_distance() {
        let chunk = ChunkRecord::new("Knee surgery is covered.".into(), "policy.pdf", 4, 1);
        assert_eq!(chunk.chunk_id, "policy-p4-c1");

        let result = SearchResult::from_chunk(&chunk, 0.75);
        assert_eq!(result.page, 4);
        assert!((result.distance - 0.25).abs() < f32::EPSILON);
    }
}
