//! Sentence-based text chunking with overlap

use crate::config::ChunkingConfig;
use crate::types::ChunkRecord;

use super::parser::PageText;

/// Text chunker with configurable size and overlap
///
/// Text is split on ". " and sentences are packed greedily until the next one
/// would push the chunk past `chunk_size` characters. Each new chunk starts with
/// the tail of the previous one. A single sentence longer than `chunk_size`
/// becomes its own oversized chunk.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap between chunks
    overlap: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self { chunk_size, overlap }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Chunk every page of a PDF; chunk indexes restart on each page
    pub fn chunk_document(&self, filename: &str, pages: &[PageText]) -> Vec<ChunkRecord> {
        pages
            .iter()
            .flat_map(|page| {
                self.chunk_text(&page.text)
                    .into_iter()
                    .enumerate()
                    .map(move |(idx, content)| {
                        ChunkRecord::new(content, filename, page.number, idx as u32)
                    })
            })
            .collect()
    }

    /// Split one page of text into chunks
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in text.split(". ") {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }

            let candidate = if current.is_empty() {
                sentence.to_string()
            } else {
                format!("{}. {}", current, sentence)
            };

            if candidate.chars().count() > self.chunk_size && !current.is_empty() {
                chunks.push(current.trim().to_string());

                let overlap = self.overlap_text(&current);
                current = if overlap.is_empty() {
                    sentence.to_string()
                } else {
                    format!("{}. {}", overlap, sentence)
                };
            } else {
                current = candidate;
            }
        }

        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        chunks
    }

    /// Tail of `text` carried into the next chunk, cut at a sentence boundary when possible
    fn overlap_text(&self, text: &str) -> String {
        let len = text.chars().count();
        if len <= self.overlap {
            return text.to_string();
        }

        let start = text
            .char_indices()
            .nth(len - self.overlap)
            .map_or(text.len(), |(i, _)| i);
        let tail = &text[start..];

        let tail = match tail.rfind(". ") {
            Some(pos) if pos > 0 => &tail[pos + 2..],
            _ => tail,
        };

        tail.trim().to_string()
    }
}
