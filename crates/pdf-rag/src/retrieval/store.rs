//! Vector store for chunk storage and search
//!
//! Chunks and their embeddings live in memory as two parallel vectors and are
//! persisted as a pair of JSON files. Search is an exact cosine scan.

use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::StorageConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, EmbeddingTask};
use crate::types::{ChunkRecord, SearchResult, StoreStats};

#[derive(Default)]
struct StoreData {
    chunks: Vec<ChunkRecord>,
    /// `embeddings[i]` belongs to `chunks[i]`
    embeddings: Vec<Vec<f32>>,
}

/// In-memory vector store backed by `documents.json` + `embeddings.json`
pub struct VectorStore {
    embedder: Arc<dyn EmbeddingProvider>,
    documents_path: PathBuf,
    embeddings_path: PathBuf,
    data: RwLock<StoreData>,
    /// Serialises writers of the JSON files
    persist_lock: Mutex<()>,
}

impl VectorStore {
    /// Open the store, loading any previously persisted data
    pub async fn open(storage: &StorageConfig, embedder: Arc<dyn EmbeddingProvider>) -> Result<Self> {
        tokio::fs::create_dir_all(&storage.data_dir).await?;

        let documents_path = storage.documents_path();
        let embeddings_path = storage.embeddings_path();
        let data = load(&documents_path, &embeddings_path).await;

        tracing::info!(
            "Vector store opened with {} chunks ({})",
            data.chunks.len(),
            storage.data_dir.display()
        );

        Ok(Self {
            embedder,
            documents_path,
            embeddings_path,
            data: RwLock::new(data),
            persist_lock: Mutex::new(()),
        })
    }

    /// Embed and store chunks, then persist
    ///
    /// A failed embedding or a failed write aborts the whole batch; nothing
    /// is stored.
    pub async fn add_documents(&self, chunks: Vec<ChunkRecord>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts, EmbeddingTask::RetrievalDocument)
            .await?;

        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let added = chunks.len();
        let _guard = self.persist_lock.lock().await;
        let previous_len = {
            let mut data = self.data.write();
            let previous_len = data.chunks.len();
            data.chunks.extend(chunks);
            data.embeddings.extend(embeddings);
            previous_len
        };

        if let Err(e) = self.save_locked().await {
            let mut data = self.data.write();
            data.chunks.truncate(previous_len);
            data.embeddings.truncate(previous_len);
            return Err(e);
        }

        tracing::debug!("Added {} chunks to vector store", added);
        Ok(added)
    }

    /// Embed the query and return the `top_k` most similar chunks
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(query, EmbeddingTask::RetrievalQuery)
            .await?;

        Ok(self.search_by_vector(&query_embedding, top_k))
    }

    /// Rank stored chunks against a precomputed query embedding
    pub fn search_by_vector(&self, query_embedding: &[f32], top_k: usize) -> Vec<SearchResult> {
        let data = self.data.read();

        let mut scored: Vec<(usize, f32)> = data
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_similarity(query_embedding, e)))
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(i, sim)| SearchResult::from_chunk(&data.chunks[i], sim))
            .collect()
    }

    /// Whether any chunk of `filename` is stored
    pub fn is_document_processed(&self, filename: &str) -> bool {
        self.data.read().chunks.iter().any(|c| c.source == filename)
    }

    pub fn stats(&self) -> StoreStats {
        let data = self.data.read();
        let documents = data
            .chunks
            .iter()
            .map(|c| c.source.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        StoreStats {
            documents,
            chunks: data.chunks.len(),
        }
    }

    /// Distinct source file names, sorted
    pub fn list_documents(&self) -> Vec<String> {
        self.data
            .read()
            .chunks
            .iter()
            .map(|c| c.source.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Remove every chunk of `filename`; returns how many were removed
    pub async fn delete_document(&self, filename: &str) -> Result<usize> {
        let _guard = self.persist_lock.lock().await;
        let removed = {
            let mut data = self.data.write();
            let before = data.chunks.len();
            let StoreData { chunks, embeddings } = &mut *data;

            let mut keep = chunks.iter().map(|c| c.source != filename);
            embeddings.retain(|_| keep.next().unwrap_or(true));
            chunks.retain(|c| c.source != filename);

            before - chunks.len()
        };

        if removed > 0 {
            self.save_locked().await?;
            tracing::info!("Deleted {} chunks of {}", removed, filename);
        }

        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.data.read().chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write both JSON files
    pub async fn save(&self) -> Result<()> {
        let _guard = self.persist_lock.lock().await;
        self.save_locked().await
    }

    /// Caller holds `persist_lock`
    async fn save_locked(&self) -> Result<()> {
        let (documents, embeddings) = {
            let data = self.data.read();
            (
                serde_json::to_vec(&data.chunks)?,
                serde_json::to_vec(&data.embeddings)?,
            )
        };

        write_atomic(&self.documents_path, &documents).await?;
        write_atomic(&self.embeddings_path, &embeddings).await?;
        Ok(())
    }

    /// Flush to disk before shutdown
    pub async fn close(&self) -> Result<()> {
        self.save().await?;
        tracing::info!("Vector store closed with {} chunks", self.len());
        Ok(())
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await.map_err(|e| {
        Error::vector_store(format!("Failed to write {}: {}", path.display(), e))
    })
}

/// Load the persisted pair; anything unreadable starts an empty store
async fn load(documents_path: &Path, embeddings_path: &Path) -> StoreData {
    if !documents_path.exists() || !embeddings_path.exists() {
        return StoreData::default();
    }

    match read_pair(documents_path, embeddings_path).await {
        Ok(mut data) => {
            if data.chunks.len() != data.embeddings.len() {
                let keep = data.chunks.len().min(data.embeddings.len());
                tracing::warn!(
                    "Persisted store is inconsistent ({} chunks, {} embeddings); keeping {}",
                    data.chunks.len(),
                    data.embeddings.len(),
                    keep
                );
                data.chunks.truncate(keep);
                data.embeddings.truncate(keep);
            }
            tracing::info!("Loaded {} chunks from disk", data.chunks.len());
            data
        }
        Err(e) => {
            tracing::error!("Failed to load persisted store, starting empty: {}", e);
            StoreData::default()
        }
    }
}

async fn read_pair(documents_path: &Path, embeddings_path: &Path) -> Result<StoreData> {
    let documents = tokio::fs::read(documents_path).await?;
    let embeddings = tokio::fs::read(embeddings_path).await?;

    Ok(StoreData {
        chunks: serde_json::from_slice(&documents)?,
        embeddings: serde_json::from_slice(&embeddings)?,
    })
}

/// Compute cosine similarity between two embeddings
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
