//! Folder ingestion: parse, chunk, embed and store every new PDF

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::retrieval::VectorStore;

use super::chunker::TextChunker;
use super::parser::PdfParser;

/// Outcome of one pass over the PDF folder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Newly indexed files
    pub processed: usize,
    /// Files already in the store
    pub skipped: usize,
    /// Files without extractable text
    pub empty: usize,
    /// Files that could not be parsed or embedded
    pub failed: usize,
    pub chunks_added: usize,
}

/// Indexes PDFs from the configured folder into the vector store
pub struct PdfIngestor {
    store: Arc<VectorStore>,
    chunker: TextChunker,
    pdfs_dir: PathBuf,
    parse_timeout: Duration,
    /// One folder pass at a time
    run_lock: Mutex<()>,
}

impl PdfIngestor {
    pub fn new(config: &RagConfig, store: Arc<VectorStore>) -> Self {
        Self {
            store,
            chunker: TextChunker::from_config(&config.chunking),
            pdfs_dir: config.storage.pdfs_dir.clone(),
            parse_timeout: Duration::from_secs(config.storage.pdf_timeout_secs),
            run_lock: Mutex::new(()),
        }
    }

    pub fn pdfs_dir(&self) -> &Path {
        &self.pdfs_dir
    }

    /// Process every PDF in the folder that is not indexed yet
    ///
    /// Per-file failures are logged and counted; only an unreadable folder is an error.
    pub async fn process_pdfs_folder(&self) -> Result<IngestReport> {
        let _guard = self.run_lock.lock().await;
        let mut report = IngestReport::default();

        let pdf_files = self.list_pdfs().await?;
        if pdf_files.is_empty() {
            tracing::info!("No PDF files found in {}", self.pdfs_dir.display());
            return Ok(report);
        }

        tracing::info!("Found {} PDF files to process", pdf_files.len());

        for path in pdf_files {
            let filename = file_name(&path);

            if self.store.is_document_processed(&filename) {
                tracing::info!("Skipping {} - already processed", filename);
                report.skipped += 1;
                continue;
            }

            tracing::info!("Processing {}", filename);
            match self.process_pdf(&path).await {
                Ok(0) => report.empty += 1,
                Ok(added) => {
                    tracing::info!("Successfully processed {} ({} chunks)", filename, added);
                    report.processed += 1;
                    report.chunks_added += added;
                }
                Err(e) => {
                    tracing::error!("Error processing {}: {}", filename, e);
                    report.failed += 1;
                }
            }
        }

        tracing::info!(
            "Ingestion finished: {} processed, {} skipped, {} empty, {} failed, {} chunks added",
            report.processed,
            report.skipped,
            report.empty,
            report.failed,
            report.chunks_added
        );

        Ok(report)
    }

    /// Parse, chunk and index a single PDF; returns the number of chunks added
    pub async fn process_pdf(&self, path: &Path) -> Result<usize> {
        let filename = file_name(path);
        let data = tokio::fs::read(path).await?;

        let name = filename.clone();
        let parse = tokio::task::spawn_blocking(move || PdfParser::parse(&name, &data));
        let pages = match tokio::time::timeout(self.parse_timeout, parse).await {
            Ok(joined) => joined
                .map_err(|e| Error::pdf_parse(&filename, format!("parser crashed: {}", e)))??,
            Err(_) => {
                return Err(Error::pdf_parse(
                    &filename,
                    format!("timed out after {}s", self.parse_timeout.as_secs()),
                ))
            }
        };

        let chunks = self.chunker.chunk_document(&filename, &pages);
        if chunks.is_empty() {
            tracing::warn!("No text extracted from {}", path.display());
            return Ok(0);
        }

        let added = self.store.add_documents(chunks).await?;
        tracing::info!("Added {} chunks from {}", added, filename);
        Ok(added)
    }

    /// `*.pdf` files in the folder (case-insensitive), sorted by name
    async fn list_pdfs(&self) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.pdfs_dir).await?;

        let mut entries = tokio::fs::read_dir(&self.pdfs_dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_pdf = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);

            if is_pdf && entry.file_type().await?.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::sample::build_pdf;
    use crate::test_support::{FailingEmbedder, HashEmbedder};
    use crate::providers::EmbeddingProvider;

    async fn setup(
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> (tempfile::TempDir, Arc<VectorStore>, PdfIngestor) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = RagConfig::default();
        config.storage.pdfs_dir = dir.path().join("pdfs");
        config.storage.data_dir = dir.path().join("data");

        let store = Arc::new(VectorStore::open(&config.storage, embedder).await.unwrap());
        let ingestor = PdfIngestor::new(&config, store.clone());
        (dir, store, ingestor)
    }

    fn write_pdf(dir: &Path, name: &str, lines: &[&str]) {
        std::fs::create_dir_all(dir).unwrap();
        let pdf = build_pdf(&[lines.iter().map(|l| l.to_string()).collect()]).unwrap();
        std::fs::write(dir.join(name), pdf).unwrap();
    }

    #[tokio::test]
    async fn test_missing_folder_is_created() {
        let (_dir, _store, ingestor) = setup(Arc::new(HashEmbedder::default())).await;
        let report = ingestor.process_pdfs_folder().await.unwrap();

        assert_eq!(report, IngestReport::default());
        assert!(ingestor.pdfs_dir().is_dir());
    }

    #[tokio::test]
    async fn test_ingest_and_skip_on_rerun() {
        let (_dir, store, ingestor) = setup(Arc::new(HashEmbedder::default())).await;
        let pdfs = ingestor.pdfs_dir().to_path_buf();

        write_pdf(&pdfs, "a.pdf", &["Knee surgery is covered."]);
        write_pdf(&pdfs, "B.PDF", &["Dental treatment is excluded."]);
        std::fs::write(pdfs.join("notes.txt"), "not a pdf").unwrap();
        std::fs::write(pdfs.join("broken.pdf"), "garbage").unwrap();

        let report = ingestor.process_pdfs_folder().await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.chunks_added, 2);
        assert_eq!(store.list_documents(), vec!["B.PDF", "a.pdf"]);

        let report = ingestor.process_pdfs_folder().await.unwrap();
        assert_eq!(report.processed, 0);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_embedding_failure_counts_as_failed() {
        let (_dir, store, ingestor) = setup(Arc::new(FailingEmbedder)).await;
        write_pdf(ingestor.pdfs_dir(), "a.pdf", &["Knee surgery is covered."]);

        let report = ingestor.process_pdfs_folder().await.unwrap();
        assert_eq!(report.failed, 1);
        assert!(!store.is_document_processed("a.pdf"));
    }

    #[tokio::test]
    async fn test_chunk_metadata() {
        let (_dir, store, ingestor) = setup(Arc::new(HashEmbedder::default())).await;
        write_pdf(ingestor.pdfs_dir(), "policy.pdf", &["Cataract surgery is covered."]);

        let added = ingestor
            .process_pdf(&ingestor.pdfs_dir().join("policy.pdf"))
            .await
            .unwrap();
        assert_eq!(added, 1);

        let results = store.search("cataract surgery", 1).await.unwrap();
        assert_eq!(results[0].chunk_id, "policy-p1-c0");
        assert_eq!(results[0].page, 1);
        assert_eq!(results[0].source, "policy.pdf");
    }
}
