//! Application state for the RAG server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::Result;
use crate::ingestion::PdfIngestor;
use crate::providers::{EmbeddingProvider, GeminiClient, LlmProvider};
use crate::query::QueryHandler;
use crate::retrieval::VectorStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: RagConfig,
    /// Persisted chunk embeddings
    store: Arc<VectorStore>,
    ingestor: PdfIngestor,
    query_handler: QueryHandler,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmProvider>,
    /// Set once the startup ingestion pass has finished
    ready: RwLock<bool>,
}

impl AppState {
    /// Create application state backed by Gemini
    pub async fn new(config: RagConfig) -> Result<Self> {
        let gemini = Arc::new(GeminiClient::new(&config.gemini)?);
        tracing::info!(
            "Gemini client initialized (embeddings: {}, llm: {})",
            config.gemini.embedding_model,
            config.gemini.llm_model
        );

        Self::with_providers(config, gemini.clone(), gemini).await
    }

    /// Create application state with explicit providers
    pub async fn with_providers(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        let store = Arc::new(VectorStore::open(&config.storage, embedder.clone()).await?);
        let ingestor = PdfIngestor::new(&config, store.clone());
        let query_handler = QueryHandler::new(store.clone(), llm.clone(), config.retrieval.top_k);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                ingestor,
                query_handler,
                embedder,
                llm,
                ready: RwLock::new(false),
            }),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<VectorStore> {
        &self.inner.store
    }

    pub fn ingestor(&self) -> &PdfIngestor {
        &self.inner.ingestor
    }

    pub fn query_handler(&self) -> &QueryHandler {
        &self.inner.query_handler
    }

    /// Check if the service is ready
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    /// Set ready state
    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Probe both providers; failures are logged, not fatal
    pub async fn check_providers(&self) -> bool {
        let embedder_ok = matches!(self.inner.embedder.health_check().await, Ok(true));
        let llm_ok = matches!(self.inner.llm.health_check().await, Ok(true));

        if !embedder_ok {
            tracing::warn!(
                "Embedding provider '{}' is not reachable",
                self.inner.embedder.name()
            );
        }
        if !llm_ok {
            tracing::warn!(
                "LLM provider '{}' ({}) is not reachable",
                self.inner.llm.name(),
                self.inner.llm.model()
            );
        }

        embedder_ok && llm_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingEmbedder, HashEmbedder, ScriptedLlm};

    fn config(dir: &std::path::Path) -> RagConfig {
        let mut config = RagConfig::default();
        config.storage.pdfs_dir = dir.join("pdfs");
        config.storage.data_dir = dir.join("data");
        config
    }

    #[test]
    fn test_ready_flag() {
        let dir = tempfile::tempdir().unwrap();
        let state = tokio_test::block_on(AppState::with_providers(
            config(dir.path()),
            Arc::new(HashEmbedder::default()),
            Arc::new(ScriptedLlm::default()),
        ))
        .unwrap();

        assert!(!state.is_ready());
        state.set_ready(true);
        assert!(state.clone().is_ready());
    }

    #[tokio::test]
    async fn test_check_providers() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState::with_providers(
            config(dir.path()),
            Arc::new(FailingEmbedder),
            Arc::new(ScriptedLlm::default()),
        )
        .await
        .unwrap();

        assert!(!state.check_providers().await);
    }

    #[tokio::test]
    async fn test_new_requires_api_key() {
        let dir = tempfile::tempdir().unwrap();
        assert!(AppState::new(config(dir.path())).await.is_err());
    }
}
