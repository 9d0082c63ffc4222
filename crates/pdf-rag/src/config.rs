//! Configuration for the RAG service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main RAG service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Gemini (embeddings + generation) configuration
    pub gemini: GeminiConfig,
    /// Chunking configuration
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    pub retrieval: RetrievalConfig,
    /// Filesystem layout
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_cors: true,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Gemini API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (usually from GEMINI_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Generative Language API base URL
    pub base_url: String,
    /// Embedding model name
    pub embedding_model: String,
    /// Generation model name
    pub llm_model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry
    pub retry_base_delay_ms: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            embedding_model: "models/embedding-001".to_string(),
            llm_model: "gemini-1.5-flash".to_string(),
            temperature: 0.2,
            timeout_secs: 60,
            max_retries: 2,
            retry_base_delay_ms: 1000,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap carried into the next chunk, in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the LLM
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Filesystem layout for input PDFs and persisted vectors
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Folder scanned for PDFs
    pub pdfs_dir: PathBuf,
    /// Folder holding the persisted store
    pub data_dir: PathBuf,
    /// Embeddings file name (inside data_dir)
    pub embeddings_file: String,
    /// Chunk metadata file name (inside data_dir)
    pub documents_file: String,
    /// Upper bound for extracting text from a single PDF
    pub pdf_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            pdfs_dir: PathBuf::from("pdfs"),
            data_dir: PathBuf::from("."),
            embeddings_file: "embeddings.json".to_string(),
            documents_file: "documents.json".to_string(),
            pdf_timeout_secs: 120,
        }
    }
}

impl StorageConfig {
    pub fn embeddings_path(&self) -> PathBuf {
        self.data_dir.join(&self.embeddings_file)
    }

    pub fn documents_path(&self) -> PathBuf {
        self.data_dir.join(&self.documents_file)
    }
}

impl RagConfig {
    /// Load configuration: defaults, then an optional TOML file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        config.apply_env_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Apply overrides from an environment-like lookup
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.gemini.api_key = Some(key);
        }
        if let Some(url) = lookup("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.gemini.embedding_model = model;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.gemini.llm_model = model;
        }
        if let Some(dir) = lookup("PDFS_FOLDER") {
            self.storage.pdfs_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }

        set_parsed(&lookup, "CHUNK_SIZE", &mut self.chunking.chunk_size);
        set_parsed(&lookup, "CHUNK_OVERLAP", &mut self.chunking.chunk_overlap);
        set_parsed(&lookup, "TOP_K_RESULTS", &mut self.retrieval.top_k);
        set_parsed(&lookup, "PORT", &mut self.server.port);
    }

    /// Check the configuration before the service starts
    pub fn validate(&self) -> Result<()> {
        let api_key = self
            .gemini
            .api_key
            .as_deref()
            .map(str::trim)
            .unwrap_or_default();

        if api_key.is_empty() {
            return Err(Error::Config(
                "GEMINI_API_KEY environment variable is required. \
                 Please set it in your .env file or environment."
                    .to_string(),
            ));
        }

        if !api_key.starts_with("AI") {
            tracing::warn!(
                "Gemini API key should typically start with 'AI'. Please verify your API key is correct."
            );
        }

        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be greater than zero".to_string()));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(Error::Config("top_k must be greater than zero".to_string()));
        }

        tracing::info!("Configuration validated successfully");
        Ok(())
    }
}

fn set_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        match raw.trim().parse() {
            Ok(value) => *target = value,
            Err(_) => tracing::warn!("Ignoring {}={:?}: not a valid number", key, raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.gemini.embedding_model, "models/embedding-001");
        assert_eq!(config.gemini.llm_model, "gemini-1.5-flash");
        assert_eq!(config.storage.pdfs_dir, PathBuf::from("pdfs"));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RagConfig::default();
        config.apply_env_from(env(&[
            ("GEMINI_API_KEY", "AIzaTest"),
            ("CHUNK_SIZE", "500"),
            ("CHUNK_OVERLAP", "50"),
            ("TOP_K_RESULTS", "3"),
            ("LLM_MODEL", "gemini-1.5-pro"),
        ]));

        assert_eq!(config.gemini.api_key.as_deref(), Some("AIzaTest"));
        assert_eq!(config.chunking.chunk_size, 500);
        assert_eq!(config.chunking.chunk_overlap, 50);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.gemini.llm_model, "gemini-1.5-pro");
    }

    #[test]
    fn test_bad_number_is_ignored() {
        let mut config = RagConfig::default();
        config.apply_env_from(env(&[("CHUNK_SIZE", "lots")]));
        assert_eq!(config.chunking.chunk_size, 1000);
    }

    #[test]
    fn test_validate_requires_api_key() {
        let config = RagConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = RagConfig::default();
        config.gemini.api_key = Some("   ".to_string());
        assert!(config.validate().is_err());

        config.gemini.api_key = Some("AIzaSomething".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_chunking() {
        let mut config = RagConfig::default();
        config.gemini.api_key = Some("AIzaSomething".to_string());
        config.chunking.chunk_overlap = 1000;
        assert!(config.validate().is_err());

        config.chunking.chunk_overlap = 100;
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rag.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9000

[chunking]
chunk_size = 800
"#,
        )
        .unwrap();

        let config = RagConfig::from_toml_file(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 5);
    }
}
