//! Gemini client for embeddings and answer generation
//!
//! Talks to the Generative Language REST API with an API key sent in the
//! `x-goog-api-key` header. Every request goes through the same
//! exponential-backoff retry loop.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::GeminiConfig;
use crate::error::{Error, Result};

use super::embedding::{EmbeddingProvider, EmbeddingTask};
use super::llm::LlmProvider;

/// batchEmbedContents accepts at most this many requests per call
const MAX_BATCH: usize = 100;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini API client with automatic retry
pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
    api_key: String,
    /// Embedding model, always `models/...`
    embedding_model: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    /// Create a new Gemini client with retry support
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("GEMINI_API_KEY is not set".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()?;

        Ok(Self {
            client,
            embedding_model: model_path(&config.embedding_model),
            api_key,
            config: config.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1beta/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if attempt < self.config.max_retries {
                        let delay = Duration::from_millis(
                            self.config.retry_base_delay_ms.saturating_mul(1 << attempt.min(16)),
                        );
                        tracing::warn!(
                            "Gemini request failed (attempt {}/{}): {}; retrying in {:?}",
                            attempt + 1,
                            self.config.max_retries + 1,
                            e,
                            delay
                        );
                        sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::llm("Unknown error")))
    }

    async fn post_json<B, R>(&self, url: &str, body: &B) -> std::result::Result<R, String>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("HTTP {} - {}", status, body));
        }

        response
            .json()
            .await
            .map_err(|e| format!("failed to parse response: {}", e.without_url()))
    }

    fn embed_request<'a>(&'a self, text: &'a str, task: EmbeddingTask) -> EmbedRequest<'a> {
        EmbedRequest {
            model: &self.embedding_model,
            content: Content {
                role: None,
                parts: vec![Part { text }],
            },
            task_type: task.as_gemini_str(),
        }
    }

    async fn embed_once(&self, url: &str, text: &str, task: EmbeddingTask) -> Result<Vec<f32>> {
        let response: EmbedResponse = self
            .post_json(url, &self.embed_request(text, task))
            .await
            .map_err(|e| Error::embedding(format!("Embedding {}", e)))?;

        if response.embedding.values.is_empty() {
            return Err(Error::embedding("Gemini returned an empty embedding"));
        }

        Ok(response.embedding.values)
    }

    async fn embed_batch_once(
        &self,
        url: &str,
        texts: &[String],
        task: EmbeddingTask,
    ) -> Result<Vec<Vec<f32>>> {
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| self.embed_request(text, task))
                .collect(),
        };

        let response: BatchEmbedResponse = self
            .post_json(url, &request)
            .await
            .map_err(|e| Error::embedding(format!("Batch embedding {}", e)))?;

        if response.embeddings.len() != texts.len()
            || response.embeddings.iter().any(|e| e.values.is_empty())
        {
            return Err(Error::embedding(format!(
                "Gemini returned {} embeddings for {} texts",
                response.embeddings.len(),
                texts.len()
            )));
        }

        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    async fn generate_once(&self, url: &str, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
            },
        };

        let response: GenerateResponse = self
            .post_json(url, &request)
            .await
            .map_err(|e| Error::llm(format!("Generation {}", e)))?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(Error::llm("No text in Gemini response"));
        }

        Ok(text)
    }
}

/// Gemini embedding endpoints address models as `models/{name}`
fn model_path(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{}", model)
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str, task: EmbeddingTask) -> Result<Vec<f32>> {
        let url = self.url(&format!("{}:embedContent", self.embedding_model));
        self.retry_request(|| self.embed_once(&url, text, task)).await
    }

    async fn embed_batch(&self, texts: &[String], task: EmbeddingTask) -> Result<Vec<Vec<f32>>> {
        let url = self.url(&format!("{}:batchEmbedContents", self.embedding_model));
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(MAX_BATCH) {
            let values = self
                .retry_request(|| self.embed_batch_once(&url, batch, task))
                .await?;
            embeddings.extend(values);
        }

        Ok(embeddings)
    }

    async fn health_check(&self) -> Result<bool> {
        check_model(self, &self.embedding_model).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.url(&format!("{}:generateContent", model_path(&self.config.llm_model)));

        tracing::debug!("Generating with model: {}", self.config.llm_model);

        self.retry_request(|| self.generate_once(&url, prompt)).await
    }

    async fn health_check(&self) -> Result<bool> {
        check_model(self, &model_path(&self.config.llm_model)).await
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.config.llm_model
    }
}

async fn check_model(client: &GeminiClient, model: &str) -> Result<bool> {
    let url = client.url(model);

    match client
        .client
        .get(&url)
        .header(API_KEY_HEADER, &client.api_key)
        .send()
        .await
    {
        Ok(response) => Ok(response.status().is_success()),
        Err(_) => Ok(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn test_config(base_url: String) -> GeminiConfig {
        GeminiConfig {
            api_key: Some("AItest".to_string()),
            base_url,
            max_retries: 0,
            retry_base_delay_ms: 1,
            ..GeminiConfig::default()
        }
    }

    #[test]
    fn test_model_path() {
        assert_eq!(model_path("embedding-001"), "models/embedding-001");
        assert_eq!(model_path("models/embedding-001"), "models/embedding-001");
    }

    #[test]
    fn test_requires_api_key() {
        let config = GeminiConfig::default();
        assert!(matches!(GeminiClient::new(&config), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_embed() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/embedding-001:embedContent")
                    .header("x-goog-api-key", "AItest")
                    .body_contains("RETRIEVAL_QUERY");
                then.status(200)
                    .json_body(json!({"embedding": {"values": [0.1, 0.2, 0.3]}}));
            })
            .await;

        let client = GeminiClient::new(&test_config(server.base_url())).unwrap();
        let embedding = client
            .embed("knee surgery", EmbeddingTask::RetrievalQuery)
            .await
            .unwrap();

        assert_eq!(embedding, vec![0.1, 0.2, 0.3]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_embed_batch() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/embedding-001:batchEmbedContents")
                    .body_contains("RETRIEVAL_DOCUMENT");
                then.status(200).json_body(json!({
                    "embeddings": [{"values": [1.0, 0.0]}, {"values": [0.0, 1.0]}]
                }));
            })
            .await;

        let client = GeminiClient::new(&test_config(server.base_url())).unwrap();
        let texts = vec!["first".to_string(), "second".to_string()];
        let embeddings = client
            .embed_batch(&texts, EmbeddingTask::RetrievalDocument)
            .await
            .unwrap();

        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-1.5-flash:generateContent")
                    .header("x-goog-api-key", "AItest");
                then.status(200).json_body(json!({
                    "candidates": [{
                        "content": {"role": "model", "parts": [{"text": "{\"decision\": "}, {"text": "\"Approved\"}"}]}
                    }]
                }));
            })
            .await;

        let client = GeminiClient::new(&test_config(server.base_url())).unwrap();
        let text = client.generate("prompt").await.unwrap();

        assert_eq!(text, "{\"decision\": \"Approved\"}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_retries_then_fails() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-1.5-flash:generateContent");
                then.status(500).body("boom");
            })
            .await;

        let mut config = test_config(server.base_url());
        config.max_retries = 2;
        let client = GeminiClient::new(&config).unwrap();

        let err = client.generate("prompt").await.unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
        mock.assert_hits_async(3).await;
    }

    #[tokio::test]
    async fn test_empty_candidates_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/gemini-1.5-flash:generateContent");
                then.status(200).json_body(json!({"candidates": []}));
            })
            .await;

        let client = GeminiClient::new(&test_config(server.base_url())).unwrap();
        assert!(client.generate("prompt").await.is_err());
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1beta/models/gemini-1.5-flash");
                then.status(200).json_body(json!({"name": "models/gemini-1.5-flash"}));
            })
            .await;

        let client = GeminiClient::new(&test_config(server.base_url())).unwrap();
        assert!(LlmProvider::health_check(&client).await.unwrap());
        // No mock for the embedding model: the server answers 404
        assert!(!EmbeddingProvider::health_check(&client).await.unwrap());
    }

    #[tokio::test]
    async fn test_embed_batch_splits_into_requests_of_100() {
        let server = MockServer::start_async().await;
        let embeddings_body = |range: std::ops::Range<u32>| {
            let values: Vec<_> = range.map(|i| json!({"values": [i as f32, 1.0]})).collect();
            json!({ "embeddings": values })
        };
        let first = embeddings_body(0..100);
        let second = embeddings_body(100..150);

        let first_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/embedding-001:batchEmbedContents")
                    .body_contains("chunk-000");
                then.status(200).json_body(first.clone());
            })
            .await;
        let second_mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1beta/models/embedding-001:batchEmbedContents")
                    .body_contains("chunk-100");
                then.status(200).json_body(second.clone());
            })
            .await;

        let client = GeminiClient::new(&test_config(server.base_url())).unwrap();
        let texts: Vec<String> = (0..150).map(|i| format!("chunk-{:03}", i)).collect();
        let embeddings = client
            .embed_batch(&texts, EmbeddingTask::RetrievalDocument)
            .await
            .unwrap();

        first_mock.assert_hits_async(1).await;
        second_mock.assert_hits_async(1).await;
        assert_eq!(embeddings.len(), 150);
        for (i, embedding) in embeddings.iter().enumerate() {
            assert_eq!(embedding[0], i as f32);
        }
    }

    #[tokio::test]
    async fn test_api_key_not_in_errors() {
        let mut config = test_config("http://127.0.0.1:1".to_string());
        config.api_key = Some("AIzaSUPERSECRET".to_string());
        config.timeout_secs = 2;
        let client = GeminiClient::new(&config).unwrap();

        let embed_err = client
            .embed("knee surgery", EmbeddingTask::RetrievalQuery)
            .await
            .unwrap_err();
        let batch_err = client
            .embed_batch(&["a".to_string()], EmbeddingTask::RetrievalDocument)
            .await
            .unwrap_err();
        let generate_err = client.generate("prompt").await.unwrap_err();

        for err in [embed_err, batch_err, generate_err] {
            let message = err.to_string();
            assert!(message.contains("request failed"), "{}", message);
            assert!(!message.contains("SUPERSECRET"), "{}", message);

            let body = serde_json::to_string(&crate::types::QueryResponse::processing_error(&err))
                .unwrap();
            assert!(!body.contains("SUPERSECRET"));
        }
    }
}
