//! Deterministic providers for unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, EmbeddingTask, LlmProvider};

const DIMS: usize = 64;

/// Bag-of-words embedder: texts sharing words get similar vectors
#[derive(Default)]
pub struct HashEmbedder {
    pub calls: AtomicUsize,
}

impl HashEmbedder {
    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIMS];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.len() > 2)
        {
            let bucket = word
                .bytes()
                .fold(2166136261u32, |h, b| (h ^ b as u32).wrapping_mul(16777619));
            v[bucket as usize % DIMS] += 1.0;
        }
        v
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str, _task: EmbeddingTask) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::vector(text))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Embedder that always fails
pub struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str, _task: EmbeddingTask) -> Result<Vec<f32>> {
        Err(Error::embedding("quota exceeded"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// LLM with canned answers for the query-parsing and decision prompts
#[derive(Default)]
pub struct ScriptedLlm {
    pub parse_reply: Option<String>,
    pub decision_reply: Option<String>,
    pub calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new(parse_reply: Option<&str>, decision_reply: Option<&str>) -> Self {
        Self {
            parse_reply: parse_reply.map(str::to_string),
            decision_reply: decision_reply.map(str::to_string),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = if prompt.contains("Analyze and return JSON decision") {
            &self.decision_reply
        } else {
            &self.parse_reply
        };
        reply.clone().ok_or_else(|| Error::llm("model unavailable"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }
}
