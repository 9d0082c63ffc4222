//! Query pipeline: extract facts, retrieve, decide

use std::sync::Arc;

use crate::error::Result;
use crate::generation::{parse_structured_query, DecisionParser, PromptBuilder};
use crate::providers::LlmProvider;
use crate::retrieval::VectorStore;
use crate::types::{QueryResponse, SearchResult, StructuredQuery};

/// Answers natural-language questions against the indexed PDFs
pub struct QueryHandler {
    store: Arc<VectorStore>,
    llm: Arc<dyn LlmProvider>,
    top_k: usize,
}

impl QueryHandler {
    pub fn new(store: Arc<VectorStore>, llm: Arc<dyn LlmProvider>, top_k: usize) -> Self {
        Self { store, llm, top_k }
    }

    /// Run the full RAG pipeline
    ///
    /// Never fails: retrieval errors become an `Uncertain` response and LLM
    /// failures fall back to a keyword heuristic.
    pub async fn process_query(&self, query: &str, top_k: Option<usize>) -> QueryResponse {
        tracing::info!("Starting query processing for: {}", query);

        match self.answer(query, top_k.unwrap_or(self.top_k)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Error processing query: {}", e);
                QueryResponse::processing_error(e)
            }
        }
    }

    async fn answer(&self, query: &str, top_k: usize) -> Result<QueryResponse> {
        let structured = self.parse_query(query).await;
        tracing::debug!("Structured info extracted: {:?}", structured);

        let results = self.store.search(query, top_k).await?;
        tracing::info!("Found {} relevant chunks", results.len());

        if results.is_empty() {
            tracing::warn!("No search results found");
            return Ok(QueryResponse::no_relevant_documents());
        }

        for (i, result) in results.iter().take(2).enumerate() {
            tracing::debug!(
                "Search result {}: {} (similarity: {:.3})",
                i + 1,
                result.source,
                result.similarity
            );
        }

        let response = self.make_decision(query, &structured, &results).await;
        tracing::info!("Decision result: {}", response.decision);
        Ok(response)
    }

    async fn parse_query(&self, query: &str) -> StructuredQuery {
        let prompt = PromptBuilder::query_parsing_prompt(query);

        match self.llm.generate(&prompt).await {
            Ok(reply) => parse_structured_query(&reply),
            Err(e) => {
                tracing::warn!("Query parsing with {} failed: {}", self.llm.model(), e);
                StructuredQuery::default()
            }
        }
    }

    async fn make_decision(
        &self,
        query: &str,
        structured: &StructuredQuery,
        results: &[SearchResult],
    ) -> QueryResponse {
        let context = PromptBuilder::build_context(results);
        let prompt = PromptBuilder::decision_prompt(query, structured, &context);

        let parsed = match self.llm.generate(&prompt).await {
            Ok(reply) => DecisionParser::parse(&reply, results).map_err(|e| {
                tracing::debug!("Raw decision response: {}", reply);
                e
            }),
            Err(e) => Err(e),
        };

        parsed.unwrap_or_else(|e| {
            tracing::error!("Error making decision, using keyword fallback: {}", e);
            DecisionParser::fallback(results)
        })
    }
}
