//! Prompt templates for query parsing and claim decisions

use crate::types::{SearchResult, StructuredQuery};

/// Prompt builder for the two LLM calls made per query
pub struct PromptBuilder;

impl PromptBuilder {
    /// Ask the model to pull structured facts out of a free-text query
    pub fn query_parsing_prompt(query: &str) -> String {
        format!(
            r#"Extract structured information from the user's query about insurance.
Return ONLY a valid JSON object with these fields:
{{
    "age": number or null,
    "procedure": "string" or null,
    "location": "string" or null,
    "policy_duration": "string" or null,
    "condition": "string" or null,
    "amount_requested": "string" or null
}}

Do not include any explanation, just the JSON.

Query: {query}

JSON:"#,
            query = query
        )
    }

    /// Render retrieved chunks as numbered context blocks
    pub fn build_context(results: &[SearchResult]) -> String {
        results
            .iter()
            .enumerate()
            .map(|(i, result)| {
                format!(
                    "Document {}:\nSource: {}\nPage: {}\nContent: {}\nSimilarity: {:.3}\n",
                    i + 1,
                    result.source,
                    result.page,
                    result.content,
                    result.similarity
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Full decision prompt: instructions, query, extracted facts and context
    pub fn decision_prompt(query: &str, structured: &StructuredQuery, context: &str) -> String {
        let extracted = serde_json::to_string(structured).unwrap_or_else(|_| "{}".to_string());

        format!(
            r#"You are an expert insurance claim processor. Analyze the query against all provided policy documents (PDFs) and extract every relevant piece of information you can find.

Rules:
1. Decision: must be one of "Approved", "Rejected", or "Uncertain".
2. Amount: if a payout amount is explicitly specified, extract it as "₹XX,XXX"; otherwise use "".
3. Justification: an array of citation objects, each with:
   - source: filename (e.g. "policy.pdf");
   - clause: location (e.g. "Page 5, Section 2.1");
   - text: the quoted supporting text (max ~200 characters).
4. Details: an array of any other relevant facts, definitions, limits, or exclusions you find, with the same citation object structure.
5. Alternatives: if the decision is "Uncertain", list follow-up questions or missing data as citation-style objects with empty "source" and "clause" and the question in "text". Otherwise use an empty array.
6. JSON only: return exactly one valid JSON object, no prose and no markdown.

When you do not find an exact answer in the documents, summarise what they say that pertains to the query.

Final JSON schema:
{{
  "decision": "Approved" | "Rejected" | "Uncertain",
  "amount": "₹XX,XXX" | "",
  "justification": [
    {{"source": "policy.pdf", "clause": "Page X, Section Y.Z", "text": "Quoted text supporting the decision."}}
  ],
  "details": [
    {{"source": "policy.pdf", "clause": "Page A, Section B.C", "text": "Additional relevant fact or exclusion."}}
  ],
  "alternatives": [
    {{"source": "", "clause": "", "text": "Is the insured's age below 60?"}}
  ]
}}

Query: {query}

Extracted Info: {extracted}

Policy Documents:
{context}

Analyze and return JSON decision:"#,
            query = query,
            extracted = extracted,
            context = context
        )
    }
}
