//! Response types for the HTTP API

use serde::{Deserialize, Serialize};
use std::fmt;

use super::chunk::SearchResult;

/// Verdict returned for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approved,
    Rejected,
    Uncertain,
    /// Nothing relevant was retrieved
    Unknown,
}

impl Decision {
    /// Lenient parse of an LLM-provided decision; anything unrecognised is `Uncertain`
    pub fn from_llm(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "approved" | "approve" => Self::Approved,
            "rejected" | "reject" | "denied" => Self::Rejected,
            "unknown" => Self::Unknown,
            _ => Self::Uncertain,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Uncertain => "Uncertain",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cited piece of evidence (or a follow-up question in `alternatives`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JustificationItem {
    /// Location inside the source, e.g. "Page 5, Section 2.1"
    pub clause: String,
    /// Quoted supporting text
    pub text: String,
    /// Source file name
    pub source: String,
}

impl JustificationItem {
    pub fn new(
        clause: impl Into<String>,
        text: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            clause: clause.into(),
            text: text.into(),
            source: source.into(),
        }
    }

    /// Placeholder item used when there is nothing to cite
    pub fn not_applicable(text: impl Into<String>) -> Self {
        Self::new("N/A", text, "N/A")
    }

    /// Cite the start of a retrieved chunk
    pub fn from_result(result: &SearchResult) -> Self {
        Self::new(
            format!("Page {}", result.page),
            format!("{}...", excerpt(&result.content, 200)),
            result.source.clone(),
        )
    }
}

/// First `max_chars` characters of `text`
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Structured answer to a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub decision: Decision,
    /// Payout amount when one is stated, e.g. "₹50,000"
    pub amount: Option<String>,
    pub justification: Vec<JustificationItem>,
    /// Other relevant facts, limits or exclusions
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<JustificationItem>,
    /// Follow-up questions or missing data
    #[serde(default)]
    pub alternatives: Vec<JustificationItem>,
}

impl QueryResponse {
    /// Response with a single justification and nothing else
    pub fn simple(decision: Decision, justification: JustificationItem) -> Self {
        Self {
            decision,
            amount: None,
            justification: vec![justification],
            details: Vec::new(),
            alternatives: Vec::new(),
        }
    }

    /// Nothing relevant was retrieved
    pub fn no_relevant_documents() -> Self {
        Self::simple(
            Decision::Unknown,
            JustificationItem::not_applicable("No relevant clause found in provided documents."),
        )
    }

    /// Query processing failed
    pub fn processing_error(error: impl fmt::Display) -> Self {
        Self::simple(
            Decision::Uncertain,
            JustificationItem::not_applicable(format!("Error processing query: {}", error)),
        )
    }
}

/// GET /status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    pub documents_count: usize,
    pub chunks_count: usize,
}

/// GET /documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<String>,
}

/// Plain `{"message": ...}` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
