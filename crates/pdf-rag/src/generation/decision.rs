//! Turning LLM replies into structured decisions

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::types::{Decision, JustificationItem, QueryResponse, SearchResult, StructuredQuery};

static RE_JSON_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)```json\s*").unwrap());
static RE_TRAILING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*$").unwrap());
static RE_RUPEE_AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"₹[\d,]+").unwrap());

const APPROVAL_WORDS: &[&str] = &["covered", "approved", "eligible"];
const CONDITION_WORDS: &[&str] = &["waiting", "period", "days"];
const REJECTION_WORDS: &[&str] = &["excluded", "not covered", "rejected"];

/// Parse the JSON object embedded in an LLM reply
///
/// Markdown fences are dropped and the outermost `{ ... }` span is used when
/// the reply has prose around it.
pub fn extract_json(text: &str) -> Result<Value> {
    let text = RE_JSON_FENCE.replace_all(text.trim(), "");
    let text = RE_TRAILING_FENCE.replace(&text, "");

    let candidate = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text.trim(),
    };

    Ok(serde_json::from_str(candidate)?)
}

/// Structured facts from the query-parsing reply; unparseable replies give the default
pub fn parse_structured_query(text: &str) -> StructuredQuery {
    match extract_json(text) {
        Ok(value) => StructuredQuery::from_value(&value),
        Err(e) => {
            tracing::warn!("Failed to parse structured info as JSON: {}", e);
            tracing::debug!("Raw response: {}", text);
            StructuredQuery::default()
        }
    }
}

/// Normalises decision replies and builds heuristic answers when the LLM fails
pub struct DecisionParser;

impl DecisionParser {
    /// Build a response from the decision reply, filling gaps from the retrieved chunks
    pub fn parse(text: &str, results: &[SearchResult]) -> Result<QueryResponse> {
        let value = extract_json(text)?;
        let obj = value
            .as_object()
            .ok_or_else(|| Error::llm("Decision reply is not a JSON object"))?;

        let decision = obj
            .get("decision")
            .and_then(Value::as_str)
            .map(Decision::from_llm)
            .unwrap_or(Decision::Uncertain);

        let amount = match obj.get("amount") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };

        let justification = match obj.get("justification") {
            Some(Value::Array(items)) => items.iter().filter_map(item_from_value).collect(),
            _ => vec![match results.first() {
                Some(best) => JustificationItem::from_result(best),
                None => JustificationItem::not_applicable("No relevant information found"),
            }],
        };

        Ok(QueryResponse {
            decision,
            amount,
            justification,
            details: items_at(obj, "details"),
            alternatives: items_at(obj, "alternatives"),
        })
    }

    /// Keyword heuristic over the best-ranked chunk
    pub fn fallback(results: &[SearchResult]) -> QueryResponse {
        let Some(best) = results.first() else {
            return QueryResponse::simple(
                Decision::Uncertain,
                JustificationItem::not_applicable("Unable to process the policy documents properly."),
            );
        };

        let content = best.content.to_lowercase();
        let mentions = |words: &[&str]| words.iter().any(|w| content.contains(w));

        let decision = if mentions(APPROVAL_WORDS) {
            if mentions(CONDITION_WORDS) {
                Decision::Uncertain
            } else {
                Decision::Approved
            }
        } else if mentions(REJECTION_WORDS) {
            Decision::Rejected
        } else {
            Decision::Uncertain
        };

        QueryResponse {
            decision,
            amount: RE_RUPEE_AMOUNT
                .find(&best.content)
                .map(|m| m.as_str().to_string()),
            justification: vec![JustificationItem::from_result(best)],
            details: Vec::new(),
            alternatives: Vec::new(),
        }
    }
}

fn items_at(obj: &Map<String, Value>, key: &str) -> Vec<JustificationItem> {
    match obj.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(item_from_value).collect(),
        _ => Vec::new(),
    }
}

/// Citation object from JSON; bare strings become the item text
fn item_from_value(value: &Value) -> Option<JustificationItem> {
    match value {
        Value::Object(map) => {
            let field = |key: &str| match map.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Number(n)) => n.to_string(),
                _ => String::new(),
            };
            Some(JustificationItem::new(field("clause"), field("text"), field("source")))
        }
        Value::String(s) => Some(JustificationItem::new("", s.clone(), "")),
        _ => None,
    }
}
