//! Query request types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Natural-language query against the ingested PDFs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question or claim description
    pub query: String,

    /// Number of chunks to retrieve (defaults to the configured top_k)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<usize>,
}

impl QueryRequest {
    /// Create a new query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            top_k: None,
        }
    }

    /// Set the number of results to retrieve
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = Some(k);
        self
    }
}

/// Facts the LLM pulls out of a query before retrieval
///
/// Every field is optional; a query that mentions none of them, or an LLM
/// reply that cannot be parsed, yields the default (all `None`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredQuery {
    pub age: Option<u32>,
    pub procedure: Option<String>,
    pub location: Option<String>,
    pub policy_duration: Option<String>,
    pub condition: Option<String>,
    pub amount_requested: Option<String>,
}

impl StructuredQuery {
    /// Build from a loosely typed JSON object
    ///
    /// Accepts numbers where strings are expected (and the reverse for `age`),
    /// and ignores unknown keys.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };

        let text = |key: &str| -> Option<String> {
            match map.get(key)? {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };

        let age = match map.get("age") {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .and_then(|a| u32::try_from(a).ok()),
            Some(Value::String(s)) => s
                .trim()
                .trim_end_matches(|c: char| !c.is_ascii_digit())
                .trim_start_matches(|c: char| !c.is_ascii_digit())
                .parse()
                .ok(),
            _ => None,
        };

        Self {
            age,
            procedure: text("procedure"),
            location: text("location"),
            policy_duration: text("policy_duration"),
            condition: text("condition"),
            amount_requested: text("amount_requested"),
        }
    }

    /// True when no field was extracted
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_top_k_optional() {
        let req: QueryRequest = serde_json::from_str(r#"{"query": "knee surgery"}"#).unwrap();
        assert_eq!(req.query, "knee surgery");
        assert!(req.top_k.is_none());

        let req = QueryRequest::new("x").with_top_k(3);
        assert_eq!(req.top_k, Some(3));
    }

    #[test]
    fn test_structured_from_value() {
        let value = json!({
            "age": 46,
            "procedure": "knee surgery",
            "location": "Pune",
            "policy_duration": "3 months",
            "condition": null,
            "amount_requested": 50000
        });
        let info = StructuredQuery::from_value(&value);
        assert_eq!(info.age, Some(46));
        assert_eq!(info.procedure.as_deref(), Some("knee surgery"));
        assert_eq!(info.location.as_deref(), Some("Pune"));
        assert_eq!(info.policy_duration.as_deref(), Some("3 months"));
        assert!(info.condition.is_none());
        assert_eq!(info.amount_requested.as_deref(), Some("50000"));
    }

    #[test]
    fn test_structured_age_as_string() {
        let info = StructuredQuery::from_value(&json!({"age": "46M"}));
        assert_eq!(info.age, Some(46));

        let info = StructuredQuery::from_value(&json!({"age": "unknown"}));
        assert_eq!(info.age, None);
    }

    #[test]
    fn test_structured_non_object() {
        assert!(StructuredQuery::from_value(&json!([1, 2])).is_empty());
        assert!(StructuredQuery::from_value(&json!({})).is_empty());
    }
}
