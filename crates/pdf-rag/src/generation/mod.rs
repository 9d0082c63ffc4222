//! Prompt construction and decision parsing

pub mod decision;
pub mod prompt;

pub use decision::{extract_json, parse_structured_query, DecisionParser};
pub use prompt::PromptBuilder;
