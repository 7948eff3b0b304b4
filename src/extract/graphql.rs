//! GraphQL item selection (spec §4.5 "GraphQL extractor").

use super::Extractor;
use crate::config::ResponseMapping;
use crate::error::SiphonError;
use crate::value::evaluate;
use serde_json::Value;

pub struct GraphqlExtractor {
    mapping: ResponseMapping,
}

impl GraphqlExtractor {
    #[must_use]
    pub fn new(mapping: ResponseMapping) -> Self {
        Self { mapping }
    }

    #[must_use]
    pub fn mapping(&self) -> &ResponseMapping {
        &self.mapping
    }
}

impl Extractor for GraphqlExtractor {
    fn items(&self, body: &Value) -> Result<Vec<Value>, SiphonError> {
        if let Some(message) = graphql_error_message(body) {
            return Err(SiphonError::graphql(message));
        }
        let Some(data) = body.get("data") else {
            return Err(SiphonError::extraction("graphql response missing top-level data"));
        };
        if let Some(root_path) = &self.mapping.root_path {
            let (value, found) = evaluate(data, root_path);
            return match (found, value) {
                (true, Some(Value::Array(items))) => Ok(items),
                (true, Some(mapping @ Value::Object(_))) => Ok(vec![mapping]),
                _ => Err(SiphonError::extraction(format!("root path '{root_path}' is not an array or mapping"))),
            };
        }
        match data {
            Value::Array(items) => Ok(items.clone()),
            Value::Object(_) => Ok(vec![data.clone()]),
            other => Err(SiphonError::extraction(format!("unexpected data shape: {other}"))),
        }
    }
}

/// Check for a top-level, non-empty `errors` array (spec §7 "graphql"
/// error kind). Shared by the extractor and the orchestrator so the body
/// is only decoded once.
#[must_use]
pub fn graphql_error_message(body: &Value) -> Option<String> {
    let errors = body.get("errors")?.as_array()?;
    if errors.is_empty() {
        return None;
    }
    let messages: Vec<String> = errors
        .iter()
        .map(|e| e.get("message").and_then(Value::as_str).unwrap_or("unknown graphql error").to_string())
        .collect();
    Some(messages.join("; "))
}
