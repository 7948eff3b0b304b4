//! REST item selection (spec §4.5 "REST extractor").

use super::Extractor;
use crate::config::ResponseMapping;
use crate::error::SiphonError;
use crate::value::evaluate;
use serde_json::Value;

pub struct RestExtractor {
    mapping: ResponseMapping,
}

impl RestExtractor {
    #[must_use]
    pub fn new(mapping: ResponseMapping) -> Self {
        Self { mapping }
    }

    #[must_use]
    pub fn mapping(&self) -> &ResponseMapping {
        &self.mapping
    }
}

impl Extractor for RestExtractor {
    fn items(&self, body: &Value) -> Result<Vec<Value>, SiphonError> {
        if let Value::Array(items) = body {
            return Ok(items.clone());
        }
        if let Some(root_path) = &self.mapping.root_path {
            let (value, found) = evaluate(body, root_path);
            return match (found, value) {
                (true, Some(Value::Array(items))) => Ok(items),
                _ => Err(SiphonError::extraction(format!("root path '{root_path}' is not an array"))),
            };
        }
        for key in ["items", "data"] {
            if let Some(Value::Array(items)) = body.get(key) {
                return Ok(items.clone());
            }
        }
        Ok(vec![body.clone()])
    }
}
