//! Projects decoded JSON items into named, typed output records (spec
//! §4.5).

mod graphql;
mod rest;

pub use graphql::GraphqlExtractor;
pub use rest::RestExtractor;

use crate::config::ResponseMapping;
use crate::error::SiphonError;
use crate::value::project_one;
use serde_json::{Map, Value};

/// An extracted record: output field name to JSON value.
pub type Record = Map<String, Value>;

/// Selects the item sequence from a decoded response body and projects
/// each item into a [`Record`].
pub trait Extractor: Send + Sync {
    /// # Errors
    ///
    /// Returns [`SiphonError::Extraction`] when the configured root path
    /// is not found or not an array, or [`SiphonError::GraphQl`] when the
    /// response carries a top-level non-empty `errors` array.
    fn items(&self, body: &Value) -> Result<Vec<Value>, SiphonError>;
}

/// Project one item using the shared field-mapping rule: missing or null
/// at the configured path yields the default if any, otherwise the field
/// is omitted from the record.
///
/// # Errors
///
/// Returns [`SiphonError::Extraction`] if `item` is not a JSON object.
pub fn map_item(mapping: &ResponseMapping, item: &Value, index: usize) -> Result<Record, SiphonError> {
    if !item.is_object() && !item.is_null() {
        return Err(SiphonError::extraction(format!("item at index {index} is not a mapping")));
    }
    let mut record = Record::new();
    for field in &mapping.fields {
        if let Some(value) = project_one(item, &field.path, field.default_value.as_ref()) {
            record.insert(field.name.clone(), value);
        }
    }
    Ok(record)
}
