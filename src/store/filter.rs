//! Equality filtering of stored records
//!
//! A filter is a document of expected values. Every entry must match:
//! - scalar fields match by equality; numbers compare by value, so `20`
//!   matches `20.0`
//! - array fields match when they equal or contain the expected value
//! - a missing field never matches
//! - an empty filter matches every record

use serde_json::Value;

use crate::document::{values_equal, Document};

/// Evaluates equality filters against records
pub struct RecordFilter;

impl RecordFilter {
    /// Checks if a record matches all filter entries
    pub fn matches(record: &Document, filter: &Document) -> bool {
        filter
            .iter()
            .all(|(field, expected)| Self::matches_field(record.get(field), expected))
    }

    fn matches_field(actual: Option<&Value>, expected: &Value) -> bool {
        match actual {
            None => false,
            Some(actual) if values_equal(actual, expected) => true,
            Some(Value::Array(items)) => items.iter().any(|item| values_equal(item, expected)),
            Some(_) => false,
        }
    }
}
