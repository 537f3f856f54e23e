//! Store errors

use std::io;

use serde_json::Value;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: field '{field}' already holds {value}")]
    DuplicateKey { field: String, value: Value },

    #[error("invalid _id {0}: expected a string or number")]
    InvalidId(Value),

    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("malformed data file '{path}': {reason}")]
    MalformedData { path: String, reason: String },
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::DuplicateKey { .. } => "DOC_STORE_DUPLICATE_KEY",
            StoreError::InvalidId(_) => "DOC_STORE_INVALID_ID",
            StoreError::Io { .. } => "DOC_STORE_IO",
            StoreError::MalformedData { .. } => "DOC_STORE_MALFORMED_DATA",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duplicate_key_display() {
        let err = StoreError::DuplicateKey {
            field: "email".into(),
            value: json!("alice@example.com"),
        };
        assert!(err.to_string().contains("alice@example.com"));
        assert_eq!(err.code(), "DOC_STORE_DUPLICATE_KEY");
    }
}
