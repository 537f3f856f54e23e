//! Model errors

use thiserror::Error;

use crate::store::StoreError;
use crate::transform::{SelectionError, ValidationFailure};

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("unknown helper '{0}'")]
    UnknownHelper(String),

    #[error("field '{0}' is not declared by the schema")]
    UnknownField(String),

    #[error("field '{0}' does not hold references")]
    NotAReference(String),

    #[error("field '{field}' references collection '{collection}', which this model does not hold")]
    ForeignReference { field: String, collection: String },
}

impl ModelError {
    pub fn code(&self) -> &'static str {
        match self {
            ModelError::Validation(_) => "DOC_VALIDATION_FAILED",
            ModelError::Store(e) => e.code(),
            ModelError::Selection(_) => "DOC_INVALID_SELECTION",
            ModelError::UnknownHelper(_) => "DOC_UNKNOWN_HELPER",
            ModelError::UnknownField(_) => "DOC_UNKNOWN_FIELD",
            ModelError::NotAReference(_) | ModelError::ForeignReference { .. } => {
                "DOC_INVALID_POPULATE"
            }
        }
    }
}
