//! Document transformer
//!
//! Two pure entry points:
//! - `validate`: write path, candidate to persistable document
//! - `present`: read path, stored record to external representation
//!
//! Neither performs I/O or keeps state; both may be called concurrently.

mod coerce;
mod errors;
mod present;
mod validate;

pub use coerce::{coerce, json_type_name};
pub use errors::{FieldViolation, ValidationFailure};
pub use present::{present, PresentOptions, SelectionError};
pub use validate::{validate, ValidationResult};
