//! Models: a schema bound to a document store
//!
//! # Flow
//!
//! - write: candidate → `validate` → store
//! - read: store → `present` → optional population → caller
//!
//! Helpers registered on a model act as static methods and as query
//! helpers; `find_similar` is the instance method counterpart.

mod errors;
mod model;
mod query;

pub use errors::{ModelError, ModelResult};
pub use model::{FilterBuilder, Model};
pub use query::Query;
