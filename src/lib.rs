//! docshape - schema-first document validation and presentation
//!
//! A schema declares the shape of a document. Two pure functions sit on
//! either side of storage:
//!
//! - `transform::validate`: candidate document → persistable document, or
//!   every rule it violates
//! - `transform::present`: stored record → external representation, with
//!   getters, virtuals, selection and the output transform applied
//!
//! `store` and `model` bind a schema to a document store; `cli` exposes
//! everything over JSON lines.

pub mod cli;
pub mod document;
pub mod model;
pub mod observability;
pub mod schema;
pub mod store;
pub mod transform;

pub use document::Document;
