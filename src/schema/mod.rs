//! Schema definition subsystem
//!
//! A schema declares the fields a document may carry, which of them are
//! required, their types, aliases, getters and validators, plus computed
//! virtual fields and an output transform.
//!
//! # Design Principles
//!
//! - Schemas are immutable once defined
//! - Malformed declarations fail at definition time, never at write time
//! - Getters, validators, virtuals and transforms are plain functions
//!   invoked by the transformer at fixed points

mod builtins;
mod definition;
mod errors;
mod loader;
mod types;

pub use builtins::{named_getter, template_virtual, TransformDecl, ValidatorDecl};
pub use definition::{Schema, SchemaBuilder};
pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::{load_schema_file, FieldDecl, SchemaDecl, SchemaLoader, VirtualDecl};
pub use types::{
    Compute, FieldSpec, FieldType, FieldValidator, Getter, SchemaOptions, Strictness, Transform,
    VirtualSpec,
};
