//! Field and virtual declarations
//!
//! Supported types:
//! - string: UTF-8 string
//! - number: integer or floating point
//! - boolean
//! - reference: identifier of another document
//! - array: homogeneous array with element type

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;

/// Read-side value rewrite applied to a stored field
pub type Getter = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Write-side predicate; `Err` carries the rejection reason
pub type FieldValidator = Arc<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Derives a virtual value from a stored record
pub type Compute = Arc<dyn Fn(&Document) -> Value + Send + Sync>;

/// Final read-side rewrite. Receives the stored record and the presented
/// output and returns the external representation.
pub type Transform = Arc<dyn Fn(&Document, Document) -> Document + Send + Sync>;

/// Declared field types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    /// Identifier of another document
    Reference,
    /// Homogeneous array (boxed to allow nesting)
    Array(Box<FieldType>),
}

impl FieldType {
    pub fn array_of(element: FieldType) -> Self {
        FieldType::Array(Box::new(element))
    }

    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Reference => "reference",
            FieldType::Array(_) => "array",
        }
    }

    /// True for `reference` and arrays of references.
    pub fn holds_references(&self) -> bool {
        match self {
            FieldType::Reference => true,
            FieldType::Array(inner) => inner.holds_references(),
            _ => false,
        }
    }
}

/// Declarative rule set for one document field.
#[derive(Clone)]
pub struct FieldSpec {
    pub name: String,
    /// Declared type. Alias fields may leave this unset and inherit the
    /// target's type.
    pub field_type: Option<FieldType>,
    pub required: bool,
    /// Enforced by the store, never by validation
    pub unique: bool,
    /// Whether the field appears in read results unless explicitly requested
    pub select_by_default: bool,
    /// Canonical field this one mirrors
    pub alias: Option<String>,
    /// Used when the candidate omits the field
    pub default: Option<Value>,
    /// Collection a reference field points to
    pub reference: Option<String>,
    getter: Option<Getter>,
    validator: Option<FieldValidator>,
}

impl FieldSpec {
    /// Create an optional field of the given type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type: Some(field_type),
            required: false,
            unique: false,
            select_by_default: true,
            alias: None,
            default: None,
            reference: None,
            getter: None,
            validator: None,
        }
    }

    /// Create an alternative name for `target`.
    pub fn alias_of(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            field_type: None,
            alias: Some(target.into()),
            ..Self::new(name, FieldType::String)
        }
    }

    /// Field with no type; only useful to exercise definition errors.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            field_type: None,
            ..Self::new(name, FieldType::String)
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Exclude from read results unless explicitly included
    pub fn hidden(mut self) -> Self {
        self.select_by_default = false;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn references(mut self, collection: impl Into<String>) -> Self {
        self.reference = Some(collection.into());
        self
    }

    pub fn getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    pub fn validator<F>(mut self, validator: F) -> Self
    where
        F: Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub(crate) fn with_getter_arc(mut self, getter: Getter) -> Self {
        self.getter = Some(getter);
        self
    }

    pub(crate) fn with_validator_arc(mut self, validator: FieldValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn get_getter(&self) -> Option<&Getter> {
        self.getter.as_ref()
    }

    pub fn get_validator(&self) -> Option<&FieldValidator> {
        self.validator.as_ref()
    }

    pub fn is_alias(&self) -> bool {
        self.alias.is_some()
    }

    /// First rule set on this spec other than its name, alias and type.
    pub(crate) fn first_rule(&self) -> Option<&'static str> {
        [
            ("required", self.required),
            ("unique", self.unique),
            ("select", !self.select_by_default),
            ("default", self.default.is_some()),
            ("ref", self.reference.is_some()),
            ("getter", self.getter.is_some()),
            ("validator", self.validator.is_some()),
        ]
        .into_iter()
        .find_map(|(attribute, set)| set.then_some(attribute))
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("field_type", &self.field_type)
            .field("required", &self.required)
            .field("unique", &self.unique)
            .field("select_by_default", &self.select_by_default)
            .field("alias", &self.alias)
            .field("default", &self.default)
            .field("reference", &self.reference)
            .field("getter", &self.getter.is_some())
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// A computed, non-persisted field derived from stored data.
#[derive(Clone)]
pub struct VirtualSpec {
    pub name: String,
    compute: Compute,
}

impl VirtualSpec {
    pub fn new<F>(name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&Document) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            compute: Arc::new(compute),
        }
    }

    pub(crate) fn from_arc(name: impl Into<String>, compute: Compute) -> Self {
        Self {
            name: name.into(),
            compute,
        }
    }

    pub fn compute(&self, record: &Document) -> Value {
        (self.compute)(record)
    }
}

impl fmt::Debug for VirtualSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualSpec").field("name", &self.name).finish()
    }
}

/// What validation does with fields the schema does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Silently remove them
    #[default]
    Drop,
    /// Report each one as a violation
    Reject,
    /// Keep them unchanged
    Allow,
}

/// Schema-wide options
#[derive(Clone, Default)]
pub struct SchemaOptions {
    pub strict: Strictness,
    pub transform: Option<Transform>,
}

impl SchemaOptions {
    pub fn strict(mut self, strict: Strictness) -> Self {
        self.strict = strict;
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Document, Document) -> Document + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }
}

impl fmt::Debug for SchemaOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaOptions")
            .field("strict", &self.strict)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}
