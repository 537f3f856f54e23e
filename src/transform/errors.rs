//! Write-path violations
//!
//! Violations are collected, never thrown one at a time. `validate` returns
//! every violation it finds as one `ValidationFailure`.

use std::fmt;

use serde::Serialize;

/// One broken rule on one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldViolation {
    /// Required field absent or null
    MissingField { field: String },
    /// Canonical name and alias both present with different values
    ConflictingAlias { field: String, alias: String },
    /// Value could not be coerced, or a validator rejected it
    Invalid { field: String, reason: String },
    /// Field not declared by a schema with `strict: reject`
    UndeclaredField { field: String },
}

impl FieldViolation {
    pub fn missing(field: impl Into<String>) -> Self {
        FieldViolation::MissingField {
            field: field.into(),
        }
    }

    pub fn conflicting_alias(field: impl Into<String>, alias: impl Into<String>) -> Self {
        FieldViolation::ConflictingAlias {
            field: field.into(),
            alias: alias.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        FieldViolation::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn undeclared(field: impl Into<String>) -> Self {
        FieldViolation::UndeclaredField {
            field: field.into(),
        }
    }

    /// Canonical name of the offending field
    pub fn field(&self) -> &str {
        match self {
            FieldViolation::MissingField { field }
            | FieldViolation::ConflictingAlias { field, .. }
            | FieldViolation::Invalid { field, .. }
            | FieldViolation::UndeclaredField { field } => field,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            FieldViolation::MissingField { .. } => "DOC_MISSING_FIELD",
            FieldViolation::ConflictingAlias { .. } => "DOC_CONFLICTING_ALIAS",
            FieldViolation::Invalid { .. } => "DOC_VALIDATION_FAILED",
            FieldViolation::UndeclaredField { .. } => "DOC_UNDECLARED_FIELD",
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldViolation::MissingField { field } => {
                write!(f, "field '{}': required value is missing", field)
            }
            FieldViolation::ConflictingAlias { field, alias } => write!(
                f,
                "field '{}': alias '{}' carries a different value",
                field, alias
            ),
            FieldViolation::Invalid { field, reason } => write!(f, "field '{}': {}", field, reason),
            FieldViolation::UndeclaredField { field } => {
                write!(f, "field '{}': not declared by the schema", field)
            }
        }
    }
}

/// Every violation found while validating one candidate document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    schema: String,
    violations: Vec<FieldViolation>,
}

impl ValidationFailure {
    pub fn new(schema: impl Into<String>, violations: Vec<FieldViolation>) -> Self {
        Self {
            schema: schema.into(),
            violations,
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }

    /// Violations reported against `field`
    pub fn for_field<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a FieldViolation> {
        self.violations.iter().filter(move |v| v.field() == field)
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "document rejected by schema '{}' ({} violation(s))",
            self.schema,
            self.violations.len()
        )?;
        for violation in &self.violations {
            write!(f, "; {}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationFailure {}
