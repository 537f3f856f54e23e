//! Write path: candidate document to persistable document
//!
//! For each canonical field, in declaration order:
//! 1. Resolve the value from the canonical name or any alias
//! 2. Fall back to the declared default when absent
//! 3. Report a missing required value
//! 4. Coerce to the declared type
//! 5. Run the field validator on the coerced value
//!
//! Undeclared fields are then handled per the schema's strictness. All
//! violations are collected before returning. The candidate is never
//! mutated.

use serde_json::Value;

use super::coerce::coerce;
use super::errors::{FieldViolation, ValidationFailure};
use crate::document::{is_reserved, values_equal, Document};
use crate::schema::{FieldSpec, Schema, Strictness};

/// Result of the write path
pub type ValidationResult = Result<Document, ValidationFailure>;

/// Validates `candidate` against `schema`.
///
/// On success returns a new document holding coerced values under canonical
/// names only. On failure returns every violation found.
pub fn validate(schema: &Schema, candidate: &Document) -> ValidationResult {
    let mut violations = Vec::new();
    let mut output = Document::new();

    for field in schema.fields() {
        let resolved = match resolve(schema, field, candidate) {
            Ok(resolved) => resolved,
            Err(violation) => {
                violations.push(violation);
                continue;
            }
        };

        let value = match resolved.or(field.default.as_ref()) {
            Some(value) => value,
            None => {
                if field.required {
                    violations.push(FieldViolation::missing(&field.name));
                }
                continue;
            }
        };

        let value = match &field.field_type {
            Some(field_type) => match coerce(value, field_type) {
                Ok(coerced) => coerced,
                Err(reason) => {
                    violations.push(FieldViolation::invalid(&field.name, reason));
                    continue;
                }
            },
            None => value.clone(),
        };

        if let Some(validator) = field.get_validator() {
            if let Err(reason) = validator(&value) {
                violations.push(FieldViolation::invalid(&field.name, reason));
                continue;
            }
        }

        output.insert(field.name.clone(), value);
    }

    for (key, value) in candidate.iter() {
        if schema.is_declared(key) {
            continue;
        }
        if is_reserved(key) {
            output.insert(key.clone(), value.clone());
            continue;
        }
        match schema.strictness() {
            Strictness::Drop => {}
            Strictness::Reject => violations.push(FieldViolation::undeclared(key)),
            Strictness::Allow => {
                output.insert(key.clone(), value.clone());
            }
        }
    }

    if violations.is_empty() {
        Ok(output)
    } else {
        Err(ValidationFailure::new(schema.name(), violations))
    }
}

/// Resolves a field's value from its canonical name or any alias.
///
/// Null counts as absent. Several names carrying values that cast to the
/// same stored value are accepted; differing values are a conflict.
fn resolve<'a>(
    schema: &Schema,
    field: &FieldSpec,
    candidate: &'a Document,
) -> Result<Option<&'a Value>, FieldViolation> {
    let mut resolved = candidate.get_present(&field.name);

    for alias in schema.aliases_of(&field.name) {
        let Some(value) = candidate.get_present(alias) else {
            continue;
        };
        match resolved {
            Some(existing) if !same_value(field, existing, value) => {
                return Err(FieldViolation::conflicting_alias(&field.name, alias));
            }
            Some(_) => {}
            None => resolved = Some(value),
        }
    }

    Ok(resolved)
}

/// Compares two candidate values as they would be stored.
fn same_value(field: &FieldSpec, a: &Value, b: &Value) -> bool {
    let cast = |value: &Value| match &field.field_type {
        Some(field_type) => coerce(value, field_type).unwrap_or_else(|_| value.clone()),
        None => value.clone(),
    };
    values_equal(&cast(a), &cast(b))
}
