//! Read path: stored record to external representation
//!
//! Steps, in order:
//! 1. Select stored fields (hidden fields only when included)
//! 2. Apply getters
//! 3. Compute virtuals from the stored record
//! 4. Apply the schema transform
//!
//! The stored record is never mutated; every call builds a fresh document.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::document::{Document, ID_FIELD};
use crate::schema::Schema;

/// Rejected selection string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("invalid selection token '{0}'")]
    InvalidToken(String),

    #[error("selection mixes inclusion and exclusion: '{0}'")]
    MixedProjection(String),
}

/// Field selection for the read path.
///
/// - `include`: hidden fields to show anyway (`+field`)
/// - `exclude`: fields to drop (`-field`)
/// - `only`: when set, keep only these stored fields plus `_id` (`field`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresentOptions {
    include_fields: BTreeSet<String>,
    exclude_fields: BTreeSet<String>,
    only_fields: Option<BTreeSet<String>>,
}

impl PresentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.include_fields.insert(field.into());
        self
    }

    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.exclude_fields.insert(field.into());
        self
    }

    pub fn only(mut self, field: impl Into<String>) -> Self {
        self.only_fields
            .get_or_insert_with(BTreeSet::new)
            .insert(field.into());
        self
    }

    /// Parses a selection string such as `"+secret -email"`.
    ///
    /// Tokens are separated by whitespace or commas. A bare name selects
    /// only the listed fields and cannot be combined with `-field`, except
    /// for `-_id`.
    pub fn parse(selection: &str) -> Result<Self, SelectionError> {
        let mut options = Self::new();

        for token in selection
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
        {
            let (prefix, name) = match token.chars().next() {
                Some(p @ ('+' | '-')) => (Some(p), &token[1..]),
                _ => (None, token),
            };
            if name.is_empty() || name.starts_with(['+', '-']) {
                return Err(SelectionError::InvalidToken(token.to_string()));
            }
            options = match prefix {
                Some('+') => options.include(name),
                Some(_) => options.exclude(name),
                None => options.only(name),
            };
        }

        let excludes_non_id = options.exclude_fields.iter().any(|f| f != ID_FIELD);
        if options.only_fields.is_some() && excludes_non_id {
            return Err(SelectionError::MixedProjection(selection.to_string()));
        }

        Ok(options)
    }

    pub fn include_fields(&self) -> &BTreeSet<String> {
        &self.include_fields
    }

    pub fn exclude_fields(&self) -> &BTreeSet<String> {
        &self.exclude_fields
    }

    /// Whether `field` (a canonical stored name) is named by `set`, directly
    /// or through one of its aliases.
    fn names(schema: &Schema, set: &BTreeSet<String>, field: &str) -> bool {
        set.iter()
            .any(|name| schema.canonical_name(name).unwrap_or(name) == field)
    }

    fn selects(&self, schema: &Schema, field: &str) -> bool {
        if Self::names(schema, &self.exclude_fields, field) {
            return false;
        }
        if let Some(only) = &self.only_fields {
            return field == ID_FIELD || Self::names(schema, only, field);
        }
        match schema.field(field) {
            Some(spec) if !spec.select_by_default => {
                Self::names(schema, &self.include_fields, field)
            }
            _ => true,
        }
    }
}

/// Presents a stored record through `schema`.
pub fn present(schema: &Schema, record: &Document, options: &PresentOptions) -> Document {
    let mut output = Document::new();

    for (key, value) in record.iter() {
        if !options.selects(schema, key) {
            continue;
        }
        let value = match schema.field(key).and_then(|f| f.get_getter()) {
            Some(getter) if !value.is_null() => getter(value),
            _ => value.clone(),
        };
        output.insert(key.clone(), value);
    }

    for virtual_spec in schema.virtuals() {
        output.insert(virtual_spec.name.clone(), virtual_spec.compute(record));
    }

    match &schema.options().transform {
        Some(transform) => transform(record, output),
        None => output,
    }
}
