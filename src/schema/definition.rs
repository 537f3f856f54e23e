//! Schema construction and lookup
//!
//! A `Schema` is immutable once defined. Definition checks:
//! - every field has a name, and every canonical field a type
//! - field names are unique
//! - an alias targets an existing canonical field other than itself and
//!   declares no rules of its own
//! - virtual names are unique and do not collide with fields

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldSpec, SchemaOptions, Strictness, VirtualSpec};
use crate::document::Document;

/// Ordered field declarations plus virtuals and options.
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
    virtuals: Vec<VirtualSpec>,
    options: SchemaOptions,
    /// Field name -> position in `fields`
    positions: HashMap<String, usize>,
    /// Alias name -> canonical name
    aliases: HashMap<String, String>,
}

impl Schema {
    /// Defines a schema, rejecting malformed declarations.
    ///
    /// # Errors
    ///
    /// Returns `DOC_SCHEMA_DEFINITION_INVALID` if a field lacks a name or
    /// type, a name is declared twice, an alias target is undefined or is
    /// the field itself, an alias declares rules of its own, or a virtual
    /// collides with another name.
    pub fn define(
        name: impl Into<String>,
        fields: Vec<FieldSpec>,
        virtuals: Vec<VirtualSpec>,
        options: SchemaOptions,
    ) -> SchemaResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SchemaError::unnamed_schema());
        }

        let mut positions = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(SchemaError::missing_attribute(format!("#{}", i), "name"));
            }
            if positions.insert(field.name.clone(), i).is_some() {
                return Err(SchemaError::duplicate_field(&field.name));
            }
        }

        let mut aliases = HashMap::new();
        for field in &fields {
            match &field.alias {
                Some(target) => {
                    if target == &field.name {
                        return Err(SchemaError::self_alias(&field.name));
                    }
                    let target_spec = positions
                        .get(target)
                        .map(|&i| &fields[i])
                        .ok_or_else(|| SchemaError::undefined_alias_target(&field.name, target))?;
                    if target_spec.is_alias() {
                        return Err(SchemaError::alias_chain(&field.name, target));
                    }
                    if field.field_type.is_some() && field.field_type != target_spec.field_type {
                        return Err(SchemaError::alias_type_mismatch(&field.name, target));
                    }
                    if let Some(attribute) = field.first_rule() {
                        return Err(SchemaError::alias_attribute(&field.name, attribute));
                    }
                    aliases.insert(field.name.clone(), target.clone());
                }
                None => {
                    if field.field_type.is_none() {
                        return Err(SchemaError::missing_attribute(&field.name, "type"));
                    }
                }
            }
        }

        let mut virtual_names = HashSet::new();
        for (i, virtual_spec) in virtuals.iter().enumerate() {
            if virtual_spec.name.trim().is_empty() {
                return Err(SchemaError::missing_attribute(format!("virtual #{}", i), "name"));
            }
            if positions.contains_key(&virtual_spec.name) {
                return Err(SchemaError::virtual_shadows_field(&virtual_spec.name));
            }
            if !virtual_names.insert(virtual_spec.name.as_str()) {
                return Err(SchemaError::duplicate_virtual(&virtual_spec.name));
            }
        }

        Ok(Self {
            name,
            fields,
            virtuals,
            options,
            positions,
            aliases,
        })
    }

    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Collection name this schema describes
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical fields in declaration order (aliases excluded)
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| !f.is_alias())
    }

    /// Every declaration, aliases included
    pub fn all_fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Maps an alias to its canonical name; canonical names map to themselves.
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        if let Some(target) = self.aliases.get(name) {
            return Some(target.as_str());
        }
        self.positions.contains_key(name).then_some(name)
    }

    /// Canonical spec for a field or alias name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        let canonical = self.canonical_name(name)?;
        self.positions.get(canonical).map(|&i| &self.fields[i])
    }

    /// Alias names declared for a canonical field, in declaration order
    pub fn aliases_of<'a>(&'a self, canonical: &'a str) -> impl Iterator<Item = &'a str> {
        self.fields
            .iter()
            .filter(move |f| f.alias.as_deref() == Some(canonical))
            .map(|f| f.name.as_str())
    }

    /// True for declared field and alias names
    pub fn is_declared(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn virtuals(&self) -> &[VirtualSpec] {
        &self.virtuals
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    pub fn strictness(&self) -> Strictness {
        self.options.strict
    }

    /// Names of fields the store must keep unique
    pub fn unique_fields(&self) -> impl Iterator<Item = &str> {
        self.fields().filter(|f| f.unique).map(|f| f.name.as_str())
    }
}

/// Incremental construction of a [`Schema`]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldSpec>,
    virtuals: Vec<VirtualSpec>,
    options: SchemaOptions,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            virtuals: Vec::new(),
            options: SchemaOptions::default(),
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn virtual_field<F>(mut self, name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&Document) -> Value + Send + Sync + 'static,
    {
        self.virtuals.push(VirtualSpec::new(name, compute));
        self
    }

    pub fn strict(mut self, strict: Strictness) -> Self {
        self.options.strict = strict;
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(&Document, Document) -> Document + Send + Sync + 'static,
    {
        self.options = self.options.transform(transform);
        self
    }

    pub fn build(self) -> SchemaResult<Schema> {
        Schema::define(self.name, self.fields, self.virtuals, self.options)
    }
}
