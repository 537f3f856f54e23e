//! Schema loading from declarative JSON files
//!
//! - One schema per `*.json` file
//! - Schemas are registered by name; a name may be registered once
//! - Malformed files abort loading (FATAL)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::builtins::{named_getter, template_virtual, TransformDecl, ValidatorDecl};
use super::definition::Schema;
use super::errors::{SchemaError, SchemaResult};
use super::types::{FieldSpec, FieldType, SchemaOptions, Strictness, VirtualSpec};

/// On-disk schema declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SchemaDecl {
    pub name: String,
    #[serde(default)]
    pub strict: Strictness,
    pub fields: Vec<FieldDecl>,
    #[serde(default)]
    pub virtuals: Vec<VirtualDecl>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformDecl>,
}

/// On-disk field declaration.
///
/// `name` and `type` are optional here so that their absence surfaces as a
/// definition error naming the field rather than as a JSON error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldDecl {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default = "default_select")]
    pub select: bool,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub getter: Option<String>,
    #[serde(default)]
    pub validator: Option<ValidatorDecl>,
}

fn default_select() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VirtualDecl {
    pub name: String,
    pub template: String,
}

impl SchemaDecl {
    /// Parses a declaration from JSON text.
    pub fn parse(source: &str, origin: &str) -> SchemaResult<Self> {
        serde_json::from_str(source)
            .map_err(|e| SchemaError::malformed_file(origin, format!("Invalid JSON: {}", e)))
    }

    /// Resolves named getters, validators and templates and defines the schema.
    pub fn build(&self) -> SchemaResult<Schema> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for (i, decl) in self.fields.iter().enumerate() {
            fields.push(decl.to_spec(i)?);
        }

        let virtuals = self
            .virtuals
            .iter()
            .map(|v| VirtualSpec::from_arc(&v.name, template_virtual(&v.template)))
            .collect();

        let options = SchemaOptions {
            strict: self.strict,
            transform: self.transform.as_ref().map(TransformDecl::build),
        };

        Schema::define(&self.name, fields, virtuals, options)
    }
}

impl FieldDecl {
    fn to_spec(&self, position: usize) -> SchemaResult<FieldSpec> {
        let name = self
            .name
            .clone()
            .ok_or_else(|| SchemaError::missing_attribute(format!("#{}", position), "name"))?;

        let mut spec = match (&self.alias, &self.field_type) {
            (Some(target), _) => FieldSpec::alias_of(&name, target),
            (None, Some(ty)) => FieldSpec::new(&name, ty.clone()),
            (None, None) => FieldSpec::untyped(&name),
        };
        spec.field_type = self.field_type.clone();
        spec.required = self.required;
        spec.unique = self.unique;
        spec.select_by_default = self.select;
        spec.default = self.default.clone();
        spec.reference = self.reference.clone();

        if let Some(getter_name) = &self.getter {
            let getter = named_getter(getter_name)
                .ok_or_else(|| SchemaError::unknown_getter(&name, getter_name))?;
            spec = spec.with_getter_arc(getter);
        }
        if let Some(validator) = &self.validator {
            spec = spec.with_validator_arc(validator.build(&name)?);
        }
        Ok(spec)
    }
}

/// Reads and builds one schema file.
pub fn load_schema_file(path: &Path) -> SchemaResult<Schema> {
    let origin = path.display().to_string();
    let content = fs::read_to_string(path)
        .map_err(|e| SchemaError::malformed_file(&origin, format!("Failed to read file: {}", e)))?;
    SchemaDecl::parse(&content, &origin)?.build()
}

/// Registry of schemas loaded from a directory or registered in code.
pub struct SchemaLoader {
    schema_dir: PathBuf,
    schemas: HashMap<String, Schema>,
}

impl SchemaLoader {
    pub fn new(schema_dir: &Path) -> Self {
        Self {
            schema_dir: schema_dir.to_path_buf(),
            schemas: HashMap::new(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads every `*.json` file in the schema directory.
    ///
    /// A missing directory loads nothing.
    pub fn load_all(&mut self) -> SchemaResult<()> {
        if !self.schema_dir.exists() {
            return Ok(());
        }

        let dir = self.schema_dir.display().to_string();
        let entries = fs::read_dir(&self.schema_dir).map_err(|e| {
            SchemaError::malformed_file(&dir, format!("Failed to read schema directory: {}", e))
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SchemaError::malformed_file(&dir, format!("Failed to read directory entry: {}", e))
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        // Directory order is platform dependent
        paths.sort();

        for path in paths {
            let schema = load_schema_file(&path)?;
            self.register(schema)?;
        }
        Ok(())
    }

    /// Registers a schema; a name can only be registered once.
    pub fn register(&mut self, schema: Schema) -> SchemaResult<()> {
        if self.schemas.contains_key(schema.name()) {
            return Err(SchemaError::duplicate_schema(schema.name()));
        }
        self.schemas.insert(schema.name().to_string(), schema);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Like `get`, but an unknown name is an error.
    pub fn require(&self, name: &str) -> SchemaResult<&Schema> {
        self.get(name).ok_or_else(|| SchemaError::unknown_schema(name))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    pub fn all_schemas(&self) -> impl Iterator<Item = &Schema> {
        self.schemas.values()
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }
}
