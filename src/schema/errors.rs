//! Schema error types
//!
//! Error codes:
//! - DOC_SCHEMA_DEFINITION_INVALID (FATAL)
//! - DOC_SCHEMA_FILE_INVALID (FATAL)
//! - DOC_SCHEMA_DUPLICATE (FATAL)
//! - DOC_UNKNOWN_SCHEMA (REJECT)

use std::fmt;

/// Severity levels for schema errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller request rejected
    Reject,
    /// Startup must abort
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Schema-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaErrorCode {
    /// Malformed field or virtual declaration
    DefinitionInvalid,
    /// Schema file unreadable or not valid JSON
    FileInvalid,
    /// Two schemas registered under one name
    DuplicateSchema,
    /// Schema name not registered
    UnknownSchema,
}

impl SchemaErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            SchemaErrorCode::DefinitionInvalid => "DOC_SCHEMA_DEFINITION_INVALID",
            SchemaErrorCode::FileInvalid => "DOC_SCHEMA_FILE_INVALID",
            SchemaErrorCode::DuplicateSchema => "DOC_SCHEMA_DUPLICATE",
            SchemaErrorCode::UnknownSchema => "DOC_UNKNOWN_SCHEMA",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            SchemaErrorCode::UnknownSchema => Severity::Reject,
            _ => Severity::Fatal,
        }
    }
}

impl fmt::Display for SchemaErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Schema error type with full context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    code: SchemaErrorCode,
    message: String,
    /// Offending field or virtual, if any
    field: Option<String>,
}

impl SchemaError {
    fn definition(field: impl Into<String>, message: String) -> Self {
        Self {
            code: SchemaErrorCode::DefinitionInvalid,
            message,
            field: Some(field.into()),
        }
    }

    /// A field is missing its name or type
    pub fn missing_attribute(field: impl Into<String>, attribute: &str) -> Self {
        let field = field.into();
        let message = format!("Field '{}' is missing required attribute '{}'", field, attribute);
        Self::definition(field, message)
    }

    pub fn duplicate_field(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("Field '{}' is declared more than once", field);
        Self::definition(field, message)
    }

    pub fn undefined_alias_target(field: impl Into<String>, target: &str) -> Self {
        let field = field.into();
        let message = format!("Field '{}' aliases undefined field '{}'", field, target);
        Self::definition(field, message)
    }

    pub fn self_alias(field: impl Into<String>) -> Self {
        let field = field.into();
        let message = format!("Field '{}' cannot be its own alias", field);
        Self::definition(field, message)
    }

    /// Alias pointing at another alias
    pub fn alias_chain(field: impl Into<String>, target: &str) -> Self {
        let field = field.into();
        let message = format!(
            "Field '{}' aliases '{}', which is itself an alias",
            field, target
        );
        Self::definition(field, message)
    }

    pub fn alias_type_mismatch(field: impl Into<String>, target: &str) -> Self {
        let field = field.into();
        let message = format!(
            "Alias '{}' declares a type different from its target '{}'",
            field, target
        );
        Self::definition(field, message)
    }

    /// Rules belong on the canonical field, never on an alias
    pub fn alias_attribute(field: impl Into<String>, attribute: &str) -> Self {
        let field = field.into();
        let message = format!(
            "Alias '{}' cannot declare '{}'; declare it on the target field",
            field, attribute
        );
        Self::definition(field, message)
    }

    pub fn virtual_shadows_field(name: impl Into<String>) -> Self {
        let name = name.into();
        let message = format!("Virtual '{}' collides with a declared field", name);
        Self::definition(name, message)
    }

    pub fn duplicate_virtual(name: impl Into<String>) -> Self {
        let name = name.into();
        let message = format!("Virtual '{}' is declared more than once", name);
        Self::definition(name, message)
    }

    pub fn unknown_getter(field: impl Into<String>, getter: &str) -> Self {
        let field = field.into();
        let message = format!("Field '{}' uses unknown getter '{}'", field, getter);
        Self::definition(field, message)
    }

    pub fn invalid_validator(field: impl Into<String>, reason: impl fmt::Display) -> Self {
        let field = field.into();
        let message = format!("Field '{}' has an invalid validator: {}", field, reason);
        Self::definition(field, message)
    }

    /// Schema without a name
    pub fn unnamed_schema() -> Self {
        Self {
            code: SchemaErrorCode::DefinitionInvalid,
            message: "Schema name must not be empty".into(),
            field: None,
        }
    }

    /// Create an error for an unreadable or malformed schema file
    pub fn malformed_file(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::FileInvalid,
            message: format!("Malformed schema file '{}': {}", path.into(), reason.into()),
            field: None,
        }
    }

    pub fn duplicate_schema(name: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::DuplicateSchema,
            message: format!("Schema '{}' is already registered", name.into()),
            field: None,
        }
    }

    pub fn unknown_schema(name: impl Into<String>) -> Self {
        Self {
            code: SchemaErrorCode::UnknownSchema,
            message: format!("Schema '{}' not found", name.into()),
            field: None,
        }
    }

    pub fn code(&self) -> SchemaErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.code.severity(), self.code.code(), self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
