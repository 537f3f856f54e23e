//! CLI-specific error types
//!
//! All CLI errors are fatal: the process prints the error and exits
//! non-zero. Per-document failures are responses, not CLI errors.

use std::fmt;
use std::io;

use crate::schema::SchemaError;
use crate::store::StoreError;
use crate::transform::SelectionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Schema file could not be loaded
    SchemaError,
    /// Data file could not be opened or written
    StoreError,
    /// Invalid command-line argument
    UsageError,
}

impl CliErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "DOC_CLI_CONFIG_ERROR",
            Self::IoError => "DOC_CLI_IO_ERROR",
            Self::SchemaError => "DOC_CLI_SCHEMA_ERROR",
            Self::StoreError => "DOC_CLI_STORE_ERROR",
            Self::UsageError => "DOC_CLI_USAGE_ERROR",
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    pub fn usage_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::UsageError, msg)
    }

    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<SchemaError> for CliError {
    fn from(e: SchemaError) -> Self {
        Self::new(CliErrorCode::SchemaError, e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        Self::new(CliErrorCode::StoreError, e.to_string())
    }
}

impl From<SelectionError> for CliError {
    fn from(e: SelectionError) -> Self {
        Self::usage_error(e.to_string())
    }
}

pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_has_code() {
        let err = CliError::config_error("schema_path must not be empty");
        assert_eq!(err.to_string(), "DOC_CLI_CONFIG_ERROR: schema_path must not be empty");
    }

    #[test]
    fn test_schema_error_converts() {
        let err: CliError = SchemaError::unknown_schema("users").into();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);
        assert!(err.message().contains("users"));
    }
}
