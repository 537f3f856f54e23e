//! Configuration file for `docshape run`
//!
//! ```json
//! {
//!   "schema_path": "schemas/users.json",
//!   "data_file": "data/users.json",
//!   "log_level": "info",
//!   "helpers": {"byName": "name"}
//! }
//! ```
//!
//! Relative paths resolve against the configuration file's directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::observability::Severity;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Schema file (required)
    pub schema_path: String,

    /// JSON data file backing the store (optional, in-memory only if absent)
    #[serde(default)]
    pub data_file: Option<String>,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Helper name -> field it matches on
    #[serde(default)]
    pub helpers: BTreeMap<String, String>,

    #[serde(skip)]
    base_dir: PathBuf,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let mut config = Self::parse(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.schema_path.trim().is_empty() {
            return Err(CliError::config_error("schema_path must not be empty"));
        }

        if matches!(&self.data_file, Some(f) if f.trim().is_empty()) {
            return Err(CliError::config_error("data_file must not be empty when set"));
        }

        self.severity()?;

        for (name, field) in &self.helpers {
            if name.trim().is_empty() || field.trim().is_empty() {
                return Err(CliError::config_error(format!(
                    "Invalid helper '{}': name and field must not be empty",
                    name
                )));
            }
        }

        Ok(())
    }

    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| CliError::config_error(format!("Invalid log_level: {}", e)))
    }

    pub fn schema_file(&self) -> PathBuf {
        self.base_dir.join(&self.schema_path)
    }

    pub fn data_path(&self) -> Option<PathBuf> {
        self.data_file.as_ref().map(|f| self.base_dir.join(f))
    }
}
