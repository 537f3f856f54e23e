//! CLI command implementations
//!
//! Every command streams over generic readers and writers so the same code
//! serves stdin/stdout and tests. Per-line failures become error responses;
//! only startup failures (config, schema, data file) abort the command.

use std::io::{self, BufRead, Write};
use std::path::Path;

use serde_json::{json, Value};

use crate::document::Document;
use crate::model::{Model, ModelError};
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::schema::{load_schema_file, Schema};
use crate::store::{DocumentStore, MemoryStore};
use crate::transform::{present, validate, PresentOptions};

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{read_lines, write_error, write_response, write_violations};
use super::session::{apply, Operation};

const INVALID_REQUEST: &str = "DOC_INVALID_REQUEST";

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Run a command against stdin/stdout
pub fn run_command(command: Command) -> CliResult<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match command {
        Command::Check { schema } => check(&schema, &mut out),
        Command::Validate { schema } => {
            let schema = load_schema(&schema)?;
            validate_stream(&schema, stdin.lock(), &mut out)
        }
        Command::Present { schema, select } => {
            let schema = load_schema(&schema)?;
            let options = match select {
                Some(selection) => PresentOptions::parse(&selection)?,
                None => PresentOptions::new(),
            };
            present_stream(&schema, &options, stdin.lock(), &mut out)
        }
        Command::Run { config } => run_session(&config, stdin.lock(), &mut out),
    }
}

/// Loads a schema file and writes its description.
pub fn check<W: Write>(path: &Path, out: &mut W) -> CliResult<()> {
    let schema = load_schema(path)?;
    write_response(out, describe(&schema))
}

/// Validates one candidate document per input line.
pub fn validate_stream<R: BufRead, W: Write>(schema: &Schema, input: R, out: &mut W) -> CliResult<()> {
    for line in read_lines(input) {
        let candidate = match parse_document(&line?) {
            Ok(candidate) => candidate,
            Err(message) => {
                write_error(out, INVALID_REQUEST, &message)?;
                continue;
            }
        };
        match validate(schema, &candidate) {
            Ok(validated) => write_response(out, validated.into_value())?,
            Err(failure) => write_violations(out, &failure)?,
        }
    }
    Ok(())
}

/// Presents one stored record per input line.
pub fn present_stream<R: BufRead, W: Write>(
    schema: &Schema,
    options: &PresentOptions,
    input: R,
    out: &mut W,
) -> CliResult<()> {
    for line in read_lines(input) {
        match parse_document(&line?) {
            Ok(record) => write_response(out, present(schema, &record, options).into_value())?,
            Err(message) => write_error(out, INVALID_REQUEST, &message)?,
        }
    }
    Ok(())
}

/// Runs model operations from `input` against the configured store.
///
/// Sequence:
/// 1. Load and validate config, apply its log level
/// 2. Load the schema
/// 3. Open the store (file backed when `data_file` is set)
/// 4. Register config helpers
/// 5. Apply each operation, one response per line
/// 6. Flush the store
pub fn run_session<R: BufRead, W: Write>(config_path: &Path, input: R, out: &mut W) -> CliResult<()> {
    let config = Config::load(config_path).map_err(|e| {
        log_event_with_fields(Event::ConfigRejected, &[("error", e.message())]);
        e
    })?;
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(Event::ConfigLoaded, &[("schema", &config.schema_path)]);

    let schema = load_schema(&config.schema_file())?;

    for (name, field) in &config.helpers {
        if schema.canonical_name(field).is_none() {
            let err = CliError::config_error(format!(
                "Helper '{}' matches undeclared field '{}'",
                name, field
            ));
            log_event_with_fields(Event::ConfigRejected, &[("error", err.message())]);
            return Err(err);
        }
    }

    let store = match config.data_path() {
        Some(path) => {
            let store = MemoryStore::open(&path)?;
            let records = store.len().to_string();
            log_event_with_fields(
                Event::StoreOpened,
                &[("path", &path.display().to_string()), ("records", &records)],
            );
            store
        }
        None => MemoryStore::new(),
    };

    let mut model = Model::new(schema, store);
    for (name, field) in &config.helpers {
        model.register_field_helper(name.clone(), field.clone());
    }

    log_event_with_fields(Event::SessionStart, &[("collection", model.schema().name())]);

    let mut processed = 0usize;
    for line in read_lines(input) {
        let line = line?;
        processed += 1;

        let operation: Operation = match serde_json::from_str(&line) {
            Ok(operation) => operation,
            Err(e) => {
                write_error(out, INVALID_REQUEST, &e.to_string())?;
                continue;
            }
        };

        match apply(&mut model, operation) {
            Ok(data) => write_response(out, data)?,
            Err(ModelError::Validation(failure)) => write_violations(out, &failure)?,
            Err(e) => write_error(out, e.code(), &e.to_string())?,
        }
    }

    model
        .flush()
        .map_err(|e| CliError::new(CliErrorCode::StoreError, e.to_string()))?;
    if let Some(path) = model.store().path() {
        let records = model.store().len().to_string();
        log_event_with_fields(
            Event::StoreFlushed,
            &[("path", &path.display().to_string()), ("records", &records)],
        );
    }

    log_event_with_fields(Event::SessionComplete, &[("operations", &processed.to_string())]);
    Ok(())
}

fn load_schema(path: &Path) -> CliResult<Schema> {
    let origin = path.display().to_string();
    match load_schema_file(path) {
        Ok(schema) => {
            log_event_with_fields(
                Event::SchemaLoaded,
                &[("path", &origin), ("schema", schema.name())],
            );
            Ok(schema)
        }
        Err(e) => {
            log_event_with_fields(
                Event::SchemaRejected,
                &[("path", &origin), ("error", e.message())],
            );
            Err(e.into())
        }
    }
}

fn parse_document(line: &str) -> Result<Document, String> {
    let value: Value = serde_json::from_str(line).map_err(|e| format!("Invalid JSON: {}", e))?;
    Document::from_value(value).ok_or_else(|| "Expected a JSON object".to_string())
}

/// JSON summary of a schema, as printed by `check`.
fn describe(schema: &Schema) -> Value {
    let fields: Vec<Value> = schema
        .all_fields()
        .iter()
        .map(|field| {
            json!({
                "name": field.name,
                "type": field.field_type,
                "required": field.required,
                "unique": field.unique,
                "select": field.select_by_default,
                "alias": field.alias,
                "default": field.default,
                "ref": field.reference,
                "getter": field.get_getter().is_some(),
                "validator": field.get_validator().is_some(),
            })
        })
        .collect();
    let virtuals: Vec<&str> = schema.virtuals().iter().map(|v| v.name.as_str()).collect();

    json!({
        "name": schema.name(),
        "strict": schema.strictness(),
        "fields": fields,
        "virtuals": virtuals,
        "transform": schema.options().transform.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    const USERS: &str = r#"{
        "name": "users",
        "fields": [
            {"name": "name", "type": "string", "required": true},
            {"name": "fullName", "alias": "name"},
            {"name": "type", "type": "string"},
            {"name": "age", "type": "number", "validator": {"min": 18}},
            {"name": "secret", "type": "string", "select": false}
        ],
        "virtuals": [{"name": "greeting", "template": "Hi {name}"}]
    }"#;

    fn responses(out: &[u8]) -> Vec<Value> {
        String::from_utf8_lossy(out)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn write_schema(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("users.schema.json");
        fs::write(&path, USERS).unwrap();
        path
    }

    #[test]
    fn test_check_describes_schema() {
        let dir = TempDir::new().unwrap();
        let path = write_schema(&dir);
        let mut out = Vec::new();
        check(&path, &mut out).unwrap();

        let resp = &responses(&out)[0];
        assert_eq!(resp["data"]["name"], json!("users"));
        assert_eq!(resp["data"]["fields"][1]["alias"], json!("name"));
        assert_eq!(resp["data"]["virtuals"], json!(["greeting"]));
    }

    #[test]
    fn test_check_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = check(&dir.path().join("missing.json"), &mut Vec::new()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::SchemaError);
    }

    #[test]
    fn test_validate_stream_one_response_per_line() {
        let dir = TempDir::new().unwrap();
        let schema = load_schema(&write_schema(&dir)).unwrap();
        let input = Cursor::new("{\"fullName\": \"Alice\"}\n{\"age\": 10}\n[1]\nnot json\n");
        let mut out = Vec::new();
        validate_stream(&schema, input, &mut out).unwrap();

        let resp = responses(&out);
        assert_eq!(resp.len(), 4);
        assert_eq!(resp[0]["data"], json!({"name": "Alice"}));
        assert_eq!(resp[1]["code"], json!("DOC_VALIDATION_FAILED"));
        assert_eq!(resp[1]["errors"].as_array().unwrap().len(), 2);
        assert_eq!(resp[2]["code"], json!(INVALID_REQUEST));
        assert_eq!(resp[3]["code"], json!(INVALID_REQUEST));
    }

    #[test]
    fn test_present_stream_applies_selection() {
        let dir = TempDir::new().unwrap();
        let schema = load_schema(&write_schema(&dir)).unwrap();
        let input = Cursor::new("{\"name\": \"a\", \"secret\": \"s\"}\n");

        let mut out = Vec::new();
        present_stream(&schema, &PresentOptions::new(), input.clone(), &mut out).unwrap();
        let plain = &responses(&out)[0]["data"];
        assert!(plain.get("secret").is_none());
        assert_eq!(plain["greeting"], json!("Hi a"));

        let mut out = Vec::new();
        let options = PresentOptions::parse("+secret").unwrap();
        present_stream(&schema, &options, input, &mut out).unwrap();
        assert_eq!(responses(&out)[0]["data"]["secret"], json!("s"));
    }

    #[test]
    fn test_run_session_persists_data_file() {
        let dir = TempDir::new().unwrap();
        write_schema(&dir);
        let config = dir.path().join("docshape.json");
        fs::write(
            &config,
            r#"{"schema_path": "users.schema.json", "data_file": "users.data.json",
                "log_level": "error", "helpers": {"byName": "name"}}"#,
        )
        .unwrap();

        let input = Cursor::new(
            "{\"op\": \"insert\", \"doc\": {\"name\": \"Alice\", \"age\": 30}}\n\
             {\"op\": \"insert\", \"doc\": {\"name\": \"Kid\", \"age\": 5}}\n\
             {\"op\": \"bogus\"}\n\
             {\"op\": \"call\", \"helper\": \"byName\", \"arg\": \"Alice\"}\n",
        );
        let mut out = Vec::new();
        run_session(&config, input, &mut out).unwrap();

        let resp = responses(&out);
        assert_eq!(resp[0]["status"], json!("ok"));
        assert_eq!(resp[1]["code"], json!("DOC_VALIDATION_FAILED"));
        assert_eq!(resp[2]["code"], json!(INVALID_REQUEST));
        assert_eq!(resp[3]["data"].as_array().unwrap().len(), 1);

        let saved: Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("users.data.json")).unwrap())
                .unwrap();
        assert_eq!(saved.as_array().unwrap().len(), 1);

        // A second session sees the persisted record.
        let mut out = Vec::new();
        run_session(&config, Cursor::new("{\"op\": \"find\"}\n"), &mut out).unwrap();
        assert_eq!(responses(&out)[0]["data"][0]["name"], json!("Alice"));
    }

    #[test]
    fn test_run_session_rejects_helper_on_undeclared_field() {
        let dir = TempDir::new().unwrap();
        write_schema(&dir);
        let config = dir.path().join("docshape.json");
        fs::write(
            &config,
            r#"{"schema_path": "users.schema.json", "log_level": "error", "helpers": {"byEmail": "email"}}"#,
        )
        .unwrap();
        let err = run_session(&config, Cursor::new(""), &mut Vec::new()).unwrap_err();
        assert_eq!(err.code(), &CliErrorCode::ConfigError);
    }
}
