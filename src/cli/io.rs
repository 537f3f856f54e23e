//! JSON-lines I/O for the CLI
//!
//! - Input: one JSON value per line; blank lines are skipped
//! - Output: one JSON response object per line
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use super::errors::CliResult;
use crate::transform::ValidationFailure;

/// Non-blank input lines
pub fn read_lines<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<String>> {
    input
        .lines()
        .map(|line| line.map_err(Into::into))
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
}

/// `{"status":"ok","data":...}`
pub fn write_response<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    write_line(out, &json!({"status": "ok", "data": data}))
}

/// `{"status":"error","code":...,"message":...}`
pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    write_line(
        out,
        &json!({"status": "error", "code": code, "message": message}),
    )
}

/// Error response listing every violation
pub fn write_violations<W: Write>(out: &mut W, failure: &ValidationFailure) -> CliResult<()> {
    write_line(
        out,
        &json!({
            "status": "error",
            "code": "DOC_VALIDATION_FAILED",
            "message": failure.to_string(),
            "errors": failure.violations(),
        }),
    )
}

fn write_line<W: Write>(out: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
