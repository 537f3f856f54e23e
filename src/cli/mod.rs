//! CLI module for docshape
//!
//! Provides command-line interface for:
//! - check: Load a schema file and describe it
//! - validate: Stream candidate documents through the write path
//! - present: Stream stored records through the read path
//! - run: Execute model operations against a configured store

mod args;
mod commands;
mod config;
mod errors;
mod io;
mod session;

pub use args::{Cli, Command};
pub use commands::{check, present_stream, run, run_command, run_session, validate_stream};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_lines, write_error, write_response, write_violations};
pub use session::{apply, HelperCall, Operation, QuerySpec};
