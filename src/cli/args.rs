//! CLI argument definitions using clap
//!
//! Commands:
//! - docshape check --schema <path>
//! - docshape validate --schema <path>
//! - docshape present --schema <path> [--select <selection>]
//! - docshape run --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docshape - schema-first document validation and presentation
#[derive(Parser, Debug)]
#[command(name = "docshape")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a schema file and describe it
    Check {
        /// Path to the schema file
        #[arg(long)]
        schema: PathBuf,
    },

    /// Validate one JSON document per stdin line
    Validate {
        /// Path to the schema file
        #[arg(long)]
        schema: PathBuf,
    },

    /// Present one stored JSON record per stdin line
    Present {
        /// Path to the schema file
        #[arg(long)]
        schema: PathBuf,

        /// Field selection, e.g. "+secret -email"
        #[arg(long)]
        select: Option<String>,
    },

    /// Execute JSON-line operations against an in-memory store
    Run {
        /// Path to configuration file
        #[arg(long, default_value = "./docshape.json")]
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
