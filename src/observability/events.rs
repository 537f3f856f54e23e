//! Observable events
//!
//! Events are explicit and typed. Each carries the severity it is logged at.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Session
    /// CLI session begins
    SessionStart,
    /// CLI session finished
    SessionComplete,

    // Configuration
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Configuration rejected
    ConfigRejected,

    // Schemas
    /// Schema file loaded and defined
    SchemaLoaded,
    /// Schema file rejected
    SchemaRejected,

    // Store
    /// Data file read into the store
    StoreOpened,
    /// Store written back to its data file
    StoreFlushed,

    // Documents
    /// One document validated and persisted
    DocumentInserted,
    /// Batch validated and persisted
    DocumentsInserted,
    /// Candidate failed validation
    DocumentRejected,
    /// Records removed
    DocumentsDeleted,
    /// Query executed and presented
    QueryExecuted,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SessionStart => "SESSION_START",
            Event::SessionComplete => "SESSION_COMPLETE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ConfigRejected => "CONFIG_REJECTED",
            Event::SchemaLoaded => "SCHEMA_LOADED",
            Event::SchemaRejected => "SCHEMA_REJECTED",
            Event::StoreOpened => "STORE_OPENED",
            Event::StoreFlushed => "STORE_FLUSHED",
            Event::DocumentInserted => "DOCUMENT_INSERTED",
            Event::DocumentsInserted => "DOCUMENTS_INSERTED",
            Event::DocumentRejected => "DOCUMENT_REJECTED",
            Event::DocumentsDeleted => "DOCUMENTS_DELETED",
            Event::QueryExecuted => "QUERY_EXECUTED",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Event::ConfigRejected | Event::SchemaRejected => Severity::Error,
            Event::DocumentRejected => Severity::Warn,
            Event::QueryExecuted => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
