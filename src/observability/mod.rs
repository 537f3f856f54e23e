//! Observability: structured JSON logging of typed events
//!
//! # Usage
//!
//! ```ignore
//! use docshape::observability::{log_event_with_fields, Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! log_event_with_fields(Event::DocumentInserted, &[("collection", "users")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Log an event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log an event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        // Only verifies no panic
        log_event(Event::SessionStart);
        log_event_with_fields(Event::ConfigLoaded, &[("schema", "users.json")]);
    }
}
