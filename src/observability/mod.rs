//! Observability for registry runs
//!
//! Structured JSON log lines on stderr, one per typed [`Event`].
//!
//! # Usage
//!
//! ```ignore
//! use ecoreg::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::PackageValid, &[("package", "scanpy")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, Severity};

/// Returns the severity an event is logged at
pub fn event_severity(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_error() {
        Severity::Error
    } else {
        Severity::Info
    }
}

/// Log an event
pub fn log_event(event: Event) {
    Logger::log(event_severity(event), event.as_str(), &[]);
}

/// Log an event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event_severity(event), event.as_str(), fields);
}
