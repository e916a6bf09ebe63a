//! Timestamp formatting for persisted documents

use chrono::Local;

/// Format used for every timestamp written into a configuration document.
///
/// Timestamps are stored as plain local-time strings so that saved documents
/// diff cleanly and stay readable without tooling.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Current local time in the document timestamp format.
pub fn timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
