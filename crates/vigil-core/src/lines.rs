//! Text that is stored either as a single string or as an array of lines

use serde::{Deserialize, Serialize};

/// A piece of configuration text.
///
/// Authors may write long values (trigger expressions, mail bodies) either as
/// one JSON string or as an array of strings, one per line. Both forms denote
/// the same text; the array form survives serialization unchanged so that
/// hand-formatted configuration files stay readable after a save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TextLines {
    /// A single-line (or embedded-newline) string
    One(String),
    /// One string per line, joined with newlines when resolved
    Many(Vec<String>),
}

impl TextLines {
    /// Build from raw text, splitting into the array form when the text
    /// spans several lines.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.contains('\n') {
            TextLines::Many(text.split('\n').map(str::to_string).collect())
        } else {
            TextLines::One(text)
        }
    }

    /// Interpret a JSON value as text: a string, or an array whose elements
    /// are all strings. Anything else is not text.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(TextLines::One(s.clone())),
            serde_json::Value::Array(items) => {
                let mut lines = Vec::with_capacity(items.len());
                for item in items {
                    lines.push(item.as_str()?.to_string());
                }
                Some(TextLines::Many(lines))
            }
            _ => None,
        }
    }

    /// The full text, with array elements joined by newlines.
    pub fn join(&self) -> String {
        match self {
            TextLines::One(s) => s.clone(),
            TextLines::Many(lines) => lines.join("\n"),
        }
    }
}

impl Default for TextLines {
    fn default() -> Self {
        TextLines::One(String::new())
    }
}

impl From<&str> for TextLines {
    fn from(s: &str) -> Self {
        TextLines::One(s.to_string())
    }
}

impl From<String> for TextLines {
    fn from(s: String) -> Self {
        TextLines::One(s)
    }
}

impl From<Vec<String>> for TextLines {
    fn from(lines: Vec<String>) -> Self {
        TextLines::Many(lines)
    }
}
