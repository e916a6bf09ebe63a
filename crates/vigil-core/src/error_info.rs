//! Structured error records persisted into configuration documents

use serde::{Deserialize, Serialize};

use crate::TextLines;

/// An error captured on a trigger or action.
///
/// The message keeps the single-string form when it fits on one line and the
/// array-of-lines form otherwise, so multi-line diagnostics (position markers
/// in particular) stay readable in the saved JSON. The stack holds one entry
/// per underlying cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// The error message, split into lines when it spans several
    pub msg: TextLines,

    /// Causes of the error, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack: Vec<String>,
}

impl ErrorInfo {
    /// Build from a plain message with no cause chain.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            msg: TextLines::from_text(message),
            stack: Vec::new(),
        }
    }

    /// Capture an error and its source chain.
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        let mut stack = Vec::new();
        let mut cause = err.source();
        while let Some(c) = cause {
            stack.push(format!("caused by: {c}"));
            cause = c.source();
        }
        Self {
            msg: TextLines::from_text(err.to_string()),
            stack,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("outer failure")]
    struct Outer {
        #[source]
        inner: Inner,
    }

    #[derive(Debug, Error)]
    #[error("inner failure")]
    struct Inner;

    #[test]
    fn test_from_error_walks_source_chain() {
        let info = ErrorInfo::from_error(&Outer { inner: Inner });
        assert_eq!(info.msg, TextLines::One("outer failure".to_string()));
        assert_eq!(info.stack, vec!["caused by: inner failure".to_string()]);
    }

    #[test]
    fn test_multi_line_message_uses_array_form() {
        let info = ErrorInfo::new("Unknown item 'cpu' in expression\n at line#1:7: {item:cpu}\n               ^^^");
        assert!(matches!(info.msg, TextLines::Many(ref lines) if lines.len() == 3));
    }

    #[test]
    fn test_serde_omits_empty_stack() {
        let info = ErrorInfo::new("boom");
        let json = serde_json::to_string(&info).unwrap();
        assert_eq!(json, "{\"msg\":\"boom\"}");

        let back: ErrorInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
