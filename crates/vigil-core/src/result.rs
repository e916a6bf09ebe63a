//! Execution results recorded for items and command actions

use serde::{Deserialize, Deserializer, Serialize};

use crate::time::timestamp;

/// The outcome of one command execution.
///
/// The shape mirrors what gets persisted: `exitCode` is present only for
/// failures, `stdout`/`stderr` only when the process produced output, and
/// `value` carries the derived check value. `value` distinguishes "absent"
/// (never derived, e.g. a raw command-action record) from an explicit `null`
/// (derived, but the check failed or produced nothing), which is why it is a
/// doubled `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Local time at which the execution started
    pub time: String,

    /// Process exit code, omitted when the process exited cleanly
    #[serde(rename = "exitCode", skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,

    /// Captured standard output lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<Vec<String>>,

    /// Captured standard error lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<Vec<String>>,

    /// Derived check value: outer `None` = field absent, `Some(None)` =
    /// explicit `null`, `Some(Some(_))` = a string value
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "double_option"
    )]
    pub value: Option<Option<String>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    // A present-but-null field deserializes to Some(None); absence is handled
    // by #[serde(default)] and stays None.
    Option::<String>::deserialize(deserializer).map(Some)
}

impl CheckResult {
    /// An empty result stamped with the given start time.
    pub fn at(time: String) -> Self {
        Self {
            time,
            exit_code: None,
            stdout: None,
            stderr: None,
            value: None,
        }
    }

    /// A result representing an execution that never produced output, with
    /// the failure folded into a stderr line and the value pinned to `null`.
    pub fn failed(time: String, err: &dyn std::error::Error) -> Self {
        Self {
            time,
            exit_code: None,
            stdout: None,
            stderr: Some(vec![err.to_string()]),
            value: Some(None),
        }
    }

    /// Derive the check value from a finished execution.
    ///
    /// A clean exit with output yields the trimmed stdout text as the value
    /// and drops the raw stdout lines; anything else yields an explicit
    /// `null` value and keeps the captured output for inspection.
    pub fn with_derived_value(mut self) -> Self {
        let succeeded = self.exit_code.is_none()
            && self.stdout.as_ref().is_some_and(|lines| !lines.is_empty());
        if succeeded {
            let lines = self.stdout.take().unwrap_or_default();
            self.value = Some(Some(lines.join("\n").trim().to_string()));
        } else {
            self.value = Some(None);
        }
        self
    }

    /// The derived value as a string, if one is present and non-null.
    pub fn value(&self) -> Option<&str> {
        self.value.as_ref().and_then(|v| v.as_deref())
    }

    /// The derived value as JSON: a string, or `null` for both the absent
    /// and the explicit-null cases.
    pub fn value_json(&self) -> serde_json::Value {
        match self.value() {
            Some(s) => serde_json::Value::String(s.to_string()),
            None => serde_json::Value::Null,
        }
    }

    /// Whether this execution already failed at exit-code level.
    pub fn is_failure(&self) -> bool {
        self.exit_code.is_some()
    }
}

impl Default for CheckResult {
    fn default() -> Self {
        Self::at(timestamp())
    }
}
