//! Action documents attached to triggers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{CheckResult, ErrorInfo};

/// Record of an action's most recent execution attempt.
///
/// Command actions store either the finished result or, when the attempt
/// could not be set up at all, a structured error stamped with the attempt
/// time. `Failure` must stay the first variant: its records carry `msg`, so
/// untagged deserialization tries it before the looser result shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExecutionRecord {
    /// The attempt failed before the process ran
    Failure(ErrorRecord),
    /// The process ran to completion
    Finished(CheckResult),
}

/// A setup failure with the time of the attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// What went wrong
    #[serde(flatten)]
    pub error: ErrorInfo,

    /// Local time of the attempt
    pub time: String,
}

/// One action in a trigger's `up-actions`, `down-actions` or `error-actions`
/// list.
///
/// Only the kind and the bookkeeping fields are modeled; everything else an
/// author writes on the action (recipients, command tokens, flags) stays in
/// `fields` and is interpreted by the registered action kind, so new kinds
/// need no schema changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDoc {
    /// Which registered action kind runs this action
    #[serde(rename = "type")]
    pub kind: String,

    /// Result of the most recent run, maintained by command-like kinds
    #[serde(rename = "lastExecution", skip_serializing_if = "Option::is_none")]
    pub last_execution: Option<ExecutionRecord>,

    /// Failure of the most recent attempt, cleared on every new attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,

    /// Kind-specific properties, passed through serialization untouched
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ActionDoc {
    /// An action of the given kind with no properties yet.
    pub fn of_kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            last_execution: None,
            error: None,
            fields: Map::new(),
        }
    }

    /// Builder-style property setter, mostly for tests.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// A kind-specific property, if the author wrote one.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// A kind-specific property read as a boolean flag. Missing fields and
    /// empty values count as unset.
    pub fn flag(&self, name: &str) -> bool {
        match self.fields.get(name) {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(_)) | Some(Value::Object(_)) => true,
        }
    }
}
