//! Monitored items and their bounded result histories

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::CheckResult;

/// Item result histories keyed by item name, newest first.
///
/// Built once per processing run and shared read-only by every trigger.
pub type ItemHistories = HashMap<String, Vec<CheckResult>>;

/// The command an item or action runs.
///
/// A plain string is handed to a login shell; an array is used as an argument
/// vector verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandLine {
    /// Shell form, run via `/bin/bash -l -c`
    Shell(String),
    /// Explicit argument vector, first element is the program
    Argv(Vec<String>),
}

impl CommandLine {
    /// The argument vector to spawn.
    pub fn to_argv(&self) -> Vec<String> {
        match self {
            CommandLine::Shell(cmd) => vec![
                "/bin/bash".to_string(),
                "-l".to_string(),
                "-c".to_string(),
                cmd.clone(),
            ],
            CommandLine::Argv(argv) => argv.clone(),
        }
    }
}

/// A monitored item: a named check with a rolling result history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDoc {
    /// Unique name, referenced from trigger expressions as `{item:name...}`
    pub name: String,

    /// The check command; items without one are never polled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<CommandLine>,

    /// Working directory for the check, relative paths resolve against the
    /// configuration file's directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,

    /// How many results to keep; absent means the history is unbounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<usize>,

    /// Recorded results, newest first
    #[serde(rename = "lastValues", default, skip_serializing_if = "Vec::is_empty")]
    pub last_values: Vec<CheckResult>,
}

impl ItemDoc {
    /// An item with just a name, for building up in tests and tools.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cmd: None,
            cwd: None,
            history: None,
            last_values: Vec::new(),
        }
    }

    /// Prepend a result and trim the history to its configured bound.
    pub fn record(&mut self, result: CheckResult) {
        self.last_values.insert(0, result);
        if let Some(limit) = self.history {
            if self.last_values.len() > limit {
                self.last_values.truncate(limit);
            }
        }
    }
}

/// Snapshot every item's history for one processing run.
pub fn history_snapshot(items: &[ItemDoc]) -> ItemHistories {
    items
        .iter()
        .map(|item| (item.name.clone(), item.last_values.clone()))
        .collect()
}
