//! Trigger documents and their observed status

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ActionDoc, ErrorInfo, TextLines};

/// Observed status of a trigger condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerStatus {
    /// The condition currently holds
    Up,
    /// The condition currently does not hold
    Down,
}

impl fmt::Display for TriggerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerStatus::Up => write!(f, "up"),
            TriggerStatus::Down => write!(f, "down"),
        }
    }
}

/// One of a trigger's three action lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionList {
    Up,
    Down,
    Error,
}

impl From<TriggerStatus> for ActionList {
    fn from(status: TriggerStatus) -> Self {
        match status {
            TriggerStatus::Up => ActionList::Up,
            TriggerStatus::Down => ActionList::Down,
        }
    }
}

impl fmt::Display for ActionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionList::Up => write!(f, "up-actions"),
            ActionList::Down => write!(f, "down-actions"),
            ActionList::Error => write!(f, "error-actions"),
        }
    }
}

/// A trigger: a boolean condition over item histories, with actions bound to
/// its transitions.
///
/// `status`, `since`, `lastProcessingTime` and `error` are maintained by the
/// processing cycle and written back into the saved document; everything else
/// is authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDoc {
    /// Human-readable trigger name, used in logs and notifications
    pub name: String,

    /// The condition, a boolean expression with `{...}` placeholders
    pub expression: TextLines,

    /// Last observed status, absent until the first successful evaluation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TriggerStatus>,

    /// When the current status was first observed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<String>,

    /// When the trigger was last processed
    #[serde(rename = "lastProcessingTime", skip_serializing_if = "Option::is_none")]
    pub last_processing_time: Option<String>,

    /// Failure of the most recent cycle, cleared at the start of each cycle
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,

    /// Actions run when the trigger transitions to up
    #[serde(rename = "up-actions", skip_serializing_if = "Option::is_none")]
    pub up_actions: Option<Vec<ActionDoc>>,

    /// Actions run when the trigger transitions to down
    #[serde(rename = "down-actions", skip_serializing_if = "Option::is_none")]
    pub down_actions: Option<Vec<ActionDoc>>,

    /// Actions run when a cycle fails
    #[serde(rename = "error-actions", skip_serializing_if = "Option::is_none")]
    pub error_actions: Option<Vec<ActionDoc>>,

    /// Unmodeled keys an author wrote on the trigger, preserved verbatim
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl TriggerDoc {
    /// A trigger with the given name and condition text.
    pub fn new(name: impl Into<String>, expression: impl Into<TextLines>) -> Self {
        Self {
            name: name.into(),
            expression: expression.into(),
            status: None,
            since: None,
            last_processing_time: None,
            error: None,
            up_actions: None,
            down_actions: None,
            error_actions: None,
            rest: serde_json::Map::new(),
        }
    }

    /// Take ownership of an action list so it can be run while the rest of
    /// the trigger stays borrowable. Pair with [`TriggerDoc::restore_actions`].
    pub fn take_actions(&mut self, list: ActionList) -> Option<Vec<ActionDoc>> {
        match list {
            ActionList::Up => self.up_actions.take(),
            ActionList::Down => self.down_actions.take(),
            ActionList::Error => self.error_actions.take(),
        }
    }

    /// Put a previously taken action list back.
    pub fn restore_actions(&mut self, list: ActionList, actions: Option<Vec<ActionDoc>>) {
        match list {
            ActionList::Up => self.up_actions = actions,
            ActionList::Down => self.down_actions = actions,
            ActionList::Error => self.error_actions = actions,
        }
    }
}
