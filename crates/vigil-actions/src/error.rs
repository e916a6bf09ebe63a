//! Errors raised while dispatching and executing actions

use thiserror::Error;

use vigil_core::MailError;
use vigil_template::PlaceholderError;

pub type ActionResult<T> = Result<T, ActionError>;
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Failure of one recognized action's own attempt.
///
/// These are recorded on the failing action and never escalate past it.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A placeholder in one of the action's fields failed to resolve
    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),

    /// A field the kind requires is not on the action
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    /// A field is present but has the wrong shape
    #[error("Field '{field}' must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    /// The mail transport refused or failed to deliver
    #[error(transparent)]
    Mail(#[from] MailError),
}

/// Failure that aborts a whole action-list run.
///
/// Raised before any attempt is launched, so an unknown kind anywhere in the
/// list means no sibling runs either; the owning trigger treats it as a
/// cycle failure.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Unknown action type: {0}")]
    UnknownActionType(String),
}
