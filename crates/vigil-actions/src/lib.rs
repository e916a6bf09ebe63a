//! Action execution for the vigil monitoring agent
//!
//! A trigger transition hands its action list to the [`ActionDispatcher`],
//! which looks every action's `type` up in the [`ActionRegistry`] and runs
//! the attempts concurrently. The built-in kinds send notification mails and
//! run external commands; deployments may register further kinds.

mod command;
mod dispatch;
mod error;
mod notification;
mod props;
mod registry;

pub use command::CommandKind;
pub use dispatch::ActionDispatcher;
pub use error::{ActionError, ActionResult, DispatchError, DispatchResult};
pub use notification::NotificationKind;
pub use props::ActionProps;
pub use registry::{ActionContext, ActionKind, ActionRegistry};
