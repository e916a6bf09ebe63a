//! Core types for the vigil monitoring agent
//!
//! This crate provides the document model shared by every vigil crate: items
//! with their check-result histories, triggers with their action lists, the
//! structured error records both persist, and the collaborator traits the
//! processing core runs against.

mod action;
mod collab;
mod error_info;
pub mod host;
mod item;
mod lines;
mod result;
mod time;
mod trigger;

pub use action::{ActionDoc, ErrorRecord, ExecutionRecord};
pub use collab::{resolve_cwd, MailError, MailTransport, OutgoingMail, ProcessError, ProcessExecutor};
pub use error_info::ErrorInfo;
pub use item::{history_snapshot, CommandLine, ItemDoc, ItemHistories};
pub use lines::TextLines;
pub use result::CheckResult;
pub use time::{timestamp, TIMESTAMP_FORMAT};
pub use trigger::{ActionList, TriggerDoc, TriggerStatus};
