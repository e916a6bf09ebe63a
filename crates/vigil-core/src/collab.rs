//! Collaborator traits: the process and mail back ends the agent runs against
//!
//! The processing core never spawns processes or opens SMTP connections
//! itself; it talks to these traits. Production wires in the tokio-backed
//! implementations from the agent crate, tests substitute recording fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

use crate::CheckResult;

/// Failure to even start an execution attempt.
///
/// Errors of this kind are recorded as structured failures; anything that
/// happens after the process starts is folded into the [`CheckResult`]
/// instead, so a crashing check can never abort a processing run.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("cannot execute an empty command")]
    EmptyCommand,
}

/// Runs external commands and captures their output.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Run `argv` with an optional working directory and capture the
    /// outcome. Spawn failures are folded into the result's stderr.
    async fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<CheckResult, ProcessError>;
}

/// An outgoing notification mail, with all fields already resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMail {
    /// SMTP auth user
    pub username: Option<String>,
    /// SMTP auth password
    pub password: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub reply_to: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
    /// Send the body as HTML instead of plain text
    pub html: bool,
}

/// Failure to build or send a notification mail.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("invalid mail address: {0}")]
    Address(String),
    #[error("cannot build mail: {0}")]
    Build(String),
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Delivers notification mails.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Send the mail and return the transport's receipt line.
    async fn send(&self, mail: &OutgoingMail) -> Result<String, MailError>;
}

/// Resolve a configured working directory against the directory holding the
/// configuration file. Absolute paths pass through unchanged.
pub fn resolve_cwd(config_dir: &Path, cwd: &str) -> PathBuf {
    let path = Path::new(cwd);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        config_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_cwd_absolute_passes_through() {
        assert_eq!(
            resolve_cwd(Path::new("/etc/vigil"), "/tmp"),
            PathBuf::from("/tmp")
        );
    }

    #[test]
    fn test_resolve_cwd_relative_joins_config_dir() {
        assert_eq!(
            resolve_cwd(Path::new("/etc/vigil"), "scripts"),
            PathBuf::from("/etc/vigil/scripts")
        );
    }
}
