//! Local host identity lookups for placeholder resolution

use std::env;
use std::fs;
use std::process::Command;

/// The current user's login name.
///
/// Checked in order: `USER`, `LOGNAME`, then `id -un`. Falls back to
/// `"unknown"` so placeholder resolution never fails on identity lookups.
pub fn username() -> String {
    env::var("USER")
        .or_else(|_| env::var("LOGNAME"))
        .ok()
        .filter(|name| !name.is_empty())
        .or_else(|| command_stdout("id", &["-un"]))
        .unwrap_or_else(|| "unknown".to_string())
}

/// The local host name.
///
/// Checked in order: `/etc/hostname`, the `HOSTNAME` variable, then the
/// `hostname` command. Falls back to `"unknown"`.
pub fn hostname() -> String {
    fs::read_to_string("/etc/hostname")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| env::var("HOSTNAME").ok().filter(|name| !name.is_empty()))
        .or_else(|| command_stdout("hostname", &[]))
        .unwrap_or_else(|| "unknown".to_string())
}

fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_is_never_empty() {
        assert!(!username().is_empty());
    }

    #[test]
    fn test_hostname_is_never_empty() {
        assert!(!hostname().is_empty());
    }
}
