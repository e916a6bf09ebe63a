//! The tokio-backed process executor

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::debug;

use vigil_core::{timestamp, CheckResult, ProcessError, ProcessExecutor};

/// Runs check and action commands as child processes.
///
/// A process that cannot be spawned is not a failure of the run: the error
/// is folded into the result as a stderr line, the same place a command that
/// started and then misbehaved reports itself.
pub struct TokioProcessExecutor;

#[async_trait]
impl ProcessExecutor for TokioProcessExecutor {
    async fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<CheckResult, ProcessError> {
        let mut result = CheckResult::at(timestamp());
        let (program, args) = argv.split_first().ok_or(ProcessError::EmptyCommand)?;

        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }

        debug!(program = %program, "spawning check process");
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                result.stderr = Some(vec![format!("failed to spawn '{program}': {err}")]);
                return Ok(result);
            }
        };

        // Read both pipes in their own tasks so the child cannot block on a
        // full pipe while we wait for it.
        let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
        let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

        match child.wait().await {
            Ok(status) => {
                result.exit_code = status.code().filter(|&code| code != 0);
            }
            Err(err) => {
                result.stderr = Some(vec![format!("failed to reap '{program}': {err}")]);
                return Ok(result);
            }
        }
        result.stdout = split_lines(&stdout_task.await.unwrap_or_default());
        result.stderr = split_lines(&stderr_task.await.unwrap_or_default());
        Ok(result)
    }
}

/// Read an output stream to the end.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut handle) = handle {
        let _ = handle.read_to_end(&mut buf).await;
    }
    buf
}

/// Split captured output into lines, dropping the empty tail a trailing
/// newline leaves behind. No output at all stays `None` so the field is
/// omitted from the record.
fn split_lines(bytes: &[u8]) -> Option<Vec<String>> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
    if lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    (!lines.is_empty()).then_some(lines)
}
