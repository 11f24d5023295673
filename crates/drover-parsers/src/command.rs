//! Timeout-bounded execution of external scheduler commands.

use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Exit code reported when the timeout fires and the child is killed.
pub const TIMEOUT_EXIT_CODE: i32 = -15;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to spawn {command:?}: {error}")]
    Spawn { command: String, error: String },
    #[error("failed collecting output of {command:?}: {error}")]
    Output { command: String, error: String },
}

/// Structured result of one command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// Run a command through the shell, bounded by `timeout`.
///
/// A non-zero exit is a normal result, never an error. When the timeout
/// elapses the child is killed and a synthetic result is returned with
/// [`TIMEOUT_EXIT_CODE`] and a marker in stderr. Only a failure to spawn or
/// to collect output surfaces as `Err`.
pub async fn run_command(command: &str, timeout: Duration) -> Result<CommandResult, CommandError> {
    let child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CommandError::Spawn {
            command: command.to_string(),
            error: e.to_string(),
        })?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        }),
        Ok(Err(err)) => Err(CommandError::Output {
            command: command.to_string(),
            error: err.to_string(),
        }),
        // The elapsed timer drops the wait future, and kill_on_drop reaps
        // the child with it.
        Err(_) => Ok(CommandResult {
            stdout: String::new(),
            stderr: format!(
                "Timeout exceeded: command killed after {} seconds",
                timeout.as_secs()
            ),
            exit_code: TIMEOUT_EXIT_CODE,
        }),
    }
}
