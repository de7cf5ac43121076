//! Shell command execution for label/value templating and execute-command items
//!
//! Failures are never fatal: [`CommandExecutor::run`] turns every error into
//! its message so a broken command shows up inline in the menu.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

/// Why a command produced no usable output
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Command failed to start: {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed: {command}\n{stderr}")]
    NonZeroExit {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("Command timed out after {}s: {command}", timeout.as_secs_f32())]
    TimedOut { command: String, timeout: Duration },
}

impl CommandError {
    /// Exit code of a command that ran to completion with a failure status
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::NonZeroExit { status, .. } => *status,
            _ => None,
        }
    }
}

/// Runs commands through `sh -c` with an optional timeout
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    shell: String,
    timeout: Option<Duration>,
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(
            crate::constants::config::COMMAND_TIMEOUT_SECS,
        )))
    }
}

impl CommandExecutor {
    /// `None` waits for the command indefinitely
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            shell: "sh".to_string(),
            timeout,
        }
    }

    /// Run `command` and return its trimmed standard output
    pub async fn try_run(&self, command: &str) -> Result<String, CommandError> {
        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CommandError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| CommandError::TimedOut {
                    command: command.to_string(),
                    timeout,
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|source| CommandError::Spawn {
            command: command.to_string(),
            source,
        })?;

        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                command: command.to_string(),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(command = %command, bytes = stdout.len(), "Command completed");
        Ok(stdout)
    }

    /// Run `command`, substituting the error message for the output on failure
    pub async fn run(&self, command: &str) -> String {
        match self.try_run(command).await {
            Ok(output) => output,
            Err(e) => {
                warn!(
                    command = %command,
                    exit_code = ?e.exit_code(),
                    error = %e,
                    "Command failed, using error text as output"
                );
                e.to_string().trim().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_trims_stdout() {
        let executor = CommandExecutor::default();
        assert_eq!(executor.run("printf '  hi \\n\\n'").await, "hi");
    }

    #[tokio::test]
    async fn test_non_zero_exit_returns_message() {
        let executor = CommandExecutor::default();
        let err = executor
            .try_run("echo oops >&2; exit 3")
            .await
            .unwrap_err();
        match &err {
            CommandError::NonZeroExit { status, stderr, .. } => {
                assert_eq!(*status, Some(3));
                assert_eq!(stderr, "oops");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.exit_code(), Some(3));

        let text = executor.run("echo oops >&2; exit 3").await;
        assert!(text.starts_with("Command failed: echo oops"));
        assert!(text.ends_with("oops"));
    }

    #[tokio::test]
    async fn test_non_zero_exit_without_stderr_has_no_trailing_newline() {
        let executor = CommandExecutor::default();
        assert_eq!(executor.run("exit 1").await, "Command failed: exit 1");
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_error() {
        let executor = CommandExecutor::new(Some(Duration::from_millis(100)));
        let err = executor.try_run("sleep 5").await.unwrap_err();
        assert!(matches!(err, CommandError::TimedOut { .. }));
        assert!(err.to_string().starts_with("Command timed out"));
    }

    #[tokio::test]
    async fn test_no_timeout_waits_for_completion() {
        let executor = CommandExecutor::new(None);
        assert_eq!(executor.run("sleep 0.1; echo done").await, "done");
    }

    #[tokio::test]
    async fn test_spawn_failure_reported() {
        let mut executor = CommandExecutor::default();
        executor.shell = "/nonexistent/shell".to_string();
        let err = executor.try_run("true").await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
