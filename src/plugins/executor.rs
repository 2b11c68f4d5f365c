//! Subprocess executor
//!
//! Spawns the wrapped tool and captures its output under a timeout.

use crate::error::ExecutionError;
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured result of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessOutput {
    pub return_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// stdout and stderr joined for pattern matching
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Runs an argument vector as a subprocess
///
/// The seam between `run` and the operating system.
pub trait CommandExecutor {
    fn execute(
        &self,
        argv: &[String],
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> impl Future<Output = Result<ProcessOutput, ExecutionError>>;
}

/// Executor backed by `tokio::process`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

impl CommandExecutor for ProcessExecutor {
    async fn execute(
        &self,
        argv: &[String],
        cwd: Option<&Path>,
        timeout: Duration,
    ) -> Result<ProcessOutput, ExecutionError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ExecutionError::Spawn("empty argument vector".to_string()))?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!("Spawning {:?} in {:?}", argv, cwd);

        let output = match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!("{} timed out after {:?}", program, timeout);
                return Err(ExecutionError::Timeout(timeout));
            }
        };

        Ok(ProcessOutput {
            return_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_captures_output() {
        let out = ProcessExecutor
            .execute(
                &argv(&["sh", "-c", "echo hello; echo oops >&2; exit 3"]),
                None,
                Duration::from_secs(10),
            )
            .await
            .unwrap();

        assert_eq!(out.return_code, 3);
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_quoted_argument_reaches_child_intact() {
        let out = ProcessExecutor
            .execute(
                &argv(&["printf", "%s", "multi word\nvalue"]),
                None,
                Duration::from_secs(10),
            )
            .await
            .unwrap();

        assert_eq!(out.stdout, "multi word\nvalue");
    }

    #[tokio::test]
    async fn test_runs_in_cwd() {
        let temp_dir = TempDir::new().unwrap();
        let out = ProcessExecutor
            .execute(&argv(&["pwd"]), Some(temp_dir.path()), Duration::from_secs(10))
            .await
            .unwrap();

        let reported = std::fs::canonicalize(out.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(temp_dir.path()).unwrap());
    }

    #[tokio::test]
    async fn test_timeout() {
        let err = ProcessExecutor
            .execute(&argv(&["sleep", "5"]), None, Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Timeout(d) if d == Duration::from_secs(1)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_sub_second_timeout_message() {
        let err = ProcessExecutor
            .execute(&argv(&["sleep", "5"]), None, Duration::from_millis(200))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Command timed out after 0.2 seconds");
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = ProcessExecutor
            .execute(
                &argv(&["smcp-vcs-no-such-program-12345"]),
                None,
                Duration::from_secs(5),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Spawn(_)));
    }

    #[tokio::test]
    async fn test_empty_argv() {
        let err = ProcessExecutor
            .execute(&[], None, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert!(matches!(err, ExecutionError::Spawn(_)));
    }
}
