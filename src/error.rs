//! Error types for smcp-vcs

use std::time::Duration;
use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Subprocess execution errors
///
/// These never leave `run`; the orchestrator turns them into structured
/// responses carrying a machine-readable `error_code`.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command timed out after {} seconds", .0.as_secs_f64())]
    Timeout(Duration),

    #[error("Command execution failed: {0}")]
    Spawn(String),
}

impl ExecutionError {
    /// Machine-readable code reported as `error_code`
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionError::Timeout(_) => "TIMEOUT",
            ExecutionError::Spawn(_) => "EXECUTION_ERROR",
        }
    }

    /// Human-oriented category reported as `error_type`
    pub fn kind(&self) -> &'static str {
        match self {
            ExecutionError::Timeout(_) => "timeout",
            ExecutionError::Spawn(_) => "execution_error",
        }
    }
}

impl From<std::io::Error> for ExecutionError {
    fn from(e: std::io::Error) -> Self {
        ExecutionError::Spawn(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = ExecutionError::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Command timed out after 30 seconds");
        assert_eq!(err.code(), "TIMEOUT");
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn test_timeout_message_sub_second() {
        let err = ExecutionError::Timeout(Duration::from_millis(500));
        assert_eq!(err.to_string(), "Command timed out after 0.5 seconds");

        let err = ExecutionError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Command timed out after 1.5 seconds");
    }

    #[test]
    fn test_spawn_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory");
        let err: ExecutionError = io.into();
        assert!(err.to_string().starts_with("Command execution failed"));
        assert_eq!(err.code(), "EXECUTION_ERROR");
    }
}
