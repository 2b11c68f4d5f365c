//! Audit trail for executed commands
//!
//! Appends one JSON line per executed run so what was sent to gh or git
//! can be reviewed later. Dry runs are not recorded.

use crate::config::AuditConfig;
use crate::plugins::protocol::{RunOptions, RunResponse};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Identifies every entry written by this process
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Secret patterns for redaction
static SECRET_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        // GitHub tokens
        Regex::new(r"\b(?:gh[pousr]_[A-Za-z0-9]{20,}|github_pat_[A-Za-z0-9_]{20,})").unwrap(),
        // key=value and key: value secrets
        Regex::new(
            r#"(?i)(api[_-]?key|token|secret|password|passwd|pwd)\s*[=:]\s*['"]?([^'"\s]+)['"]?"#,
        )
        .unwrap(),
        // Bearer tokens
        Regex::new(r"(?i)bearer\s+[a-zA-Z0-9._-]+").unwrap(),
        // Credentials embedded in remote URLs
        Regex::new(r"(https?://)[^/\s:@]+:[^/\s@]+@").unwrap(),
        // Private keys
        Regex::new(r"-----BEGIN\s+(?:RSA\s+|OPENSSH\s+)?PRIVATE\s+KEY-----").unwrap(),
    ]
});

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Idempotent,
    Failure,
    Error,
}

impl Outcome {
    fn of(response: &RunResponse) -> Self {
        if response.error_code.is_some() {
            Outcome::Error
        } else if response.idempotent == Some(true) {
            Outcome::Idempotent
        } else if response.success == Some(true) {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

/// Log entry structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    /// Wrapped tool, `gh` or `git`
    pub plugin: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    pub outcome: Outcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Appends run records to the configured log file
pub struct AuditLogger {
    config: AuditConfig,
    log_file: Option<BufWriter<File>>,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(config: AuditConfig) -> Self {
        let log_file = if config.enabled {
            Self::open_log_file(&config.path)
        } else {
            None
        };

        Self { config, log_file }
    }

    /// Open or create the log file
    fn open_log_file(path: &Path) -> Option<BufWriter<File>> {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create log directory: {}", e);
                return None;
            }
        }

        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(BufWriter::new(file)),
            Err(e) => {
                error!("Failed to open log file {:?}: {}", path, e);
                None
            }
        }
    }

    /// Record a run
    ///
    /// Dry runs are skipped, including ones rejected before the dry-run
    /// branch was reached.
    pub fn log_run(&mut self, plugin: &str, options: &RunOptions, response: &RunResponse) {
        if !self.config.enabled || options.dry_run || response.dry_run == Some(true) {
            return;
        }

        let entry = LogEntry {
            session_id: SESSION_ID.clone(),
            timestamp: Utc::now(),
            plugin: plugin.to_string(),
            command: self.redact_if_needed(response.command.as_deref().unwrap_or(plugin)),
            cwd: response
                .cwd
                .clone()
                .or_else(|| response.command_context.as_ref().map(|c| c.cwd.clone())),
            outcome: Outcome::of(response),
            return_code: response.return_code,
            error: response.error.as_deref().map(|e| self.redact_if_needed(e)),
            stdout_preview: self.preview(response.stdout.as_deref()),
            stderr_preview: self.preview(response.stderr.as_deref()),
            duration_ms: response.elapsed.map(|secs| (secs * 1000.0) as u64),
        };

        self.maybe_rotate();
        self.write_entry(&entry);
    }

    fn preview(&self, text: Option<&str>) -> Option<String> {
        text.filter(|t| !t.is_empty())
            .map(|t| truncate_preview(&self.redact_if_needed(t)))
    }

    /// Write a log entry
    fn write_entry(&mut self, entry: &LogEntry) {
        if let Some(ref mut file) = self.log_file {
            match serde_json::to_string(entry) {
                Ok(json) => {
                    if let Err(e) = writeln!(file, "{}", json) {
                        error!("Failed to write log entry: {}", e);
                    }
                    if let Err(e) = file.flush() {
                        warn!("Failed to flush log file: {}", e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize log entry: {}", e);
                }
            }
        }
    }

    /// Redact secrets from text if configured
    fn redact_if_needed(&self, text: &str) -> String {
        if self.config.redact_secrets {
            redact_secrets(text)
        } else {
            text.to_string()
        }
    }

    /// Rotate log file if it has outgrown `max_log_size`
    pub fn maybe_rotate(&mut self) {
        if !self.config.enabled {
            return;
        }

        if let Ok(metadata) = fs::metadata(&self.config.path) {
            if metadata.len() > self.config.max_log_size {
                self.rotate_logs();
            }
        }
    }

    /// Shift `log.N` to `log.N+1` and start a fresh file
    fn rotate_logs(&mut self) {
        let path = self.config.path.clone();
        debug!("Rotating log files");

        self.log_file = None;

        for i in (1..self.config.log_retention).rev() {
            let old = format!("{}.{}", path.display(), i);
            let new = format!("{}.{}", path.display(), i + 1);
            let _ = fs::rename(&old, &new);
        }

        let rotated = format!("{}.1", path.display());
        let _ = fs::rename(&path, &rotated);

        self.log_file = Self::open_log_file(&path);
    }

    /// Get session ID
    pub fn session_id() -> &'static str {
        &SESSION_ID
    }
}

/// Redact secrets from text
pub fn redact_secrets(text: &str) -> String {
    let mut result = text.to_string();

    for pattern in SECRET_PATTERNS.iter() {
        result = pattern.replace_all(&result, "[REDACTED]").to_string();
    }

    result
}

/// Truncate text for preview
fn truncate_preview(text: &str) -> String {
    const MAX_PREVIEW: usize = 500;
    match text.char_indices().nth(MAX_PREVIEW) {
        Some((cut, _)) => format!("{}...[truncated]", &text[..cut]),
        None => text.to_string(),
    }
}
