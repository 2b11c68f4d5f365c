//! Configuration management for smcp-vcs
//!
//! Handles loading and merging configuration from multiple sources:
//! 1. Compiled defaults
//! 2. User config (~/.smcp-vcs/config.toml)
//! 3. CLI-specified config file
//! 4. Environment variables

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub execution: ExecutionConfig,
    pub audit: AuditConfig,
}

/// Subprocess execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Timeout for a single tool invocation, in seconds
    pub timeout: u64,
}

/// Audit trail settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Record executed commands as JSON lines
    pub enabled: bool,
    /// Log file path
    pub path: PathBuf,
    /// Redact secrets from logged commands and output
    pub redact_secrets: bool,
    /// Maximum log file size before rotation
    pub max_log_size: u64,
    /// Number of rotated logs to keep
    pub log_retention: u32,
}

/// One config file as written, with only the keys it actually sets
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigLayer {
    execution: ExecutionLayer,
    audit: AuditLayer,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExecutionLayer {
    timeout: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AuditLayer {
    enabled: Option<bool>,
    path: Option<PathBuf>,
    redact_secrets: Option<bool>,
    max_log_size: Option<u64>,
    log_retention: Option<u32>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self { timeout: 30 }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            enabled: false,
            path: home.join(".smcp-vcs/logs/commands.log"),
            redact_secrets: true,
            max_log_size: 10 * 1024 * 1024, // 10MB
            log_retention: 5,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load(cli_config: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".smcp-vcs/config.toml");
            if user_config.exists() {
                debug!("Loading user config from {:?}", user_config);
                config.merge_from_file(&user_config)?;
            }
        }

        if let Some(path) = cli_config {
            debug!("Loading CLI config from {:?}", path);
            config.merge_from_file(path)?;
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Merge configuration from a file
    fn merge_from_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Read(format!("{}: {}", path.display(), e)))?;

        let layer: ConfigLayer = toml::from_str(&contents)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;

        self.merge(layer);
        Ok(())
    }

    /// Apply every key the layer sets; unset keys keep their current value
    fn merge(&mut self, layer: ConfigLayer) {
        let ConfigLayer { execution, audit } = layer;

        if let Some(timeout) = execution.timeout {
            self.execution.timeout = timeout;
        }

        if let Some(enabled) = audit.enabled {
            self.audit.enabled = enabled;
        }
        if let Some(path) = audit.path {
            self.audit.path = path;
        }
        if let Some(redact) = audit.redact_secrets {
            self.audit.redact_secrets = redact;
        }
        if let Some(size) = audit.max_log_size {
            self.audit.max_log_size = size;
        }
        if let Some(retention) = audit.log_retention {
            self.audit.log_retention = retention;
        }
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(timeout) = std::env::var("SMCP_VCS_TIMEOUT") {
            match timeout.parse() {
                Ok(secs) => self.execution.timeout = secs,
                Err(_) => debug!("Ignoring non-numeric SMCP_VCS_TIMEOUT: {}", timeout),
            }
        }
        if let Ok(log) = std::env::var("SMCP_VCS_AUDIT_LOG") {
            self.audit.enabled = true;
            self.audit.path = PathBuf::from(log);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.execution.timeout == 0 {
            return Err(ConfigError::Invalid(
                "execution.timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Timeout applied to each tool invocation
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.execution.timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.execution.timeout, 30);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(!config.audit.enabled);
        assert!(config.audit.redact_secrets);
    }

    #[test]
    fn test_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_invalid() {
        let mut config = Config::default();
        config.execution.timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
            [execution]
            timeout = 120

            [audit]
            enabled = true
            path = "/tmp/smcp-vcs.log"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.execution.timeout, 120);
        assert!(config.audit.enabled);
        assert_eq!(config.audit.path, PathBuf::from("/tmp/smcp-vcs.log"));
        assert!(config.audit.redact_secrets);
    }

    #[test]
    fn test_merge_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[execution]\ntimeout = 5\n").unwrap();

        let mut config = Config::default();
        config.merge_from_file(&path).unwrap();
        assert_eq!(config.execution.timeout, 5);
        assert!(!config.audit.enabled);
    }

    #[test]
    fn test_later_file_overrides_with_default_value() {
        let temp_dir = TempDir::new().unwrap();
        let user = temp_dir.path().join("user.toml");
        let cli = temp_dir.path().join("cli.toml");
        std::fs::write(&user, "[execution]\ntimeout = 90\n\n[audit]\nenabled = true\n").unwrap();
        std::fs::write(&cli, "[execution]\ntimeout = 30\n").unwrap();

        let mut config = Config::default();
        config.merge_from_file(&user).unwrap();
        config.merge_from_file(&cli).unwrap();

        assert_eq!(config.execution.timeout, 30);
        assert!(config.audit.enabled);
    }

    #[test]
    fn test_later_file_can_disable_audit() {
        let temp_dir = TempDir::new().unwrap();
        let user = temp_dir.path().join("user.toml");
        let cli = temp_dir.path().join("cli.toml");
        std::fs::write(&user, "[audit]\nenabled = true\nredact_secrets = false\nlog_retention = 2\n").unwrap();
        std::fs::write(&cli, "[audit]\nenabled = false\n").unwrap();

        let mut config = Config::default();
        config.merge_from_file(&user).unwrap();
        config.merge_from_file(&cli).unwrap();

        assert!(!config.audit.enabled);
        assert!(!config.audit.redact_secrets);
        assert_eq!(config.audit.log_retention, 2);
        assert_eq!(config.execution.timeout, 30);
    }

    #[test]
    fn test_merge_from_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[execution\ntimeout = ").unwrap();

        let mut config = Config::default();
        let err = config.merge_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_merge_missing_file() {
        let mut config = Config::default();
        let err = config
            .merge_from_file(Path::new("/nonexistent/smcp-vcs/config.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
