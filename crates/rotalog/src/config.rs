//! Logger configuration and management

use crate::level::Threshold;
use crate::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_LOG_DIR: &str = "logs/";
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Main logger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Directory holding the log files
    pub log_dir: PathBuf,

    /// Echo every line to standard output as well
    pub console_echo: bool,

    /// Highest severity rank that is emitted (INFO, WARN, DEBUG)
    pub level: Threshold,

    /// Size at which the active file is rotated (in MB)
    pub max_file_size_mb: u64,

    /// Zero omits the caller location from lines; any positive value adds it
    pub call_depth: u32,

    /// Period of the rotation monitor's size check (in milliseconds)
    pub poll_interval_ms: u64,

    /// Terminate the process with status 1 after an ERROR line
    pub exit_on_error: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            console_echo: true,
            level: Threshold::Info,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            call_depth: 0,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            exit_on_error: true,
        }
    }
}

impl LoggerConfig {
    /// Load configuration from file or create default
    pub async fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        let mut config = if config_file.exists() {
            let content = tokio::fs::read_to_string(&config_file).await?;
            toml::from_str(&content).map_err(|e| Error::Config {
                message: format!("Failed to parse logger config: {}", e),
            })?
        } else {
            Self::default()
        };

        config.load_env_overrides();
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, config_path: Option<&Path>) -> Result<()> {
        let config_file = match config_path {
            Some(path) => path.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if let Some(parent) = config_file.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| Error::Config {
            message: format!("Failed to serialize logger config: {}", e),
        })?;

        tokio::fs::write(&config_file, content).await?;
        Ok(())
    }

    /// Load environment variable overrides. Values that do not parse are
    /// ignored.
    pub fn load_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("ROTALOG_LOG_DIR") {
            if !dir.is_empty() {
                self.log_dir = PathBuf::from(dir);
            }
        }

        if let Ok(echo) = std::env::var("ROTALOG_CONSOLE_ECHO") {
            self.console_echo = echo.parse().unwrap_or(self.console_echo);
        }

        if let Ok(level) = std::env::var("ROTALOG_LOG_LEVEL") {
            self.level = Threshold::from_name(&level).unwrap_or(self.level);
        }

        if let Ok(size) = std::env::var("ROTALOG_MAX_FILE_SIZE_MB") {
            self.max_file_size_mb = size.parse().unwrap_or(self.max_file_size_mb);
        }

        if let Ok(depth) = std::env::var("ROTALOG_CALL_DEPTH") {
            self.call_depth = depth.parse().unwrap_or(self.call_depth);
        }
    }

    /// Get default configuration file path
    fn default_config_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("dev", "rotalog", "rotalog").ok_or_else(|| Error::Config {
                message: "Could not determine config directory".to_string(),
            })?;

        Ok(project_dirs.config_dir().join("rotalog.toml"))
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        mb_to_bytes(self.max_file_size_mb)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size_mb == 0 {
            return Err(Error::Config {
                message: "max_file_size_mb must be greater than 0".to_string(),
            });
        }

        if self.poll_interval_ms == 0 {
            return Err(Error::Config {
                message: "poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.log_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "log_dir must not be empty".to_string(),
            });
        }

        if self.log_dir.exists() && !self.log_dir.is_dir() {
            return Err(Error::Config {
                message: format!("log_dir {} is not a directory", self.log_dir.display()),
            });
        }

        Ok(())
    }
}

pub(crate) fn mb_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();

        assert_eq!(config.log_dir, PathBuf::from("logs/"));
        assert!(config.console_echo);
        assert_eq!(config.level, Threshold::Info);
        assert_eq!(config.max_file_size_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert!(config.exit_on_error);
    }

    #[test]
    fn test_config_serialization() {
        let config = LoggerConfig {
            level: Threshold::Debug,
            call_depth: 2,
            ..LoggerConfig::default()
        };
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: LoggerConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: LoggerConfig = toml::from_str("level = \"WARN\"\n").unwrap();

        assert_eq!(config.level, Threshold::Warn);
        assert_eq!(config.max_file_size_mb, DEFAULT_MAX_FILE_SIZE_MB);
        assert_eq!(config.log_dir, PathBuf::from(DEFAULT_LOG_DIR));
    }

    #[tokio::test]
    #[serial]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("rotalog.toml");

        let original = LoggerConfig {
            log_dir: temp_dir.path().join("logs"),
            console_echo: false,
            max_file_size_mb: 3,
            ..LoggerConfig::default()
        };
        original.save(Some(&config_path)).await.unwrap();

        let loaded = LoggerConfig::load(Some(&config_path)).await.unwrap();
        assert_eq!(original, loaded);
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        tokio::fs::write(&config_path, "max_file_size_mb = \"lots\"")
            .await
            .unwrap();

        let err = LoggerConfig::load(Some(&config_path)).await.unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("ROTALOG_LOG_LEVEL", "debug");
        std::env::set_var("ROTALOG_CONSOLE_ECHO", "false");
        std::env::set_var("ROTALOG_MAX_FILE_SIZE_MB", "not-a-number");

        let mut config = LoggerConfig::default();
        config.load_env_overrides();

        assert_eq!(config.level, Threshold::Debug);
        assert!(!config.console_echo);
        assert_eq!(config.max_file_size_mb, DEFAULT_MAX_FILE_SIZE_MB);

        std::env::remove_var("ROTALOG_LOG_LEVEL");
        std::env::remove_var("ROTALOG_CONSOLE_ECHO");
        std::env::remove_var("ROTALOG_MAX_FILE_SIZE_MB");
    }

    #[test]
    #[serial]
    fn test_env_unknown_level_is_ignored() {
        std::env::set_var("ROTALOG_LOG_LEVEL", "banana");

        let mut config = LoggerConfig {
            level: Threshold::Warn,
            ..LoggerConfig::default()
        };
        config.load_env_overrides();

        assert_eq!(config.level, Threshold::Warn);

        std::env::remove_var("ROTALOG_LOG_LEVEL");
    }

    #[test]
    fn test_config_validation() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = LoggerConfig {
            log_dir: temp_dir.path().to_path_buf(),
            ..LoggerConfig::default()
        };
        assert!(config.validate().is_ok());

        config.max_file_size_mb = 0;
        assert!(config.validate().is_err());

        config.max_file_size_mb = 1;
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        config.poll_interval_ms = 10;
        let file = temp_dir.path().join("file");
        std::fs::write(&file, "x").unwrap();
        config.log_dir = file;
        assert!(config.validate().is_err());
    }
}
