//! Logging system bootstrap

use crate::{
    config::LoggerConfig,
    logger::Logger,
    monitor::{MonitorExit, RotationMonitor},
    Result,
};

/// Entry point that wires a logger to its rotation monitor
pub struct LoggingSystem;

/// Keeps the rotation monitor alive. Dropping the guard cancels the monitor;
/// [`LoggingGuard::shutdown`] also waits for it.
pub struct LoggingGuard {
    logger: Logger,
    monitor: Option<RotationMonitor>,
}

impl LoggingSystem {
    /// Validate `config`, open the first log file and start the monitor.
    /// Must be called from within a tokio runtime.
    pub async fn init(config: LoggerConfig) -> Result<LoggingGuard> {
        config.validate()?;

        let logger = Logger::open(config)?;
        let monitor = logger.spawn_monitor();

        tracing::info!(
            rotalog.event = "system_initialized",
            rotalog.version = env!("CARGO_PKG_VERSION"),
            "Logging system initialized"
        );

        Ok(LoggingGuard {
            logger,
            monitor: Some(monitor),
        })
    }

    /// Load configuration (file, then environment overrides) and initialize
    pub async fn init_from_file(config_path: Option<&std::path::Path>) -> Result<LoggingGuard> {
        let config = LoggerConfig::load(config_path).await?;
        Self::init(config).await
    }
}

impl LoggingGuard {
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Whether the rotation monitor is still polling
    pub fn monitor_running(&self) -> bool {
        self.monitor
            .as_ref()
            .map(|monitor| !monitor.is_finished())
            .unwrap_or(false)
    }

    /// Stop the rotation monitor and wait for it. The logger stays usable.
    pub async fn shutdown(mut self) -> Option<MonitorExit> {
        match self.monitor.take() {
            Some(monitor) => Some(monitor.shutdown().await),
            None => None,
        }
    }
}

impl std::ops::Deref for LoggingGuard {
    type Target = Logger;

    fn deref(&self) -> &Logger {
        &self.logger
    }
}

impl Drop for LoggingGuard {
    fn drop(&mut self) {
        if let Some(monitor) = self.monitor.take() {
            monitor.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use tempfile::TempDir;

    fn config_in(dir: &std::path::Path) -> LoggerConfig {
        LoggerConfig {
            log_dir: dir.to_path_buf(),
            console_echo: false,
            poll_interval_ms: 20,
            exit_on_error: false,
            ..LoggerConfig::default()
        }
    }

    #[tokio::test]
    async fn test_logging_init() {
        let temp_dir = TempDir::new().unwrap();
        let guard = LoggingSystem::init(config_in(temp_dir.path())).await.unwrap();

        guard.info("Test log message");
        guard.logger().warn("Test warning");

        let files = guard.log_files().unwrap();
        assert_eq!(files.len(), 1);

        assert!(guard.monitor_running());
        assert_eq!(guard.shutdown().await, Some(MonitorExit::Cancelled));
    }

    #[tokio::test]
    async fn test_init_rejects_invalid_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = config_in(temp_dir.path());
        config.max_file_size_mb = 0;

        let err = LoggingSystem::init(config).await.err().unwrap();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_dropped_guard_cancels_monitor() {
        let temp_dir = TempDir::new().unwrap();
        let guard = LoggingSystem::init(config_in(temp_dir.path())).await.unwrap();
        let logger = guard.logger().clone();
        drop(guard);

        // Logger handles outlive the guard
        logger.info("after guard");
        let content = std::fs::read_to_string(logger.active_file()).unwrap();
        assert!(content.contains("[INFO]  after guard"));
    }
}
