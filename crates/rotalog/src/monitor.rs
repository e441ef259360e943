//! Background size monitor that triggers rotation

use crate::logger::{Logger, FATAL_EXIT_CODE};
use crate::Error;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// What the monitor is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Waiting for the next poll
    Idle,
    /// Swapping to a new file
    Rotating,
    /// The task has ended
    Stopped,
}

impl MonitorState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => MonitorState::Idle,
            1 => MonitorState::Rotating,
            _ => MonitorState::Stopped,
        }
    }
}

/// Why the monitor task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorExit {
    /// Stopped through its cancellation token
    Cancelled,
    /// The active file could not be inspected; rotation is disabled but
    /// logging continues on the last file
    StatFailed,
    /// A new file could not be opened and the process was configured not to
    /// exit on fatal errors
    OpenFailed,
}

/// Handle to a running rotation monitor
pub struct RotationMonitor {
    token: CancellationToken,
    state: Arc<AtomicU8>,
    handle: JoinHandle<MonitorExit>,
}

impl RotationMonitor {
    /// Spawn the monitor on the current tokio runtime
    pub fn spawn(logger: Logger) -> Self {
        let token = CancellationToken::new();
        let state = Arc::new(AtomicU8::new(MonitorState::Idle as u8));

        let handle = tokio::spawn(run(logger, token.clone(), Arc::clone(&state)));

        Self {
            token,
            state,
            handle,
        }
    }

    pub fn state(&self) -> MonitorState {
        MonitorState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Token that stops the monitor when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Request a stop without waiting for it
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Stop the monitor and wait for the task to end. If it had already
    /// ended on its own, the original reason is returned.
    pub async fn shutdown(self) -> MonitorExit {
        self.token.cancel();
        self.join().await
    }

    /// Wait for the task to end on its own
    pub async fn join(self) -> MonitorExit {
        match self.handle.await {
            Ok(exit) => exit,
            Err(e) => {
                error!(
                    rotalog.event = "monitor_join_failed",
                    error = %e,
                    "Rotation monitor task failed"
                );
                MonitorExit::Cancelled
            }
        }
    }
}

impl Logger {
    /// Start the background rotation monitor for this logger
    pub fn spawn_monitor(&self) -> RotationMonitor {
        RotationMonitor::spawn(self.clone())
    }
}

async fn run(logger: Logger, token: CancellationToken, state: Arc<AtomicU8>) -> MonitorExit {
    let mut ticker = interval(logger.poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; polls start one period in
    ticker.tick().await;

    info!(
        rotalog.event = "monitor_started",
        poll_interval_ms = logger.poll_interval().as_millis() as u64,
        "Rotation monitor started"
    );

    let exit = loop {
        tokio::select! {
            _ = token.cancelled() => break MonitorExit::Cancelled,
            _ = ticker.tick() => {}
        }

        // Stat, open and the rotation lock all block; keep them off the
        // runtime workers
        let step = {
            let logger = logger.clone();
            let state = Arc::clone(&state);
            tokio::task::spawn_blocking(move || poll_once(&logger, &state))
        };

        match step.await {
            Ok(None) => {}
            Ok(Some(exit)) => break exit,
            Err(e) => {
                error!(
                    rotalog.event = "monitor_poll_failed",
                    error = %e,
                    "Rotation poll task failed"
                );
                break MonitorExit::Cancelled;
            }
        }
    };

    set_state(&state, MonitorState::Stopped);
    info!(
        rotalog.event = "monitor_stopped",
        reason = ?exit,
        "Rotation monitor stopped"
    );

    exit
}

fn set_state(state: &AtomicU8, value: MonitorState) {
    state.store(value as u8, Ordering::Release);
}

/// One blocking poll step. Returns the exit reason when the monitor has to
/// stop.
fn poll_once(logger: &Logger, state: &AtomicU8) -> Option<MonitorExit> {
    let result = logger.check_rotation_with(|| set_state(state, MonitorState::Rotating));
    set_state(state, MonitorState::Idle);

    match result {
        Ok(_) => None,
        Err(e @ Error::Stat { .. }) => {
            logger.report_error(format!("rotation monitor stopped: {}", e));
            error!(
                rotalog.event = "monitor_stat_failed",
                file = %logger.active_file().display(),
                error = %e,
                "Cannot inspect active log file; rotation disabled"
            );
            Some(MonitorExit::StatFailed)
        }
        Err(e) => {
            logger.report_error(format!("log rotation failed: {}", e));
            error!(
                rotalog.event = "rotation_failed",
                error = %e,
                "Cannot open a new log file"
            );
            if logger.exits_on_error() {
                std::process::exit(FATAL_EXIT_CODE);
            }
            Some(MonitorExit::OpenFailed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerConfig;
    use std::time::Duration;
    use tempfile::TempDir;
    use tokio::time::{sleep, timeout};

    fn quiet_config(dir: &std::path::Path) -> LoggerConfig {
        LoggerConfig {
            log_dir: dir.to_path_buf(),
            console_echo: false,
            poll_interval_ms: 20,
            exit_on_error: false,
            ..LoggerConfig::default()
        }
    }

    async fn wait_for<F: Fn() -> bool>(condition: F) {
        timeout(Duration::from_secs(5), async {
            while !condition() {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_monitor_rotates_when_over_limit() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::open(quiet_config(temp_dir.path())).unwrap();
        logger.set_max_file_size_bytes(64);

        let first = logger.active_file();
        let monitor = logger.spawn_monitor();
        assert_eq!(monitor.state(), MonitorState::Idle);

        logger.info("x".repeat(100));
        wait_for(|| logger.active_file() != first).await;

        let second = logger.active_file();
        assert!(second.file_name().unwrap() > first.file_name().unwrap());

        assert_eq!(monitor.shutdown().await, MonitorExit::Cancelled);
    }

    #[tokio::test]
    async fn test_monitor_leaves_small_file_alone() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::open(quiet_config(temp_dir.path())).unwrap();
        let first = logger.active_file();

        let monitor = logger.spawn_monitor();
        logger.info("small");
        sleep(Duration::from_millis(100)).await;

        assert_eq!(logger.active_file(), first);
        assert!(!monitor.is_finished());
        assert_eq!(monitor.shutdown().await, MonitorExit::Cancelled);
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "windows",
        ignore = "open files cannot be removed on Windows"
    )]
    async fn test_monitor_stops_when_file_disappears() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::open(quiet_config(temp_dir.path())).unwrap();
        let active = logger.active_file();

        let monitor = logger.spawn_monitor();
        std::fs::remove_file(&active).unwrap();

        let exit = timeout(Duration::from_secs(5), monitor.join())
            .await
            .unwrap();
        assert_eq!(exit, MonitorExit::StatFailed);

        // Logging still goes to the last handle without terminating
        logger.warn("still alive");
        assert_eq!(logger.active_file(), active);
    }

    #[tokio::test]
    async fn test_cancelled_monitor_reports_stopped() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::open(quiet_config(temp_dir.path())).unwrap();

        let monitor = logger.spawn_monitor();
        let token = monitor.cancellation_token();
        token.cancel();

        wait_for(|| monitor.is_finished()).await;
        assert_eq!(monitor.state(), MonitorState::Stopped);
        assert_eq!(monitor.join().await, MonitorExit::Cancelled);
    }

    #[tokio::test]
    async fn test_monitor_stops_when_new_file_cannot_open() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::open(quiet_config(temp_dir.path())).unwrap();
        let active = logger.active_file();

        let blocker = temp_dir.path().join("not_a_dir");
        std::fs::write(&blocker, b"regular file").unwrap();
        logger.set_log_dir(blocker.join("logs"));
        logger.set_max_file_size_bytes(1);
        logger.info("over the limit");

        let monitor = logger.spawn_monitor();
        let exit = timeout(Duration::from_secs(5), monitor.join())
            .await
            .unwrap();
        assert_eq!(exit, MonitorExit::OpenFailed);

        // The failure is reported on the file that stayed active
        assert_eq!(logger.active_file(), active);
        let content = std::fs::read_to_string(&active).unwrap();
        assert!(content.contains("[ERROR] log rotation failed: "));
    }

    #[test]
    fn test_poll_step_rotates_once_over_limit() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::open(quiet_config(temp_dir.path())).unwrap();
        let state = AtomicU8::new(MonitorState::Idle as u8);
        let first = logger.active_file();

        logger.info("small");
        assert_eq!(poll_once(&logger, &state), None);
        assert_eq!(logger.active_file(), first);

        logger.set_max_file_size_bytes(1);
        assert_eq!(poll_once(&logger, &state), None);
        assert_ne!(logger.active_file(), first);
        assert_eq!(
            MonitorState::from_u8(state.load(Ordering::Acquire)),
            MonitorState::Idle
        );
    }

    #[test]
    fn test_rotation_hook_runs_only_when_rotating() {
        let temp_dir = TempDir::new().unwrap();
        let logger = Logger::open(quiet_config(temp_dir.path())).unwrap();
        logger.info("small");

        let mut calls = 0;
        assert_eq!(logger.check_rotation_with(|| calls += 1).unwrap(), None);
        assert_eq!(calls, 0);

        logger.set_max_file_size_bytes(1);
        assert!(logger.check_rotation_with(|| calls += 1).unwrap().is_some());
        assert_eq!(calls, 1);
    }
}
