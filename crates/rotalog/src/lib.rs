//! # Rotalog
//!
//! Leveled logger writing to append-only, size-rotated files with optional
//! console echo.
//!
//! ## Features
//!
//! - **Four channels**: `INFO`, `WARN`, `DEBUG` gated by a threshold, and
//!   `ERROR`, which always emits and then ends the process
//! - **Size rotation**: a background monitor polls the active file and swaps
//!   to a fresh timestamp-named file once it reaches the limit
//! - **Safe under concurrency**: every line is written whole, and rotation
//!   publishes the new channel set in one step
//! - **Runtime settings**: threshold, console echo, directory, size limit and
//!   caller location can change at any time
//! - **tracing bridge**: route `tracing` events into the same files
//!
//! ## Quick Start
//!
//! ```no_run
//! use rotalog::{log_info, LoggerConfig, LoggingSystem};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let guard = LoggingSystem::init(LoggerConfig::default()).await?;
//!     let logger = guard.logger();
//!
//!     log_info!(logger, "listening on port", 8080);
//!     logger.set_threshold("debug");
//!     logger.debug("verbose output enabled");
//!
//!     guard.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod bridge;
pub mod channels;
pub mod config;
pub mod filters;
pub mod level;
pub mod logger;
pub mod monitor;
pub mod naming;
pub mod rotation;
pub mod sink;
pub mod system;

#[macro_use]
mod macros;


pub use bridge::RotatingMakeWriter;
pub use config::LoggerConfig;
pub use filters::SelfEventFilter;
pub use level::{Severity, Threshold};
pub use logger::{join_args, Logger};
pub use monitor::{MonitorExit, MonitorState, RotationMonitor};
pub use naming::{Clock, SystemClock, TimeNamer};
pub use system::{LoggingGuard, LoggingSystem};

use std::path::PathBuf;

/// Result type for logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Logger errors
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to open log file {}: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to stat log file {}: {source}", path.display())]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Logging system error: {message}")]
    System { message: String },
}
