//! Basic logger usage example
//!
//! Writes enough lines to force a couple of rotations, routes `tracing`
//! output into the same files, then shuts down cleanly.
//!
//! Run with: cargo run -p rotalog --example basic_usage

use rotalog::{log_debug, log_info, log_warn, LoggerConfig, LoggingSystem, SelfEventFilter};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut config = LoggerConfig::default();
    config.log_dir = PathBuf::from("./example_logs");
    config.max_file_size_mb = 1;
    config.console_echo = false;
    config.exit_on_error = false;
    config.load_env_overrides();

    let guard = match LoggingSystem::init(config).await {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to start logging: {}", e);
            std::process::exit(1);
        }
    };
    let logger = guard.logger().clone();

    // Application tracing events go to the rotating files; the logger's own
    // lifecycle events go to stderr, filtered by RUST_LOG
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(logger.make_writer())
                .with_ansi(false)
                .with_filter(SelfEventFilter::new()),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::new(
                    std::env::var("RUST_LOG").unwrap_or_else(|_| "rotalog=info".to_string()),
                )),
        )
        .try_init()?;

    log_info!(logger, "example started, writing to", logger.active_file().display());
    tracing::info!(target: "basic_usage", component = "demo", "tracing bridge active");

    logger.set_threshold("debug");
    let payload = "x".repeat(512);
    for i in 0..6000 {
        log_debug!(logger, "line", i, payload);
        if i % 1000 == 0 {
            // Give the monitor a chance to poll
            sleep(Duration::from_millis(1100)).await;
        }
    }

    logger.set_threshold("nonsense");
    log_warn!(logger, "threshold is still", logger.threshold());

    for file in logger.log_files()? {
        println!("{} ({} bytes)", file.path.display(), file.size);
    }

    if let Some(exit) = guard.shutdown().await {
        println!("rotation monitor stopped: {:?}", exit);
    }

    Ok(())
}
