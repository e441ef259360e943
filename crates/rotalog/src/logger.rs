//! Shared logger handle: level dispatch, runtime settings and rotation

use crate::channels::Channels;
use crate::config::{mb_to_bytes, LoggerConfig};
use crate::level::{Severity, Threshold};
use crate::naming::{Clock, SystemClock, TimeNamer};
use crate::rotation::{LogFileManager, Rotated};
use crate::sink::Console;
use crate::Result;
use std::fmt;
use std::panic::Location;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

/// Exit status used for fatal conditions
pub const FATAL_EXIT_CODE: i32 = 1;

/// Cheaply cloneable handle to one logger. All clones write through the same
/// channel set and observe the same settings.
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

struct Inner {
    /// Published logger set of the current epoch
    channels: RwLock<Arc<Channels>>,
    /// Owner of the active file; also serializes rotations
    files: Mutex<LogFileManager>,
    namer: TimeNamer,
    console: Console,
    log_dir: RwLock<PathBuf>,
    threshold: AtomicU8,
    console_echo: AtomicBool,
    max_file_size: AtomicU64,
    call_depth: AtomicU32,
    poll_interval: Duration,
    exit_on_error: bool,
}

impl Logger {
    /// Create the log directory and the first file, and build the channels
    pub fn open(config: LoggerConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`Logger::open`] with an explicit clock for names and timestamps
    pub fn with_clock(config: LoggerConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Self::build(config, clock, Console::Stdout)
    }

    pub(crate) fn build(
        config: LoggerConfig,
        clock: Arc<dyn Clock>,
        console: Console,
    ) -> Result<Self> {
        let namer = TimeNamer::new(clock);
        let mut files = LogFileManager::new();

        let name = namer.next_name(None);
        let rotated = files.rotate(&config.log_dir, &name)?;
        let echo = config.console_echo.then(|| console.clone());
        let channels = Channels::build(rotated.current, echo);

        let logger = Self {
            inner: Arc::new(Inner {
                channels: RwLock::new(Arc::new(channels)),
                files: Mutex::new(files),
                namer,
                console,
                log_dir: RwLock::new(config.log_dir.clone()),
                threshold: AtomicU8::new(config.level.rank()),
                console_echo: AtomicBool::new(config.console_echo),
                max_file_size: AtomicU64::new(config.max_file_size_bytes()),
                call_depth: AtomicU32::new(config.call_depth),
                poll_interval: config.poll_interval(),
                exit_on_error: config.exit_on_error,
            }),
        };

        tracing::info!(
            rotalog.event = "logger_opened",
            log_dir = %config.log_dir.display(),
            file = %logger.active_file().display(),
            level = %config.level,
            console_echo = config.console_echo,
            max_file_size_mb = config.max_file_size_mb,
            "Logger opened"
        );

        Ok(logger)
    }

    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.emit(Severity::Info, message, Location::caller());
    }

    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        self.emit(Severity::Warn, message, Location::caller());
    }

    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        self.emit(Severity::Debug, message, Location::caller());
    }

    /// Write an ERROR line. Unless `exit_on_error` was turned off, the
    /// process then exits with status 1.
    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        self.emit(Severity::Error, message, Location::caller());

        if self.inner.exit_on_error {
            std::process::exit(FATAL_EXIT_CODE);
        }
    }

    /// Write one line at `severity` if the threshold lets it through.
    /// Returns whether the line was emitted. Never terminates the process.
    pub fn emit(
        &self,
        severity: Severity,
        message: impl fmt::Display,
        location: &Location<'_>,
    ) -> bool {
        if !self.threshold().allows(severity) {
            return false;
        }

        let location = (self.call_depth() > 0).then_some(location);
        let now = self.inner.namer.clock().now();
        let message = message.to_string();

        let channels = self.channels();
        if let Err(e) = channels.get(severity).output(now, location, &message) {
            tracing::warn!(
                rotalog.event = "write_failed",
                file = %channels.file().path().display(),
                error = %e,
                "Failed to write log line"
            );
        }

        true
    }

    /// Snapshot of the current epoch's channels. A rotation never changes a
    /// snapshot already taken.
    pub fn channels(&self) -> Arc<Channels> {
        let channels = self
            .inner
            .channels
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&channels)
    }

    /// Path of the file currently receiving writes
    pub fn active_file(&self) -> PathBuf {
        self.channels().file().path().to_path_buf()
    }

    pub fn threshold(&self) -> Threshold {
        Threshold::from_rank(self.inner.threshold.load(Ordering::Acquire))
    }

    /// Set the threshold by name (DEBUG, WARN or INFO, any case). Other
    /// names are ignored and leave the threshold unchanged.
    pub fn set_threshold(&self, name: &str) {
        match Threshold::from_name(name) {
            Some(threshold) => {
                self.inner
                    .threshold
                    .store(threshold.rank(), Ordering::Release);
                tracing::debug!(
                    rotalog.event = "threshold_changed",
                    level = %threshold,
                    "Log threshold changed"
                );
            }
            None => {
                tracing::debug!(
                    rotalog.event = "threshold_unchanged",
                    requested = name,
                    level = %self.threshold(),
                    "Unrecognized threshold name ignored"
                );
            }
        }
    }

    pub fn console_echo(&self) -> bool {
        self.inner.console_echo.load(Ordering::Acquire)
    }

    /// Turn console echo on or off starting with the next write. The channel
    /// set is rebuilt over the same file.
    pub fn set_console_echo(&self, enabled: bool) {
        let files = self.lock_files();
        self.inner.console_echo.store(enabled, Ordering::Release);

        if let Some(current) = files.current() {
            let echo = enabled.then(|| self.inner.console.clone());
            self.publish(Channels::build(Arc::clone(current), echo));
        }
    }

    pub fn log_dir(&self) -> PathBuf {
        self.inner
            .log_dir
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Directory for files opened by later rotations; the active file stays
    /// where it is.
    pub fn set_log_dir(&self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        *self
            .inner
            .log_dir
            .write()
            .unwrap_or_else(PoisonError::into_inner) = dir;
    }

    pub fn max_file_size(&self) -> u64 {
        self.inner.max_file_size.load(Ordering::Acquire)
    }

    pub fn set_max_file_size_mb(&self, mb: u64) {
        self.set_max_file_size_bytes(mb_to_bytes(mb));
    }

    pub fn set_max_file_size_bytes(&self, bytes: u64) {
        self.inner.max_file_size.store(bytes, Ordering::Release);
    }

    pub fn call_depth(&self) -> u32 {
        self.inner.call_depth.load(Ordering::Acquire)
    }

    /// Caller locations are resolved with `#[track_caller]`, so only zero or
    /// non-zero matters: `0` writes no location, any other value writes the
    /// `file:line` of the code that called the level method or macro.
    pub fn set_call_depth(&self, depth: u32) {
        self.inner.call_depth.store(depth, Ordering::Release);
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    pub fn exits_on_error(&self) -> bool {
        self.inner.exit_on_error
    }

    /// Size of the active file has reached the limit. Fails if the file can
    /// no longer be found on disk.
    pub fn needs_rotation(&self) -> Result<bool> {
        let size = self.channels().file().size_on_disk()?;
        Ok(size >= self.max_file_size())
    }

    /// One poll step: rotate if the active file is over the limit. Returns
    /// the new file's path when a rotation happened.
    pub fn check_rotation(&self) -> Result<Option<PathBuf>> {
        self.check_rotation_with(|| {})
    }

    /// [`Logger::check_rotation`] with a hook that runs once the size check
    /// has decided to rotate, before the new file is opened. The size is
    /// looked up once per call.
    pub(crate) fn check_rotation_with(
        &self,
        before_rotate: impl FnOnce(),
    ) -> Result<Option<PathBuf>> {
        let mut files = self.lock_files();

        let current = match files.current() {
            Some(current) => Arc::clone(current),
            None => return Ok(None),
        };
        if current.size_on_disk()? < self.max_file_size() {
            return Ok(None);
        }

        before_rotate();
        self.rotate_locked(&mut files).map(Some)
    }

    /// Switch to a fresh file unconditionally and return its path
    pub fn rotate_now(&self) -> Result<PathBuf> {
        let mut files = self.lock_files();
        self.rotate_locked(&mut files)
    }

    fn rotate_locked(&self, files: &mut LogFileManager) -> Result<PathBuf> {
        let dir = self.log_dir();
        let name = self
            .inner
            .namer
            .next_name(files.current().map(|current| current.name()));

        let mut rotated: Rotated = files.rotate(&dir, &name)?;
        let echo = self.console_echo().then(|| self.inner.console.clone());
        self.publish(Channels::build(Arc::clone(&rotated.current), echo));

        let old_file = rotated
            .previous
            .as_ref()
            .map(|previous| previous.path().display().to_string())
            .unwrap_or_default();
        rotated.retire_previous();

        tracing::info!(
            rotalog.event = "log_rotated",
            old_file = %old_file,
            new_file = %rotated.current.path().display(),
            "Log file rotated"
        );

        Ok(rotated.current.path().to_path_buf())
    }

    /// Replace the channel set in one step. Readers see either the old set or
    /// the new one, never a mix.
    fn publish(&self, channels: Channels) {
        let previous = {
            let mut slot = self
                .inner
                .channels
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, Arc::new(channels))
        };
        drop(previous);
    }

    fn lock_files(&self) -> MutexGuard<'_, LogFileManager> {
        self.inner
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Directory listing of every file this logger's directory holds
    pub fn log_files(&self) -> Result<Vec<crate::rotation::LogFileInfo>> {
        LogFileManager::find_log_files(&self.log_dir())
    }

    /// ERROR line that never terminates, for conditions the logger itself
    /// reports about its own background work
    #[track_caller]
    pub(crate) fn report_error(&self, message: impl fmt::Display) {
        self.emit(Severity::Error, message, Location::caller());
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("active_file", &self.active_file())
            .field("threshold", &self.threshold())
            .field("console_echo", &self.console_echo())
            .field("max_file_size", &self.max_file_size())
            .finish()
    }
}

/// Render arguments separated by single spaces, the way the level macros
/// join their inputs.
pub fn join_args(args: &[&dyn fmt::Display]) -> String {
    let mut joined = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            joined.push(' ');
        }
        joined.push_str(&arg.to_string());
    }
    joined
}

