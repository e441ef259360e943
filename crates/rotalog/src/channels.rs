//! The four level loggers bound to one fan-out

use crate::level::Severity;
use crate::rotation::ActiveFile;
use crate::sink::{Console, FanOut};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::io;
use std::panic::Location;
use std::sync::Arc;

/// Date and time of every line, second precision
pub const LINE_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Width the prefix token is padded to, the longest being `[ERROR]`
const PREFIX_WIDTH: usize = 7;

/// Render one line: `<timestamp> <prefix> [<file>:<line>: ]<message>\n`
pub fn format_line(
    now: DateTime<Local>,
    severity: Severity,
    location: Option<&Location<'_>>,
    message: &str,
) -> String {
    let mut line = String::with_capacity(message.len() + 48);

    let _ = write!(
        line,
        "{} {:<width$} ",
        now.format(LINE_TIME_FORMAT),
        severity.prefix(),
        width = PREFIX_WIDTH
    );
    if let Some(location) = location {
        let _ = write!(line, "{}:{}: ", short_file(location.file()), location.line());
    }
    line.push_str(message);
    if !message.ends_with('\n') {
        line.push('\n');
    }

    line
}

fn short_file(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// A named channel: fixed prefix plus the fan-out of its epoch
pub struct LevelLogger {
    severity: Severity,
    sink: Arc<FanOut>,
}

impl LevelLogger {
    fn new(severity: Severity, sink: Arc<FanOut>) -> Self {
        Self { severity, sink }
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn output(
        &self,
        now: DateTime<Local>,
        location: Option<&Location<'_>>,
        message: &str,
    ) -> io::Result<()> {
        let line = format_line(now, self.severity, location, message);
        self.sink.write_line(line.as_bytes())
    }
}

/// The complete logger set of one rotation epoch. Built whole and published
/// whole; never mutated after construction.
pub struct Channels {
    sink: Arc<FanOut>,
    info: LevelLogger,
    warn: LevelLogger,
    error: LevelLogger,
    debug: LevelLogger,
}

impl Channels {
    pub(crate) fn build(file: Arc<ActiveFile>, console: Option<Console>) -> Self {
        let sink = Arc::new(FanOut::new(file, console));

        Self {
            info: LevelLogger::new(Severity::Info, Arc::clone(&sink)),
            warn: LevelLogger::new(Severity::Warn, Arc::clone(&sink)),
            error: LevelLogger::new(Severity::Error, Arc::clone(&sink)),
            debug: LevelLogger::new(Severity::Debug, Arc::clone(&sink)),
            sink,
        }
    }

    pub fn get(&self, severity: Severity) -> &LevelLogger {
        match severity {
            Severity::Info => &self.info,
            Severity::Warn => &self.warn,
            Severity::Error => &self.error,
            Severity::Debug => &self.debug,
        }
    }

    pub fn sink(&self) -> &Arc<FanOut> {
        &self.sink
    }

    pub fn file(&self) -> &Arc<ActiveFile> {
        self.sink.file()
    }
}
