//! Timestamp-derived names for rotation epochs

use chrono::{DateTime, Local};
use std::sync::Arc;

/// `YYYY.MM.DD_HH-MM-SS`
pub const FILE_STEM_FORMAT: &str = "%Y.%m.%d_%H-%M-%S";
pub const FILE_EXTENSION: &str = "log";

/// Largest same-second counter that still fits in three digits
const MAX_COUNTER: u32 = 999;

/// Source of wall-clock time for file names and line timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// Clock backed by the system time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Produces sortable file names, one per rotation epoch
#[derive(Clone)]
pub struct TimeNamer {
    clock: Arc<dyn Clock>,
}

impl TimeNamer {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Name for the next epoch. The result always sorts strictly after
    /// `previous`: a second rotation within the same second (or after the
    /// clock stepped back) gets a `_NNN` counter on the previous stem. Once
    /// a counter is used up, a fresh `_001` is nested after it.
    pub fn next_name(&self, previous: Option<&str>) -> String {
        let candidate = format!(
            "{}.{}",
            self.clock.now().format(FILE_STEM_FORMAT),
            FILE_EXTENSION
        );

        let previous = match previous {
            Some(previous) if candidate.as_str() <= previous => previous,
            _ => return candidate,
        };

        let stem = previous
            .strip_suffix(FILE_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .unwrap_or(previous);
        match split_counter(stem) {
            (base, counter) if counter < MAX_COUNTER => {
                format!("{}_{:03}.{}", base, counter + 1, FILE_EXTENSION)
            }
            _ => format!("{}_{:03}.{}", stem, 1, FILE_EXTENSION),
        }
    }
}

impl Default for TimeNamer {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

fn split_counter(stem: &str) -> (&str, u32) {
    if let Some((base, digits)) = stem.rsplit_once('_') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(counter) = digits.parse() {
                return (base, counter);
            }
        }
    }
    (stem, 0)
}
