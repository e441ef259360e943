//! Severities and the threshold that gates them

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a single log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Info,
    Warn,
    Debug,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Error,
        Severity::Info,
        Severity::Warn,
        Severity::Debug,
    ];

    /// Numeric rank used for threshold gating. `Error` has no rank: it is
    /// never gated.
    pub fn rank(self) -> Option<u8> {
        match self {
            Severity::Error => None,
            Severity::Info => Some(1),
            Severity::Warn => Some(2),
            Severity::Debug => Some(3),
        }
    }

    /// Fixed prefix token written in front of every line of this severity
    pub fn prefix(self) -> &'static str {
        match self {
            Severity::Error => "[ERROR]",
            Severity::Info => "[INFO]",
            Severity::Warn => "[WARN]",
            Severity::Debug => "[DEBUG]",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Error => "ERROR",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Debug => "DEBUG",
        };
        f.write_str(name)
    }
}

/// Highest rank that is still emitted
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Threshold {
    #[default]
    Info = 1,
    Warn = 2,
    Debug = 3,
}

impl Threshold {
    /// Case-insensitive lookup; `None` for anything but DEBUG, WARN or INFO.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("DEBUG") {
            Some(Threshold::Debug)
        } else if name.eq_ignore_ascii_case("WARN") {
            Some(Threshold::Warn)
        } else if name.eq_ignore_ascii_case("INFO") {
            Some(Threshold::Info)
        } else {
            None
        }
    }

    pub fn rank(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_rank(rank: u8) -> Self {
        match rank {
            0 | 1 => Threshold::Info,
            2 => Threshold::Warn,
            _ => Threshold::Debug,
        }
    }

    /// Whether a line of `severity` passes this threshold
    pub fn allows(self, severity: Severity) -> bool {
        match severity.rank() {
            Some(rank) => rank <= self.rank(),
            None => true,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Threshold::Info => "INFO",
            Threshold::Warn => "WARN",
            Threshold::Debug => "DEBUG",
        };
        f.write_str(name)
    }
}
