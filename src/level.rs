use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Severity of a log record, totally ordered from least to most severe.
///
/// The two highest levels carry a terminal action that the writer performs
/// after the record reaches the sink: `Panic` unwinds the calling thread and
/// `Fatal` exits the process with status 1.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    /// Fine-grained events useful while debugging
    Debug = 0,

    /// Progress of the application at a coarse grain
    Info = 1,

    /// Potentially harmful situations
    Warn = 2,

    /// Failures the application can survive
    Error = 3,

    /// Written, then the caller panics with the message
    Panic = 4,

    /// Written, then the process exits with status 1
    Fatal = 5,
}

impl LogLevel {
    /// Every level in ascending severity.
    pub const ALL: [LogLevel; 6] = [
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Panic,
        LogLevel::Fatal,
    ];

    /// Lowercase tag rendered between the brackets of a log line.
    pub const fn tag(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Panic => "panic",
            LogLevel::Fatal => "fatal",
        }
    }

    /// Whether writing a record at this level is followed by a terminal action.
    pub const fn is_terminal(self) -> bool {
        matches!(self, LogLevel::Panic | LogLevel::Fatal)
    }

    pub(crate) const fn as_u8(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_u8(raw: u8) -> LogLevel {
        match raw {
            0 => LogLevel::Debug,
            1 => LogLevel::Info,
            2 => LogLevel::Warn,
            3 => LogLevel::Error,
            4 => LogLevel::Panic,
            _ => LogLevel::Fatal,
        }
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        crate::defaults::LEVEL
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        LogLevel::ALL
            .into_iter()
            .find(|level| level.tag().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown log level: {}", s))
    }
}
