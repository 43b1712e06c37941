use crate::{level::LogLevel, value::Value};
use chrono::{DateTime, Local};
use std::borrow::Cow;
use std::panic::Location;

/// Source location a record was emitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Location of the nearest caller not annotated with `#[track_caller]`.
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }
}

impl From<&'static Location<'static>> for CallSite {
    fn from(loc: &'static Location<'static>) -> Self {
        Self {
            file: loc.file(),
            line: loc.line(),
        }
    }
}

/// One log event, created at the call site and consumed by the writer.
///
/// Records move through the queue by value and are never shared.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub call_site: CallSite,
    /// printf-style template; `None` renders the arguments space-joined
    pub template: Option<Cow<'static, str>>,
    pub args: Vec<Value>,
}

impl LogRecord {
    pub fn new(
        timestamp: DateTime<Local>,
        level: LogLevel,
        call_site: CallSite,
        template: Option<Cow<'static, str>>,
        args: Vec<Value>,
    ) -> Self {
        Self {
            timestamp,
            level,
            call_site,
            template,
            args,
        }
    }
}
