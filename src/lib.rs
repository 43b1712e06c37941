//! # xlog
//!
//! An in-process logging pipeline. Callers on any thread hand structured
//! records to a bounded queue; a dedicated writer thread renders them into
//! lines and writes them to the active sink. File loggers rotate daily: a
//! second thread opens `<base>.<YYYYMMDD>` for each new day, repoints the
//! `<base>` symlink and swaps the sink without losing or splitting lines.
//!
//! ## Line Format
//!
//! ```text
//! YYYY/MM/DD HH:MM:SS [level] file:line message
//! ```
//!
//! `level` is one of `debug`, `info`, `warn`, `error`, `panic`, `fatal`.
//! `panic` records panic on the calling thread once written; `fatal` records
//! exit the process with status 1 once written.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use xlog::{args, LogLevel, Logger, Options};
//!
//! fn main() -> anyhow::Result<()> {
//!     let logger = Logger::from_file_name(
//!         "/var/log/myapp/app.log",
//!         Options::default().with_level(LogLevel::Info),
//!     )?;
//!
//!     logger.info(args!["service started"]);
//!     logger.infof("listening on %s:%d", args!["0.0.0.0", 8080]);
//!     logger.debug(args!["filtered out at info"]);
//!
//!     logger.close()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Guarantees
//!
//! - Records from one logger reach the sink in enqueue order, one whole line
//!   at a time.
//! - Records below the threshold are dropped before they touch the queue.
//! - A full queue blocks the producer; nothing is ever dropped for space.
//! - Terminal actions happen after the line is written and flushed.

/// Reusable line buffers
pub mod buffer_pool;

/// Time sources for timestamps and day boundaries
pub mod clock;

/// Command-line arguments for the `xlog` binary
///
/// Parsed with clap; an optional JSON options file supplies the base
/// configuration and flags override individual fields.
pub mod cli;

/// Library error type
pub mod error;

/// Line rendering and day-boundary detection
///
/// The formatter renders the zero-padded header, the level tag and the call
/// site, then the message body, into a pooled buffer. It owns the day marker
/// and notifies rotation when a record falls on a new calendar day.
pub mod format;

/// Process-wide default logger and forwarding free functions
pub mod global;

/// Severity levels
pub mod level;

/// The logger handle, its builder and the level methods
pub mod logger;

/// tracing event formatter for the binary's own diagnostics
pub mod logging;

/// Construction-time options and JSON loading
pub mod options;

/// printf-style and print-style message rendering
pub mod printf;

pub(crate) mod queue;

/// Log records and call sites
pub mod record;

/// Dated file naming, symlink maintenance and the rotation manager
pub mod rotation;

/// Swappable output destinations
pub mod sink;

/// Typed log arguments
pub mod value;

pub(crate) mod writer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::LogError;
pub use level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use options::Options;
pub use record::{CallSite, LogRecord};
pub use sink::MemorySink;
pub use value::Value;

/// The current version of xlog
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values
pub mod defaults {
    use crate::level::LogLevel;

    /// Default severity threshold; everything is logged.
    pub const LEVEL: LogLevel = LogLevel::Debug;

    /// Default number of record slots in a logger's queue.
    ///
    /// Producers block once this many records are waiting for the writer.
    pub const QUEUE_CAPACITY: usize = 1024;

    /// Default number of idle line buffers kept for reuse.
    pub const POOL_CAPACITY: usize = 16;
}
