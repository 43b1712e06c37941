//! Process-wide default logger.
//!
//! Nothing is installed implicitly. A program calls [`init`] (or
//! [`init_default`] for stdout at the default level) once, early in `main`;
//! the logger then lives until the process exits and is never torn down.
//!
//! Before initialisation the free functions below discard ordinary records.
//! `panic`/`fatal` still panic or exit, so control flow at the call site does
//! not depend on whether logging was set up.

use crate::error::LogError;
use crate::level::LogLevel;
use crate::logger::Logger;
use crate::options::Options;
use crate::printf;
use crate::value::Value;
use std::borrow::Cow;
use std::sync::OnceLock;

static DEFAULT: OnceLock<Logger> = OnceLock::new();

/// Install `logger` as the process-wide default. Fails if one is installed.
pub fn init(logger: Logger) -> Result<(), LogError> {
    DEFAULT.set(logger).map_err(|_| LogError::AlreadyInitialized)
}

/// Install a stdout logger with default options.
pub fn init_default() -> Result<(), LogError> {
    init(Logger::new(std::io::stdout(), Options::default())?)
}

/// The installed default logger, if any.
pub fn logger() -> Option<&'static Logger> {
    DEFAULT.get()
}

/// Wait until everything logged through the default logger is written.
pub fn flush() -> Result<(), LogError> {
    match DEFAULT.get() {
        Some(logger) => logger.flush(),
        None => Ok(()),
    }
}

#[track_caller]
fn forward(level: LogLevel, template: Option<Cow<'static, str>>, args: Vec<Value>) {
    match DEFAULT.get() {
        Some(logger) => logger.output(level, template, args),
        None => match level {
            LogLevel::Fatal => std::process::exit(1),
            LogLevel::Panic => panic!("{}", printf::format_message(template.as_deref(), &args)),
            _ => {}
        },
    }
}

#[track_caller]
pub fn debug(args: Vec<Value>) {
    forward(LogLevel::Debug, None, args);
}

#[track_caller]
pub fn debugf(template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
    forward(LogLevel::Debug, Some(template.into()), args);
}

#[track_caller]
pub fn info(args: Vec<Value>) {
    forward(LogLevel::Info, None, args);
}

#[track_caller]
pub fn infof(template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
    forward(LogLevel::Info, Some(template.into()), args);
}

#[track_caller]
pub fn warn(args: Vec<Value>) {
    forward(LogLevel::Warn, None, args);
}

#[track_caller]
pub fn warnf(template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
    forward(LogLevel::Warn, Some(template.into()), args);
}

#[track_caller]
pub fn error(args: Vec<Value>) {
    forward(LogLevel::Error, None, args);
}

#[track_caller]
pub fn errorf(template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
    forward(LogLevel::Error, Some(template.into()), args);
}

#[track_caller]
pub fn panic(args: Vec<Value>) {
    forward(LogLevel::Panic, None, args);
}

#[track_caller]
pub fn panicf(template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
    forward(LogLevel::Panic, Some(template.into()), args);
}

#[track_caller]
pub fn fatal(args: Vec<Value>) {
    forward(LogLevel::Fatal, None, args);
}

#[track_caller]
pub fn fatalf(template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
    forward(LogLevel::Fatal, Some(template.into()), args);
}
