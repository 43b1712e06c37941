//! The logger handle callers hold.
//!
//! A `Logger` owns the producer end of the record queue and the background
//! threads behind it:
//!
//! ```text
//! caller ─▶ level filter ─▶ queue ─▶ writer thread ─▶ formatter ─▶ active sink
//!                                                        │              ▲
//!                                                        ▼ new day      │ swap
//!                                                  rotation thread ─────┘
//! ```
//!
//! Stream loggers ([`Logger::new`]) have a writer only. File loggers
//! ([`Logger::from_file_name`]) also get a rotation manager.

use crate::buffer_pool::BufferPool;
use crate::clock::{Clock, SystemClock};
use crate::error::LogError;
use crate::format::Formatter;
use crate::level::LogLevel;
use crate::options::Options;
use crate::printf;
use crate::queue::{self, Envelope, RecordSender};
use crate::record::{CallSite, LogRecord};
use crate::rotation::{self, RotationManager};
use crate::sink::ActiveSink;
use crate::value::Value;
use crate::writer::WriterLoop;
use crossbeam::channel;
use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{info, warn};

/// Asynchronous leveled logger.
///
/// All methods take `&self`; share a logger between threads with `Arc`.
/// Records from one logger reach the sink in the order they were enqueued.
pub struct Logger {
    threshold: AtomicU8,
    queue: RecordSender,
    clock: Arc<dyn Clock>,
    pool: BufferPool,
    base_name: Option<PathBuf>,
    rotations: Arc<AtomicU64>,
    writer: Option<JoinHandle<()>>,
    rotation: Option<JoinHandle<()>>,
}

/// Configures and starts a [`Logger`].
pub struct LoggerBuilder {
    options: Options,
    clock: Arc<dyn Clock>,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            options: Options::default(),
            clock: Arc::new(SystemClock),
        }
    }
}

impl LoggerBuilder {
    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.options.level = level;
        self
    }

    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.options.queue_capacity = capacity;
        self
    }

    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.options.pool_capacity = capacity;
        self
    }

    /// Time source for timestamps and day boundaries.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start a logger writing to `sink`. No rotation takes place.
    pub fn build<W: Write + Send + 'static>(self, sink: W) -> Result<Logger, LogError> {
        Logger::start(self.options, self.clock, ActiveSink::new(sink), None)
    }

    /// Start a logger writing to `<base>.<YYYYMMDD>` with `<base>` symlinked to
    /// the active file, rotating daily.
    pub fn build_with_file_name<P: AsRef<Path>>(self, base: P) -> Result<Logger, LogError> {
        let base = base.as_ref().to_path_buf();
        let today = self.clock.now().date_naive();
        let (file, path) = rotation::open_dated(&base, today)?;
        info!("logging to {}", path.display());
        Logger::start(self.options, self.clock, ActiveSink::new(file), Some(base))
    }
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::default()
    }

    /// Start a logger writing to an arbitrary stream.
    pub fn new<W: Write + Send + 'static>(sink: W, options: Options) -> Result<Self, LogError> {
        Self::builder().options(options).build(sink)
    }

    /// Start a daily-rotating file logger.
    pub fn from_file_name<P: AsRef<Path>>(base: P, options: Options) -> Result<Self, LogError> {
        Self::builder().options(options).build_with_file_name(base)
    }

    /// Like [`Logger::from_file_name`], but a logger that cannot open its file
    /// ends the process with status 1.
    pub fn from_file_name_or_exit<P: AsRef<Path>>(base: P, options: Options) -> Self {
        match Self::from_file_name(base, options) {
            Ok(logger) => logger,
            Err(err) => {
                eprintln!("xlog: {}", err);
                std::process::exit(1);
            }
        }
    }

    fn start(
        options: Options,
        clock: Arc<dyn Clock>,
        sink: ActiveSink,
        base_name: Option<PathBuf>,
    ) -> Result<Self, LogError> {
        let (queue, records) = queue::bounded(options.queue_capacity)?;
        let pool = BufferPool::new(options.pool_capacity);
        let mut formatter = Formatter::new(pool.clone(), clock.now().date_naive());
        let rotations = Arc::new(AtomicU64::new(0));

        let rotation = match &base_name {
            Some(base) => {
                let (trigger_tx, trigger_rx) = channel::unbounded();
                formatter = formatter.with_rotation_trigger(trigger_tx);
                let manager = RotationManager::new(
                    base.clone(),
                    sink.clone(),
                    trigger_rx,
                    queue.clone(),
                    Arc::clone(&clock),
                    Arc::clone(&rotations),
                );
                Some(manager.spawn()?)
            }
            None => None,
        };
        let writer = WriterLoop::new(records, formatter, sink).spawn()?;

        Ok(Self {
            threshold: AtomicU8::new(options.level.as_u8()),
            queue,
            clock,
            pool,
            base_name,
            rotations,
            writer: Some(writer),
            rotation,
        })
    }

    /// Current severity threshold.
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.threshold.load(Ordering::Relaxed))
    }

    /// Change the threshold; applies to records created after the call.
    pub fn set_level(&self, level: LogLevel) {
        self.threshold.store(level.as_u8(), Ordering::Relaxed);
    }

    /// Whether a record at `level` would be queued.
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    /// Stable symlink name for file loggers.
    pub fn base_name(&self) -> Option<&Path> {
        self.base_name.as_deref()
    }

    /// Completed rotations. A rotation counts once the new file is the
    /// active sink and the previous file is closed.
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Acquire)
    }

    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Envelopes waiting for the writer.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn buffer_pool(&self) -> &BufferPool {
        &self.pool
    }

    /// Log at `level` from the caller's location.
    #[track_caller]
    pub fn output(&self, level: LogLevel, template: Option<Cow<'static, str>>, args: Vec<Value>) {
        self.output_at(level, CallSite::caller(), template, args);
    }

    /// Log at `level` with an explicit call site, for wrappers that resolve
    /// their caller themselves.
    ///
    /// Blocks while the queue is full. `Panic` and `Fatal` records also block
    /// until the line is on the sink; then `Panic` panics on this thread with
    /// the message body and `Fatal` exits the process with status 1.
    pub fn output_at(
        &self,
        level: LogLevel,
        call_site: CallSite,
        template: Option<Cow<'static, str>>,
        args: Vec<Value>,
    ) {
        if !self.enabled(level) {
            return;
        }

        if !level.is_terminal() {
            let record = LogRecord::new(self.clock.now(), level, call_site, template, args);
            if let Err(err) = self.queue.send(Envelope::Record { record, done: None }) {
                warn!("dropping {} record: {}", level, err);
            }
            return;
        }

        // Kept in case the writer is gone and cannot hand the body back.
        let fallback = printf::format_message(template.as_deref(), &args);
        let record = LogRecord::new(self.clock.now(), level, call_site, template, args);
        let (done_tx, done_rx) = channel::bounded(1);
        let written = self
            .queue
            .send(Envelope::Record {
                record,
                done: Some(done_tx),
            })
            .and_then(|_| self.queue.wait(&done_rx))
            .ok();

        match level {
            LogLevel::Fatal => std::process::exit(1),
            _ => panic!("{}", written.unwrap_or(fallback)),
        }
    }

    #[track_caller]
    pub fn debug(&self, args: Vec<Value>) {
        self.output(LogLevel::Debug, None, args);
    }

    #[track_caller]
    pub fn debugf(&self, template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
        self.output(LogLevel::Debug, Some(template.into()), args);
    }

    #[track_caller]
    pub fn info(&self, args: Vec<Value>) {
        self.output(LogLevel::Info, None, args);
    }

    #[track_caller]
    pub fn infof(&self, template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
        self.output(LogLevel::Info, Some(template.into()), args);
    }

    #[track_caller]
    pub fn warn(&self, args: Vec<Value>) {
        self.output(LogLevel::Warn, None, args);
    }

    #[track_caller]
    pub fn warnf(&self, template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
        self.output(LogLevel::Warn, Some(template.into()), args);
    }

    #[track_caller]
    pub fn error(&self, args: Vec<Value>) {
        self.output(LogLevel::Error, None, args);
    }

    #[track_caller]
    pub fn errorf(&self, template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
        self.output(LogLevel::Error, Some(template.into()), args);
    }

    /// Write the record, then panic with its message.
    #[track_caller]
    pub fn panic(&self, args: Vec<Value>) {
        self.output(LogLevel::Panic, None, args);
    }

    #[track_caller]
    pub fn panicf(&self, template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
        self.output(LogLevel::Panic, Some(template.into()), args);
    }

    /// Write the record, then exit the process with status 1.
    #[track_caller]
    pub fn fatal(&self, args: Vec<Value>) {
        self.output(LogLevel::Fatal, None, args);
    }

    #[track_caller]
    pub fn fatalf(&self, template: impl Into<Cow<'static, str>>, args: Vec<Value>) {
        self.output(LogLevel::Fatal, Some(template.into()), args);
    }

    /// Block until everything enqueued so far is written and the sink flushed.
    ///
    /// Fails with [`LogError::Disconnected`] if the writer thread has stopped.
    pub fn flush(&self) -> Result<(), LogError> {
        let (ack_tx, ack_rx) = channel::bounded(1);
        self.queue.send(Envelope::Flush(ack_tx))?;
        self.queue.wait(&ack_rx)
    }

    /// Drain the queue, flush, and stop the background threads.
    pub fn close(mut self) -> Result<(), LogError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), LogError> {
        let writer = match self.writer.take() {
            Some(writer) => writer,
            None => return Ok(()),
        };
        let sent = self.queue.send(Envelope::Shutdown);
        if writer.join().is_err() {
            warn!("log writer thread panicked");
        }
        // The writer dropped the rotation trigger on exit.
        if let Some(rotation) = self.rotation.take() {
            if rotation.join().is_err() {
                warn!("log rotation thread panicked");
            }
        }
        sent
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("level", &self.level())
            .field("base_name", &self.base_name)
            .field("queue_capacity", &self.queue_capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::clock::ManualClock;
    use crate::sink::MemorySink;
    use chrono::{Local, TimeZone};
    use std::panic::{catch_unwind, AssertUnwindSafe};

    fn fixed_clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Local.with_ymd_and_hms(2024, 1, 3, 4, 5, 6).unwrap(),
        ))
    }

    fn memory_logger(level: LogLevel) -> (Logger, MemorySink) {
        let memory = MemorySink::new();
        let logger = Logger::builder()
            .level(level)
            .clock(fixed_clock())
            .build(memory.clone())
            .unwrap();
        (logger, memory)
    }

    #[test]
    fn test_line_format_end_to_end() {
        let (logger, memory) = memory_logger(LogLevel::Debug);
        let line = line!() + 1;
        logger.infof("%s=%d", args!["x", 1]);
        logger.flush().unwrap();

        assert_eq!(
            memory.lines(),
            vec![format!(
                "2024/01/03 04:05:06 [info] {}:{} x=1",
                file!(),
                line
            )]
        );
    }

    #[test]
    fn test_below_threshold_has_no_effect() {
        let (logger, memory) = memory_logger(LogLevel::Warn);
        logger.debug(args!["hidden"]);
        logger.info(args!["hidden"]);
        assert_eq!(logger.queued(), 0);
        logger.flush().unwrap();
        assert!(memory.is_empty());

        logger.warn(args!["shown"]);
        logger.error(args!["shown"]);
        logger.flush().unwrap();
        assert_eq!(memory.lines().len(), 2);
    }

    #[test]
    fn test_set_level_at_runtime() {
        let (logger, memory) = memory_logger(LogLevel::Error);
        assert_eq!(logger.level(), LogLevel::Error);
        logger.info(args!["dropped"]);

        logger.set_level(LogLevel::Info);
        assert!(logger.enabled(LogLevel::Info));
        logger.info(args!["kept"]);
        logger.flush().unwrap();

        let lines = memory.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("kept"));
    }

    #[test]
    fn test_panic_level_writes_then_panics_with_body() {
        let (logger, memory) = memory_logger(LogLevel::Debug);
        let result = catch_unwind(AssertUnwindSafe(|| {
            logger.panicf("%s=%d", args!["x", 1]);
        }));

        let payload = result.expect_err("panic level must panic");
        let message = payload
            .downcast_ref::<String>()
            .expect("panic payload should be the message");
        assert_eq!(message, "x=1");
        assert!(memory.contents().contains("[panic]"));
        assert!(memory.contents().ends_with("x=1\n"));
    }

    #[test]
    fn test_filtered_panic_does_not_panic() {
        let (logger, memory) = memory_logger(LogLevel::Fatal);
        logger.panic(args!["ignored"]);
        logger.flush().unwrap();
        assert!(memory.is_empty());
    }

    #[test]
    fn test_output_at_uses_given_call_site() {
        let (logger, memory) = memory_logger(LogLevel::Debug);
        logger.output_at(
            LogLevel::Warn,
            CallSite::new("wrapped.rs", 77),
            None,
            args!["via", "wrapper"],
        );
        logger.flush().unwrap();
        assert_eq!(
            memory.lines(),
            vec!["2024/01/03 04:05:06 [warn] wrapped.rs:77 via wrapper"]
        );
    }

    #[test]
    fn test_close_drains_queue() {
        let (logger, memory) = memory_logger(LogLevel::Debug);
        for n in 0..100 {
            logger.debugf("n=%d", args![n]);
        }
        logger.close().unwrap();
        assert_eq!(memory.lines().len(), 100);
    }

    /// A destination that brings the writer thread down on first use.
    struct ExplodingSink;

    impl Write for ExplodingSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            panic!("sink exploded");
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_flush_reports_dead_writer() {
        let logger = Logger::builder().build(ExplodingSink).unwrap();
        logger.info(args!["kills the writer"]);
        assert!(matches!(logger.flush(), Err(LogError::Disconnected)));
        assert!(matches!(logger.flush(), Err(LogError::Disconnected)));
    }

    #[test]
    fn test_panic_level_after_writer_died_still_panics() {
        let logger = Logger::builder().build(ExplodingSink).unwrap();
        logger.info(args!["kills the writer"]);
        let _ = logger.flush();

        let result = catch_unwind(AssertUnwindSafe(|| {
            logger.panicf("%s=%d", args!["x", 1]);
        }));
        let payload = result.expect_err("panic level must panic");
        assert_eq!(payload.downcast_ref::<String>().map(String::as_str), Some("x=1"));
    }

    #[test]
    fn test_oversized_precision_keeps_writer_alive() {
        let (logger, memory) = memory_logger(LogLevel::Debug);
        logger.infof("%.70000f", args![1.5]);
        logger.infof("%2000000000d", args![1]);
        logger.info(args!["after"]);
        logger.flush().unwrap();

        let lines = memory.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(" %!(BADWIDTH)1"));
        assert!(lines[2].ends_with(" after"));
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = Logger::builder().queue_capacity(0).build(MemorySink::new());
        assert!(matches!(result, Err(LogError::ZeroCapacity)));
    }

    #[test]
    fn test_queue_capacity_is_fixed() {
        let (logger, _memory) = memory_logger(LogLevel::Debug);
        assert_eq!(logger.queue_capacity(), crate::defaults::QUEUE_CAPACITY);
        assert!(logger.base_name().is_none());
    }
}
