use crate::error::LogError;
use crate::format::Formatter;
use crate::level::LogLevel;
use crate::queue::{Envelope, RecordReceiver};
use crate::record::LogRecord;
use crate::sink::ActiveSink;
use crossbeam::channel::Sender;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// The single consumer of a logger's queue.
///
/// Each record is formatted, written and, for terminal levels, acted upon
/// before the next envelope is taken. The sink is flushed whenever the queue
/// runs dry and always before a terminal action.
pub(crate) struct WriterLoop {
    queue: RecordReceiver,
    formatter: Formatter,
    sink: ActiveSink,
}

impl WriterLoop {
    pub(crate) fn new(queue: RecordReceiver, formatter: Formatter, sink: ActiveSink) -> Self {
        Self {
            queue,
            formatter,
            sink,
        }
    }

    pub(crate) fn spawn(self) -> Result<JoinHandle<()>, LogError> {
        thread::Builder::new()
            .name("xlog-writer".into())
            .spawn(move || self.run())
            .map_err(|source| LogError::Spawn {
                name: "writer",
                source,
            })
    }

    fn run(mut self) {
        debug!("log writer started");
        while let Some(envelope) = self.queue.recv() {
            match envelope {
                Envelope::Record { record, done } => self.write_record(record, done),
                Envelope::Flush(ack) => {
                    self.flush();
                    let _ = ack.send(());
                }
                Envelope::Shutdown => break,
            }
        }
        self.flush();
        debug!("log writer stopped");
        // Dropping the formatter closes the rotation trigger, which stops the
        // rotation manager.
    }

    fn write_record(&mut self, record: LogRecord, done: Option<Sender<String>>) {
        let line = self.formatter.format(&record);
        if let Err(err) = self.sink.write_line(line.as_bytes()) {
            warn!("failed to write log line: {}", err);
        }

        match record.level {
            LogLevel::Fatal => {
                self.flush();
                std::process::exit(1);
            }
            LogLevel::Panic => self.flush(),
            _ => {
                if self.queue.is_empty() {
                    self.flush();
                }
            }
        }

        // The waiting caller raises the panic with this body.
        if let Some(done) = done {
            let _ = done.send(line.body());
        }
    }

    fn flush(&self) {
        if let Err(err) = self.sink.flush() {
            warn!("failed to flush log sink: {}", err);
        }
    }
}
