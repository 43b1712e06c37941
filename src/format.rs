//! Line rendering.
//!
//! Every record becomes exactly one line:
//!
//! ```text
//! 2024/01/03 04:05:06 [info] src/server.rs:42 listening on 0.0.0.0:80
//! ```
//!
//! Month, day, hour, minute and second are always zero-padded to two digits.
//! The formatter also owns the logger's day marker: when a record's calendar
//! day is later than the marker, the marker moves to that day and the rotation
//! manager is notified without blocking. Timestamps are taken before records
//! are enqueued, so a record stamped just before midnight can arrive after one
//! stamped just after it; such a record goes to the current file and never
//! moves the marker back.

use crate::buffer_pool::{BufferPool, PooledBuffer};
use crate::printf::{self, ByteWriter};
use crate::record::LogRecord;
use chrono::{Datelike, NaiveDate, Timelike};
use crossbeam::channel::Sender;
use std::fmt::Write;
use std::ops::Range;
use tracing::debug;

/// A rendered line on loan from the buffer pool.
#[derive(Debug)]
pub struct FormattedLine {
    buf: PooledBuffer,
    body: Range<usize>,
}

impl FormattedLine {
    /// The full line, including the trailing newline.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Just the message part, without header or newline.
    pub fn body(&self) -> String {
        String::from_utf8_lossy(&self.buf[self.body.clone()]).into_owned()
    }
}

/// Renders records and tracks the day marker.
///
/// Only the writer thread formats, so the marker has a single owner and
/// advancing it needs no synchronisation.
#[derive(Debug)]
pub struct Formatter {
    pool: BufferPool,
    current_day: NaiveDate,
    rotation: Option<Sender<NaiveDate>>,
}

impl Formatter {
    pub fn new(pool: BufferPool, current_day: NaiveDate) -> Self {
        Self {
            pool,
            current_day,
            rotation: None,
        }
    }

    /// Notify `trigger` whenever a record lands on a new calendar day.
    pub(crate) fn with_rotation_trigger(mut self, trigger: Sender<NaiveDate>) -> Self {
        self.rotation = Some(trigger);
        self
    }

    pub fn current_day(&self) -> NaiveDate {
        self.current_day
    }

    pub fn format(&mut self, record: &LogRecord) -> FormattedLine {
        let ts = &record.timestamp;
        self.observe_day(ts.date_naive());

        let mut buf = self.pool.get();
        let mut w = ByteWriter(&mut buf);
        let _ = write!(
            w,
            "{:04}/{:02}/{:02} {:02}:{:02}:{:02} [{}] {}:{} ",
            ts.year(),
            ts.month(),
            ts.day(),
            ts.hour(),
            ts.minute(),
            ts.second(),
            record.level.tag(),
            record.call_site.file,
            record.call_site.line,
        );

        let start = buf.len();
        match record.template.as_deref() {
            Some(template) => printf::sprintf(&mut buf, template, &record.args),
            None => printf::sprint(&mut buf, &record.args),
        }
        let end = buf.len();
        buf.push(b'\n');

        FormattedLine {
            buf,
            body: start..end,
        }
    }

    fn observe_day(&mut self, day: NaiveDate) {
        if day <= self.current_day {
            return;
        }
        debug!("day boundary crossed: {} -> {}", self.current_day, day);
        self.current_day = day;
        if let Some(trigger) = &self.rotation {
            // Unbounded, so this never blocks; a send error means the
            // rotation manager has already stopped.
            let _ = trigger.try_send(day);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{args, level::LogLevel, record::CallSite, value::Value};
    use chrono::{Local, TimeZone};
    use crossbeam::channel;

    fn record(
        ts: chrono::DateTime<Local>,
        level: LogLevel,
        template: Option<&'static str>,
        args: Vec<Value>,
    ) -> LogRecord {
        LogRecord::new(
            ts,
            level,
            CallSite::new("src/main.rs", 7),
            template.map(Into::into),
            args,
        )
    }

    fn jan_3() -> chrono::DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 3, 4, 5, 6).unwrap()
    }

    #[test]
    fn test_line_layout_is_zero_padded() {
        let mut formatter = Formatter::new(BufferPool::new(2), jan_3().date_naive());
        let line = formatter.format(&record(jan_3(), LogLevel::Info, None, args!["a", 1]));
        assert_eq!(
            std::str::from_utf8(line.as_bytes()).unwrap(),
            "2024/01/03 04:05:06 [info] src/main.rs:7 a 1\n"
        );
        assert_eq!(line.body(), "a 1");
    }

    #[test]
    fn test_template_body() {
        let mut formatter = Formatter::new(BufferPool::new(2), jan_3().date_naive());
        let line = formatter.format(&record(
            jan_3(),
            LogLevel::Warn,
            Some("%s=%d"),
            args!["x", 1],
        ));
        assert_eq!(line.body(), "x=1");
        assert!(line.as_bytes().ends_with(b"[warn] src/main.rs:7 x=1\n"));
    }

    #[test]
    fn test_every_level_tag() {
        let mut formatter = Formatter::new(BufferPool::new(2), jan_3().date_naive());
        for level in LogLevel::ALL {
            let line = formatter.format(&record(jan_3(), level, None, args![]));
            let text = String::from_utf8_lossy(line.as_bytes()).into_owned();
            assert!(text.contains(&format!(" [{}] ", level.tag())), "{}", text);
        }
    }

    #[test]
    fn test_day_change_notifies_once() {
        let (tx, rx) = channel::unbounded();
        let mut formatter =
            Formatter::new(BufferPool::new(2), jan_3().date_naive()).with_rotation_trigger(tx);

        formatter.format(&record(jan_3(), LogLevel::Info, None, args!["same day"]));
        assert!(rx.try_recv().is_err());

        let next = Local.with_ymd_and_hms(2024, 1, 4, 0, 0, 1).unwrap();
        formatter.format(&record(next, LogLevel::Info, None, args!["next day"]));
        formatter.format(&record(next, LogLevel::Info, None, args!["still next"]));

        assert_eq!(rx.try_recv().unwrap(), next.date_naive());
        assert!(rx.try_recv().is_err());
        assert_eq!(formatter.current_day(), next.date_naive());
    }

    #[test]
    fn test_same_day_number_in_other_month_is_a_boundary() {
        let (tx, rx) = channel::unbounded();
        let mut formatter =
            Formatter::new(BufferPool::new(2), jan_3().date_naive()).with_rotation_trigger(tx);

        let feb_3 = Local.with_ymd_and_hms(2024, 2, 3, 12, 0, 0).unwrap();
        formatter.format(&record(feb_3, LogLevel::Info, None, args!["later"]));
        assert_eq!(rx.try_recv().unwrap(), feb_3.date_naive());
    }

    #[test]
    fn test_late_record_from_previous_day_does_not_rotate_back() {
        let (tx, rx) = channel::unbounded();
        let mut formatter =
            Formatter::new(BufferPool::new(2), jan_3().date_naive()).with_rotation_trigger(tx);

        let after_midnight = Local.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap();
        let before_midnight = Local.with_ymd_and_hms(2024, 1, 3, 23, 59, 59).unwrap();
        formatter.format(&record(after_midnight, LogLevel::Info, None, args!["new day"]));
        let late = formatter.format(&record(before_midnight, LogLevel::Info, None, args!["late"]));

        assert_eq!(rx.try_recv().unwrap(), after_midnight.date_naive());
        assert!(rx.try_recv().is_err());
        assert_eq!(formatter.current_day(), after_midnight.date_naive());
        // The late record keeps its own timestamp.
        assert!(late.as_bytes().starts_with(b"2024/01/03 23:59:59 "));
    }

    #[test]
    fn test_buffers_are_recycled() {
        let pool = BufferPool::new(2);
        let mut formatter = Formatter::new(pool.clone(), jan_3().date_naive());
        for _ in 0..10 {
            let line = formatter.format(&record(jan_3(), LogLevel::Debug, None, args!["x"]));
            drop(line);
        }
        assert_eq!(pool.idle(), 1);
    }
}
