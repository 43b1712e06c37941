//! Daily file rotation.
//!
//! A file-backed logger writes to `<base>.<YYYYMMDD>` and keeps a symlink named
//! `<base>` pointing at that file. When the formatter sees a record from a new
//! calendar day it notifies the [`RotationManager`], which runs on its own
//! thread and moves through these steps:
//!
//! 1. open `<base>.<YYYYMMDD>` for the new day, creating it if needed
//! 2. repoint `<base>` at it
//! 3. swap the logger's active sink to the new file
//! 4. close the previous file
//!
//! If step 1 or 2 fails the sink is left alone, the failure is logged as an
//! `error` record through the same logger, and the next attempt happens on the
//! next day boundary. Rotation is driven by records only: a day with no
//! records produces no file.

use crate::clock::Clock;
use crate::error::LogError;
use crate::level::LogLevel;
use crate::queue::{Envelope, RecordSender};
use crate::record::{CallSite, LogRecord};
use crate::sink::ActiveSink;
use crate::value::Value;
use chrono::{Datelike, NaiveDate};
use crossbeam::channel::Receiver;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, warn};

/// `<base>.<YYYYMMDD>` for `day`.
pub fn dated_path(base: &Path, day: NaiveDate) -> Result<PathBuf, LogError> {
    let name = base
        .file_name()
        .ok_or_else(|| LogError::InvalidBaseName(base.to_path_buf()))?;
    let mut dated = OsString::from(name);
    dated.push(format!(
        ".{:04}{:02}{:02}",
        day.year(),
        day.month(),
        day.day()
    ));
    Ok(base.with_file_name(dated))
}

/// Open `path` for appending, creating it and any missing parent directories.
pub fn open_for_append(path: &Path) -> Result<File, LogError> {
    let open_err = |source| LogError::Open {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(open_err)?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(open_err)
}

/// Atomically point the symlink `link` at `target`.
///
/// The link stores only the target's file name, so it resolves inside its own
/// directory wherever that directory is mounted. An existing symlink is
/// replaced; any other file at `link` is left untouched and reported.
pub fn point_symlink(link: &Path, target: &Path) -> Result<(), LogError> {
    if let Ok(meta) = fs::symlink_metadata(link) {
        if !meta.file_type().is_symlink() {
            return Err(LogError::NotASymlink(link.to_path_buf()));
        }
    }

    let link_name = link
        .file_name()
        .ok_or_else(|| LogError::InvalidBaseName(link.to_path_buf()))?;
    let target_name = target
        .file_name()
        .ok_or_else(|| LogError::InvalidBaseName(target.to_path_buf()))?;

    let mut tmp_name = OsString::from(".");
    tmp_name.push(link_name);
    tmp_name.push(".swap");
    let tmp = link.with_file_name(tmp_name);

    let symlink_err = |source| LogError::Symlink {
        link: link.to_path_buf(),
        target: target.to_path_buf(),
        source,
    };
    let _ = fs::remove_file(&tmp);
    make_symlink(Path::new(target_name), &tmp).map_err(symlink_err)?;
    fs::rename(&tmp, link).map_err(|source| {
        let _ = fs::remove_file(&tmp);
        symlink_err(source)
    })
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Open today's file and point the stable name at it.
pub(crate) fn open_dated(base: &Path, day: NaiveDate) -> Result<(File, PathBuf), LogError> {
    let path = dated_path(base, day)?;
    let file = open_for_append(&path)?;
    point_symlink(base, &path)?;
    Ok((file, path))
}

/// Owns the rotation protocol for one file-backed logger.
pub(crate) struct RotationManager {
    base: PathBuf,
    sink: ActiveSink,
    trigger: Receiver<NaiveDate>,
    records: RecordSender,
    clock: Arc<dyn Clock>,
    completed: Arc<AtomicU64>,
}

impl RotationManager {
    pub(crate) fn new(
        base: PathBuf,
        sink: ActiveSink,
        trigger: Receiver<NaiveDate>,
        records: RecordSender,
        clock: Arc<dyn Clock>,
        completed: Arc<AtomicU64>,
    ) -> Self {
        Self {
            base,
            sink,
            trigger,
            records,
            clock,
            completed,
        }
    }

    pub(crate) fn spawn(self) -> Result<JoinHandle<()>, LogError> {
        thread::Builder::new()
            .name("xlog-rotation".into())
            .spawn(move || self.run())
            .map_err(|source| LogError::Spawn {
                name: "rotation",
                source,
            })
    }

    /// Wait for day changes until the writer drops its end of the trigger.
    fn run(self) {
        while let Ok(mut day) = self.trigger.recv() {
            // Collapse a backlog of notifications into the latest day.
            for later in self.trigger.try_iter() {
                day = later;
            }
            if let Err(err) = self.rotate(day) {
                warn!("log rotation for {} failed: {}", self.base.display(), err);
                self.report(&err);
            }
        }
        debug!("rotation manager for {} stopped", self.base.display());
    }

    fn rotate(&self, day: NaiveDate) -> Result<(), LogError> {
        let (file, path) = open_dated(&self.base, day)?;
        let previous = self.sink.replace(Box::new(file));
        // Closing happens only after the writer can no longer reach it.
        drop(previous);
        self.completed.fetch_add(1, Ordering::Release);
        info!("rotated log {} to {}", self.base.display(), path.display());
        Ok(())
    }

    fn report(&self, err: &LogError) {
        let record = LogRecord::new(
            self.clock.now(),
            LogLevel::Error,
            CallSite::caller(),
            Some("log rotation failed: %v".into()),
            vec![Value::error(err)],
        );
        let _ = self.records.send(Envelope::Record { record, done: None });
    }
}
