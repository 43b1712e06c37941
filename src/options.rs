use crate::{error::LogError, level::LogLevel};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Construction-time settings for a [`Logger`](crate::Logger).
///
/// Missing fields take their values from [`crate::defaults`], so a JSON file
/// only needs to name what it changes:
///
/// ```json
/// { "level": "warn", "queue_capacity": 4096 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Records below this level are dropped before they are queued
    pub level: LogLevel,

    /// Slots in the record queue; fixed for the logger's lifetime
    pub queue_capacity: usize,

    /// Idle line buffers kept for reuse
    pub pool_capacity: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            level: crate::defaults::LEVEL,
            queue_capacity: crate::defaults::QUEUE_CAPACITY,
            pool_capacity: crate::defaults::POOL_CAPACITY,
        }
    }
}

impl Options {
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Load options from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| LogError::OptionsRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| LogError::OptionsParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
