use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while building or operating a logger.
#[derive(Debug, Error)]
pub enum LogError {
    /// The dated log file could not be created or opened for append.
    #[error("failed to open log file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The stable-name symlink could not be pointed at the active file.
    #[error("failed to point symlink {link:?} at {target:?}: {source}")]
    Symlink {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A regular file or directory already occupies the stable name.
    #[error("{0:?} exists and is not a symlink")]
    NotASymlink(PathBuf),

    /// The base file name has no final component to derive dated names from.
    #[error("invalid log base name {0:?}")]
    InvalidBaseName(PathBuf),

    #[error("failed to read options from {path:?}: {source}")]
    OptionsRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse options from {path:?}: {source}")]
    OptionsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("queue capacity must be at least 1")]
    ZeroCapacity,

    #[error("the default logger is already initialized")]
    AlreadyInitialized,

    /// The writer thread is gone; nothing will consume further records.
    #[error("log pipeline is disconnected")]
    Disconnected,

    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}
