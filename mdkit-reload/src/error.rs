use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Errors raised while watching, preparing or mounting a reload.
#[derive(Error, Debug)]
pub enum ReloadError {
    /// The file watcher could not be created or attached.
    #[error("file watcher failed: {0}")]
    Watch(#[from] notify::Error),

    /// A configured watch path does not exist.
    #[error("watch path not found: {}", .0.display())]
    MissingPath(PathBuf),

    /// The prepare step ran longer than the build timeout.
    #[error("rebuild timed out after {0:?}")]
    Timeout(Duration),

    /// The prepare step returned an error.
    #[error("prepare failed: {0:#}")]
    Prepare(anyhow::Error),

    /// The prepare step panicked.
    #[error("prepare worker panicked")]
    WorkerPanicked,

    /// The mount step returned an error.
    #[error("mount failed: {0:#}")]
    Mount(anyhow::Error),

    /// The reload configuration could not be read.
    #[error("failed to read reload configuration {}: {source}", path.display())]
    ConfigRead {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The reload configuration is not valid TOML for [`crate::ReloadConfig`].
    #[error("invalid reload configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result alias of the reload harness.
pub type ReloadResult<T> = Result<T, ReloadError>;
