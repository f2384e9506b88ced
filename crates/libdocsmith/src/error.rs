//! Error type shared by every stage of extraction, generation and storage.

use std::{path::PathBuf, time::Duration};

use thiserror::Error;

/// Errors surfaced by extraction, generation and persistence.
#[derive(Error, Debug)]
pub enum DocsmithError {
    /// An external command exited unsuccessfully; carries its diagnostic output.
    #[error("{command} failed: {output}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Trimmed stderr, or stdout when stderr was empty.
        output: String,
    },

    /// An external command did not finish within the configured timeout.
    #[error("{command} timed out after {timeout:?}")]
    CommandTimeout {
        /// The command line that was run.
        command: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// A required executable could not be located on `PATH`.
    #[error("{0} not found on PATH")]
    ToolNotFound(String),

    /// The generator command line was empty.
    #[error("generator command is empty")]
    EmptyCommand,

    /// The generator command line could not be split into arguments.
    #[error("invalid generator command: {0}")]
    InvalidCommand(String),

    /// A document or index path could not be expressed relative to the store root.
    #[error("path {0} is outside the document store")]
    OutsideStore(PathBuf),

    /// Filesystem failure while reading or writing store files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure serializing the index file.
    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<tempfile::PersistError> for DocsmithError {
    fn from(err: tempfile::PersistError) -> Self {
        Self::Io(err.error)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DocsmithError>;
