//! Error types for pmtask-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::EntityKind;

/// Errors raised by the identity map and its export.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Category text that names no known entity kind.
    #[error("unknown entity category '{0}'")]
    UnknownCategory(String),

    /// A blank source key was offered for a map entry.
    #[error("blank source key for {kind}")]
    InvalidKey { kind: EntityKind },

    /// I/O failure while exporting, with the path being written.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenience constructor for [`CoreError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> CoreError {
    CoreError::Io {
        path: path.into(),
        source,
    }
}
