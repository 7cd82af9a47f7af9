//! Error types for pmtask-ingest.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while collecting tasks from an external source.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The Sonar API could not be reached.
    #[error("{endpoint}: request failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The Sonar API answered with a non-2xx status.
    #[error("{endpoint}: HTTP {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// A response body did not match the expected shape.
    #[error("{endpoint}: invalid response body: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// A file pattern could not be compiled.
    #[error("invalid file pattern: {0}")]
    Pattern(#[from] globset::Error),

    /// Walking the folder failed part way.
    #[error("folder walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Render(#[from] tera::Error),

    /// Template context could not be built.
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> IngestError {
    IngestError::Io {
        path: path.into(),
        source,
    }
}
