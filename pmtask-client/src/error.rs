//! Error types for pmtask-client.

use thiserror::Error;

/// All errors that can arise from talking to the project-management API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, TLS, timeout).
    #[error("{endpoint}: request failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The server answered with a non-2xx status.
    #[error("{endpoint}: HTTP {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// The envelope came back with `success: false`.
    #[error("{endpoint}: {message}")]
    Rejected { endpoint: String, message: String },

    /// The envelope reported success but carried no payload.
    #[error("{endpoint}: response had no data")]
    MissingData { endpoint: String },

    /// The response body was not the JSON we expected.
    #[error("{endpoint}: invalid response body: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// `--env` was neither a known environment name nor a URL.
    #[error("unknown environment '{0}': expected 'production' or an https:// URL")]
    UnknownEnvironment(String),

    /// A request body could not be serialized.
    #[error("request body encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    /// HTTP status, when the server got far enough to send one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
