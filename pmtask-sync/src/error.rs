//! Error types for pmtask-sync.

use thiserror::Error;

use pmtask_client::ApiError;
use pmtask_core::{CoreError, EntityKind};

/// All errors that can arise from cloning an account or syncing remote tasks.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote call failed; `context` names the operation in flight.
    #[error("{context}: {source}")]
    Remote {
        context: String,
        #[source]
        source: ApiError,
    },

    /// A record needs a foreign key that no earlier stage mapped.
    #[error("no destination {kind} mapped for '{name}'")]
    MissingMapping { kind: EntityKind, name: String },

    /// A destination record came back without an id.
    #[error("{kind} '{name}' has no id")]
    MissingId { kind: EntityKind, name: String },

    /// No project matched the id, short id, or name given.
    #[error("no project matches '{needle}'{}", candidate_list(.candidates))]
    ProjectNotFound {
        needle: String,
        candidates: Vec<String>,
    },

    /// More than one project matched.
    #[error("'{needle}' matches more than one project{}", candidate_list(.candidates))]
    ProjectAmbiguous {
        needle: String,
        candidates: Vec<String>,
    },

    /// No task has the given short id or id.
    #[error("no task matches '{0}'")]
    TaskNotFound(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

fn candidate_list(candidates: &[String]) -> String {
    if candidates.is_empty() {
        String::new()
    } else {
        format!("; candidates:\n    {}", candidates.join("\n    "))
    }
}

/// Attach an operation label to a raw API result.
pub trait ApiResultExt<T> {
    fn api_context(self, context: &str) -> Result<T, SyncError>;
}

impl<T> ApiResultExt<T> for Result<T, ApiError> {
    fn api_context(self, context: &str) -> Result<T, SyncError> {
        self.map_err(|source| SyncError::Remote {
            context: context.to_string(),
            source,
        })
    }
}
