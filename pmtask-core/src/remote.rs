//! Tasks produced by an external system (code scanners, file sweeps) that
//! should be mirrored into one project.

use uuid::Uuid;

/// One task as the external system sees it.
///
/// `unique_id` is the external system's own key. It is embedded in the
/// description so a later run can find the task again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteTask {
    pub unique_id: String,
    pub name: String,
    pub description: String,
    pub assignees: Vec<Uuid>,
}

impl RemoteTask {
    pub fn new(
        unique_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            unique_id: unique_id.into(),
            name: name.into(),
            description: description.into(),
            assignees: Vec::new(),
        }
    }
}
