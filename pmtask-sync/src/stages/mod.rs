//! One module per group of entity kinds. Each stage fetches both sides,
//! hands them to the engine with the kind's rules and capabilities, and
//! reports a [`StageSummary`].

pub(crate) mod fields;
pub(crate) mod named;
pub(crate) mod projects;
pub(crate) mod reference;
pub(crate) mod resources;
pub(crate) mod tags;
pub(crate) mod tasks;
pub(crate) mod timesheets;

use pmtask_client::models::{Created, NamedRef};
use pmtask_client::ProjectManagerApi;
use pmtask_core::{EntityKind, IdentityMap};
use uuid::Uuid;

use crate::error::SyncError;
use crate::progress::{Progress, Stage, StageSummary};

/// Everything a stage needs: both accounts, the shared identity map, and
/// somewhere to report.
pub(crate) struct StageContext<'a> {
    pub src: &'a dyn ProjectManagerApi,
    pub dest: &'a dyn ProjectManagerApi,
    pub map: IdentityMap,
    pub progress: &'a mut dyn Progress,
    pub page_size: usize,
    pub summaries: Vec<StageSummary>,
}

impl<'a> StageContext<'a> {
    pub fn new(
        src: &'a dyn ProjectManagerApi,
        dest: &'a dyn ProjectManagerApi,
        progress: &'a mut dyn Progress,
        page_size: usize,
    ) -> Self {
        Self {
            src,
            dest,
            map: IdentityMap::new(),
            progress,
            page_size,
            summaries: Vec::new(),
        }
    }

    pub fn started(&mut self, stage: Stage, attempted: usize) {
        self.progress.stage_started(stage, attempted);
    }

    pub fn finished(&mut self, summary: StageSummary) {
        self.progress.stage_finished(&summary);
        self.summaries.push(summary);
    }

    pub fn note(&mut self, message: &str) {
        self.progress.note(message);
    }
}

// ---------------------------------------------------------------------------
// Key helpers shared by the stages
// ---------------------------------------------------------------------------

/// Primary key as text; records without an id get the empty key, which the
/// identity map refuses to index.
pub(crate) fn key_of(id: Option<Uuid>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

/// Destination id for a source foreign key that must already be mapped.
pub(crate) fn require_mapping(
    map: &IdentityMap,
    kind: EntityKind,
    id: Option<Uuid>,
    name: &str,
) -> Result<Uuid, SyncError> {
    map.map_key_guid(kind, id)
        .ok_or_else(|| SyncError::MissingMapping {
            kind,
            name: name.to_string(),
        })
}

/// Destination id for an optional reference. A reference that names a
/// record we could not map resolves to `None` with a warning.
pub(crate) fn optional_mapping(
    map: &IdentityMap,
    kind: EntityKind,
    reference: Option<&NamedRef>,
) -> Option<Uuid> {
    let reference = reference?;
    let mapped = map.map_key_guid(kind, reference.id);
    if mapped.is_none() && reference.id.is_some() {
        tracing::warn!(
            "no destination {kind} for '{}'; leaving it unset",
            reference.name.as_deref().unwrap_or_default()
        );
    }
    mapped
}

/// Id of a record we are about to mutate.
pub(crate) fn require_id(kind: EntityKind, id: Option<Uuid>, name: &str) -> Result<Uuid, SyncError> {
    id.ok_or_else(|| SyncError::MissingId {
        kind,
        name: name.to_string(),
    })
}

/// New destination key from a create response.
pub(crate) fn created_key(
    created: Created,
    kind: EntityKind,
    name: &str,
) -> Result<Option<String>, SyncError> {
    require_id(kind, created.id, name).map(|id| Some(id.to_string()))
}
