//! Domain types shared by every sync stage.
//!
//! Entity categories are a closed enum so a typo in a category name is a
//! compile error rather than a silent identity-map miss.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// A category of record synchronized between two accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Customer,
    ProjectPriority,
    ProjectChargeCode,
    ProjectFolder,
    ProjectStatus,
    ProjectField,
    ProjectFieldValue,
    ResourceSkill,
    ResourceTeam,
    Tag,
    Resource,
    Project,
    TaskStatus,
    TaskField,
    Task,
    TaskFieldValue,
    Timesheet,
}

impl EntityKind {
    /// Every category, in pipeline order.
    pub const ALL: [EntityKind; 17] = [
        EntityKind::Customer,
        EntityKind::ProjectPriority,
        EntityKind::ProjectChargeCode,
        EntityKind::ProjectFolder,
        EntityKind::ProjectStatus,
        EntityKind::ProjectField,
        EntityKind::ResourceSkill,
        EntityKind::ResourceTeam,
        EntityKind::Tag,
        EntityKind::Resource,
        EntityKind::Project,
        EntityKind::ProjectFieldValue,
        EntityKind::TaskStatus,
        EntityKind::TaskField,
        EntityKind::Task,
        EntityKind::TaskFieldValue,
        EntityKind::Timesheet,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Customer => "Customer",
            EntityKind::ProjectPriority => "ProjectPriority",
            EntityKind::ProjectChargeCode => "ProjectChargeCode",
            EntityKind::ProjectFolder => "ProjectFolder",
            EntityKind::ProjectStatus => "ProjectStatus",
            EntityKind::ProjectField => "ProjectField",
            EntityKind::ProjectFieldValue => "ProjectFieldValue",
            EntityKind::ResourceSkill => "ResourceSkill",
            EntityKind::ResourceTeam => "ResourceTeam",
            EntityKind::Tag => "Tag",
            EntityKind::Resource => "Resource",
            EntityKind::Project => "Project",
            EntityKind::TaskStatus => "TaskStatus",
            EntityKind::TaskField => "TaskField",
            EntityKind::Task => "Task",
            EntityKind::TaskFieldValue => "TaskFieldValue",
            EntityKind::Timesheet => "Timesheet",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownCategory(s.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// MapKey
// ---------------------------------------------------------------------------

/// Lookup key into the identity map: a category plus the source-side key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MapKey {
    kind: EntityKind,
    original: String,
}

impl MapKey {
    /// Build a key, rejecting blank source keys.
    pub fn new(kind: EntityKind, original: impl Into<String>) -> Result<Self, CoreError> {
        let original = original.into();
        let trimmed = original.trim();
        if trimmed.is_empty() {
            return Err(CoreError::InvalidKey { kind });
        }
        Ok(Self {
            kind,
            original: trimmed.to_owned(),
        })
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn original(&self) -> &str {
        &self.original
    }
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.original)
    }
}
