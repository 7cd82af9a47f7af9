//! Stage identifiers, per-stage summaries, and the progress sink the
//! pipeline reports through.

use std::fmt;

use pmtask_core::SyncResult;

/// Every step of an account clone, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Customers,
    ProjectPriorities,
    ProjectChargeCodes,
    ProjectFolders,
    ProjectStatuses,
    ProjectFields,
    ResourceSkills,
    ResourceTeams,
    Tags,
    Resources,
    Projects,
    ProjectFieldValues,
    TaskStatuses,
    TaskFields,
    Tasks,
    TaskParents,
    TaskTags,
    TaskFieldValues,
    Timesheets,
}

impl Stage {
    pub const ALL: [Stage; 19] = [
        Stage::Customers,
        Stage::ProjectPriorities,
        Stage::ProjectChargeCodes,
        Stage::ProjectFolders,
        Stage::ProjectStatuses,
        Stage::ProjectFields,
        Stage::ResourceSkills,
        Stage::ResourceTeams,
        Stage::Tags,
        Stage::Resources,
        Stage::Projects,
        Stage::ProjectFieldValues,
        Stage::TaskStatuses,
        Stage::TaskFields,
        Stage::Tasks,
        Stage::TaskParents,
        Stage::TaskTags,
        Stage::TaskFieldValues,
        Stage::Timesheets,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::Customers => "customers",
            Stage::ProjectPriorities => "project priorities",
            Stage::ProjectChargeCodes => "project charge codes",
            Stage::ProjectFolders => "project folders",
            Stage::ProjectStatuses => "project statuses",
            Stage::ProjectFields => "project fields",
            Stage::ResourceSkills => "resource skills",
            Stage::ResourceTeams => "resource teams",
            Stage::Tags => "tags",
            Stage::Resources => "resources",
            Stage::Projects => "projects",
            Stage::ProjectFieldValues => "project field values",
            Stage::TaskStatuses => "task statuses",
            Stage::TaskFields => "task fields",
            Stage::Tasks => "tasks",
            Stage::TaskParents => "summary task indents",
            Stage::TaskTags => "task tag sets",
            Stage::TaskFieldValues => "task field values",
            Stage::Timesheets => "timesheets",
        }
    }

    /// Reference data that is only matched, never written.
    pub fn is_match_only(self) -> bool {
        matches!(
            self,
            Stage::ProjectPriorities
                | Stage::ProjectChargeCodes
                | Stage::ProjectFolders
                | Stage::ProjectStatuses
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What one stage did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Synced(SyncResult),
    Matched(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: Stage,
    /// Source records the stage looked at.
    pub attempted: usize,
    pub outcome: Outcome,
}

impl StageSummary {
    pub fn synced(stage: Stage, attempted: usize, result: SyncResult) -> Self {
        Self {
            stage,
            attempted,
            outcome: Outcome::Synced(result),
        }
    }

    pub fn matched(stage: Stage, attempted: usize, matched: usize) -> Self {
        Self {
            stage,
            attempted,
            outcome: Outcome::Matched(matched),
        }
    }

    /// Mutation counts; zero for match-only stages.
    pub fn result(&self) -> SyncResult {
        match self.outcome {
            Outcome::Synced(result) => result,
            Outcome::Matched(_) => SyncResult::default(),
        }
    }
}

impl fmt::Display for StageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            Outcome::Synced(result) => write!(f, "{result}"),
            Outcome::Matched(n) => write!(f, "Matched {n} of {}.", self.attempted),
        }
    }
}

/// Receives pipeline progress. The CLI prints; tests record.
pub trait Progress {
    /// A stage is about to run over `attempted` source records.
    fn stage_started(&mut self, stage: Stage, attempted: usize);

    fn stage_finished(&mut self, summary: &StageSummary);

    /// Free-form notice, e.g. a source record skipped for a missing parent.
    fn note(&mut self, _message: &str) {}
}

/// [`Progress`] that only logs.
#[derive(Debug, Default)]
pub struct LogProgress;

impl Progress for LogProgress {
    fn stage_started(&mut self, stage: Stage, attempted: usize) {
        if stage.is_match_only() {
            tracing::info!("Comparing {attempted} {stage}.");
        } else {
            tracing::info!("Cloning {attempted} {stage}...");
        }
    }

    fn stage_finished(&mut self, summary: &StageSummary) {
        tracing::info!("{}: {summary}", summary.stage);
    }

    fn note(&mut self, message: &str) {
        tracing::info!("{message}");
    }
}
