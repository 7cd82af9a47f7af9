//! Account clone: every stage in dependency order, then the identity map
//! export.

use std::path::PathBuf;

use pmtask_client::{ProjectManagerApi, DEFAULT_PAGE_SIZE};
use pmtask_core::{IdentityMap, SyncResult};

use crate::error::SyncError;
use crate::progress::{Progress, StageSummary};
use crate::stages::named::{sync_named, NamedKind};
use crate::stages::{fields, projects, reference, resources, tags, tasks, timesheets, StageContext};

#[derive(Debug, Clone)]
pub struct CloneOptions {
    /// Records requested per page on queryable collections.
    pub page_size: usize,
    /// Where to write the identity map once every stage has run.
    pub map_output: Option<PathBuf>,
}

impl Default for CloneOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            map_output: None,
        }
    }
}

/// Result of a completed clone.
#[derive(Debug)]
pub struct CloneReport {
    /// One summary per stage, in execution order.
    pub stages: Vec<StageSummary>,
    pub map: IdentityMap,
}

impl CloneReport {
    /// Mutations across all stages.
    pub fn totals(&self) -> SyncResult {
        let mut total = SyncResult::default();
        for summary in &self.stages {
            total += summary.result();
        }
        total
    }
}

/// Copy the source account's data into the destination account.
///
/// Stages run strictly in sequence so that every foreign key a stage needs
/// has been mapped by an earlier one. The first failure aborts the clone;
/// rerunning converges because already-cloned records match by identity.
pub fn clone_account(
    src: &dyn ProjectManagerApi,
    dest: &dyn ProjectManagerApi,
    progress: &mut dyn Progress,
    options: &CloneOptions,
) -> Result<CloneReport, SyncError> {
    let mut cx = StageContext::new(src, dest, progress, options.page_size.max(1));

    sync_named(&mut cx, NamedKind::Customer)?;
    reference::match_reference_data(&mut cx)?;
    fields::sync_project_fields(&mut cx)?;
    sync_named(&mut cx, NamedKind::ResourceSkill)?;
    sync_named(&mut cx, NamedKind::ResourceTeam)?;
    tags::sync_tags(&mut cx)?;
    resources::sync_resources(&mut cx)?;
    let src_projects = projects::sync_projects(&mut cx)?;
    fields::sync_project_field_values(&mut cx, &src_projects)?;
    projects::sync_task_statuses(&mut cx, &src_projects)?;
    fields::sync_task_fields(&mut cx)?;
    tasks::sync_tasks(&mut cx)?;
    fields::sync_task_field_values(&mut cx)?;
    timesheets::sync_timesheets(&mut cx)?;

    if let Some(path) = &options.map_output {
        cx.map.export_csv_at(path)?;
        tracing::info!("Identity map written to {}", path.display());
    }

    Ok(CloneReport {
        stages: cx.summaries,
        map: cx.map,
    })
}
