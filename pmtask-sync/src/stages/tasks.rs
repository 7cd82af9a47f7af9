//! Tasks, followed by the two post-passes that need every task in place:
//! re-parenting under summary tasks and tag-set replication.

use std::cmp::Ordering;

use pmtask_client::models::{Task, TaskCreate, TaskUpdate};
use pmtask_client::{fetch_all, Query};
use pmtask_core::wbs::compare_outline;
use pmtask_core::{reconcile, Capabilities, EntityKind, IdentityMap, Keyed, Strategy};

use super::{created_key, key_of, optional_mapping, require_id, require_mapping, StageContext};
use crate::error::{ApiResultExt, SyncError};
use crate::fixups;
use crate::progress::{Stage, StageSummary};

/// `"{project} - {task}"`, or just the task name when the project is unknown.
pub(crate) fn task_identity(task: &Task) -> String {
    match task.project.as_ref().and_then(|p| p.name.as_deref()) {
        Some(project) => format!("{project} - {}", task.name),
        None => task.name.clone(),
    }
}

/// Outline order, ties broken by id.
pub(crate) fn by_outline(a: &Task, b: &Task) -> Ordering {
    compare_outline(a.wbs(), b.wbs()).then_with(|| a.id.cmp(&b.id))
}

struct TaskRules;

impl Keyed<Task> for TaskRules {
    fn identity(&self, record: &Task) -> String {
        task_identity(record)
    }

    fn primary_key(&self, record: &Task) -> String {
        key_of(record.id)
    }
}

impl Strategy<Task> for TaskRules {
    // Only fields that create or update can write.
    fn equals(&self, src: &Task, dest: &Task) -> bool {
        src.name == dest.name
            && src.description.as_deref().unwrap_or_default()
                == dest.description.as_deref().unwrap_or_default()
            && src.status.as_ref().and_then(|s| s.name.as_deref())
                == dest.status.as_ref().and_then(|s| s.name.as_deref())
            && src.planned_start_date == dest.planned_start_date
            && src.planned_finish_date == dest.planned_finish_date
            && src.actual_start_date == dest.actual_start_date
            && src.actual_finish_date == dest.actual_finish_date
            && src.percent_complete == dest.percent_complete
            && src.is_locked == dest.is_locked
            && src.is_milestone == dest.is_milestone
            && src.priority_id == dest.priority_id
            && src.theme == dest.theme
            && src.actual_cost.unwrap_or(0.0) == dest.actual_cost.unwrap_or(0.0)
            && src.planned_cost.unwrap_or(0.0) == dest.planned_cost.unwrap_or(0.0)
            && src.planned_duration == dest.planned_duration
            && src.planned_effort.unwrap_or(0) == dest.planned_effort.unwrap_or(0)
    }
}

fn task_create(task: &Task, map: &IdentityMap) -> TaskCreate {
    let assignees = task
        .assignees
        .iter()
        .filter_map(|a| map.map_key_guid(EntityKind::Resource, a.id))
        .collect();
    TaskCreate {
        name: task.name.clone(),
        description: task.description.clone(),
        percent_complete: task.percent_complete,
        priority_id: task.priority_id,
        planned_start_date: task.planned_start_date,
        planned_finish_date: task.planned_finish_date,
        planned_duration: task.planned_duration,
        planned_effort: task.planned_effort,
        planned_cost: task.planned_cost,
        actual_start_date: task.actual_start_date,
        actual_cost: task.actual_cost,
        theme: task.theme.clone(),
        is_locked: task.is_locked,
        is_milestone: task.is_milestone,
        status_id: optional_mapping(map, EntityKind::TaskStatus, task.status.as_ref()),
        assignees,
    }
}

/// Update body for `dest` from `src`.
///
/// The API rejects a planned start, finish, and duration that change
/// together, so planned dates are sent only when they differ and the
/// duration only when at most one date is being changed.
pub(crate) fn task_update(src: &Task, dest: &Task, map: &IdentityMap) -> TaskUpdate {
    let mut update = TaskUpdate {
        name: Some(src.name.clone()),
        description: src.description.clone(),
        percent_complete: src.percent_complete,
        priority_id: src.priority_id,
        planned_effort: src.planned_effort,
        planned_cost: src.planned_cost,
        actual_start_date: src.actual_start_date,
        actual_finish_date: src.actual_finish_date,
        actual_cost: src.actual_cost,
        theme: src.theme.clone(),
        is_locked: src.is_locked,
        is_milestone: src.is_milestone,
        status_id: optional_mapping(map, EntityKind::TaskStatus, src.status.as_ref()),
        ..TaskUpdate::default()
    };
    let mut planned_changes = 0;
    if src.planned_start_date != dest.planned_start_date {
        update.planned_start_date = src.planned_start_date;
        planned_changes += 1;
    }
    if src.planned_finish_date != dest.planned_finish_date {
        update.planned_finish_date = src.planned_finish_date;
        planned_changes += 1;
    }
    if src.planned_duration != dest.planned_duration && planned_changes < 2 {
        update.planned_duration = src.planned_duration;
    }
    update
}

pub(crate) fn sync_tasks(cx: &mut StageContext<'_>) -> Result<(), SyncError> {
    let all = fetch_all(cx.page_size, &Query::new(), |q| cx.src.query_tasks(q))
        .api_context("Fetching tasks from source")?;
    let dest_tasks = fetch_all(cx.page_size, &Query::new(), |q| cx.dest.query_tasks(q))
        .api_context("Fetching tasks from destination")?;

    // Source queries include tasks of deleted projects, which were never
    // cloned. Drop them before matching.
    let mut src: Vec<Task> = all
        .into_iter()
        .filter(|t| cx.map.map_key_guid(EntityKind::Project, t.project_id).is_some())
        .collect();
    src.sort_by(by_outline);
    cx.started(Stage::Tasks, src.len());

    let dest = cx.dest;
    let capabilities = Capabilities::full(
        move |task: &Task, map: &IdentityMap| {
            let project = require_mapping(map, EntityKind::Project, task.project_id, &task.name)?;
            let created = dest
                .create_task(project, &task_create(task, map))
                .api_context(&format!("Creating task '{}'", task.name))?;
            created_key(created, EntityKind::Task, &task.name)
        },
        move |src_task: &Task, dest_task: &Task, map: &IdentityMap| {
            let id = require_id(EntityKind::Task, dest_task.id, &dest_task.name)?;
            dest.update_task(id, &task_update(src_task, dest_task, map))
                .api_context(&format!("Updating task '{}'", dest_task.name))
        },
        move |task: &Task| {
            let id = require_id(EntityKind::Task, task.id, &task.name)?;
            dest.delete_task(id)
                .api_context(&format!("Deleting task '{}'", task.name))
        },
    );
    let result = reconcile(EntityKind::Task, &src, &dest_tasks, &mut cx.map, &TaskRules, capabilities)?;
    cx.finished(StageSummary::synced(Stage::Tasks, src.len(), result));

    let summaries = src.iter().filter(|t| t.is_summary == Some(true)).count();
    cx.started(Stage::TaskParents, summaries);
    let reparented = fixups::reparent_tasks(cx.dest, &cx.map, &src, &dest_tasks, &mut *cx.progress)?;
    cx.finished(StageSummary::synced(
        Stage::TaskParents,
        summaries,
        pmtask_core::SyncResult::new(0, reparented, 0),
    ));

    cx.started(Stage::TaskTags, src.len());
    let tagged = fixups::replicate_tags(cx.dest, &cx.map, &src, &dest_tasks, &mut *cx.progress)?;
    cx.finished(StageSummary::synced(Stage::TaskTags, src.len(), tagged));
    Ok(())
}
