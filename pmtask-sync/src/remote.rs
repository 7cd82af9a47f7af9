//! Keep one destination project in step with an external task source.
//!
//! Each [`RemoteTask`] carries a unique id that is embedded in the
//! description it renders to. A project task whose description contains
//! that id is the remote task's copy; project tasks no remote task claims
//! have been closed upstream and are deleted.

use std::fmt;

use pmtask_client::models::{AssigneeUpsert, Project, Task, TaskCreate, TaskUpdate};
use pmtask_client::{fetch_all, ProjectManagerApi, Query};
use pmtask_core::{EntityKind, RemoteTask};
use uuid::Uuid;

use crate::error::{ApiResultExt, SyncError};
use crate::stages::require_id;

/// Counts from one remote sync. `skipped` counts per-task calls that failed
/// and were left for the next run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteSyncResult {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
}

impl fmt::Display for RemoteSyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} task(s) created, {} task(s) updated, and {} task(s) deleted.",
            self.created, self.updated, self.deleted
        )?;
        if self.skipped > 0 {
            write!(f, " {} change(s) skipped.", self.skipped)?;
        }
        Ok(())
    }
}

/// Undo the escaping the platform applies to stored descriptions.
pub fn unescape_description(text: &str) -> String {
    text.replace("\\_", "_").replace("&amp;", "&")
}

/// Normalize a stored description so it can be compared with a freshly
/// rendered one.
pub fn cleanse_description(text: &str) -> String {
    unescape_description(text)
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
        .replace("\\*", "*")
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len()
        && text.is_char_boundary(prefix.len())
        && text[..prefix.len()].eq_ignore_ascii_case(prefix)
}

fn same_assignees(task: &Task, wanted: &[Uuid]) -> bool {
    let mut current: Vec<Uuid> = task.assignees.iter().filter_map(|a| a.id).collect();
    let mut wanted = wanted.to_vec();
    current.sort();
    wanted.sort();
    current == wanted
}

fn claims(task: &Task, remote: &RemoteTask) -> bool {
    unescape_description(task.description.as_deref().unwrap_or_default())
        .contains(&remote.unique_id)
}

/// Bring `project`'s tasks in line with `remote`.
///
/// New remote tasks are created in one bulk call, and a failure there is
/// fatal. Failed per-task updates, assignee replacements, and deletions are
/// logged and counted as skipped.
pub fn sync_remote_tasks(
    api: &dyn ProjectManagerApi,
    project: &Project,
    remote: &[RemoteTask],
    page_size: usize,
) -> Result<RemoteSyncResult, SyncError> {
    let project_id = require_id(EntityKind::Project, project.id, &project.name)?;
    let existing = fetch_all(page_size, &Query::filtered(format!("projectId eq {project_id}")), |q| {
        api.query_tasks(q)
    })
    .api_context(&format!("Loading tasks of project '{}'", project.name))?;
    tracing::info!("Found {} tasks in project '{}'.", existing.len(), project.name);

    let mut claimed = vec![false; existing.len()];
    let mut creates = Vec::new();
    let mut updates: Vec<(Uuid, TaskUpdate)> = Vec::new();
    let mut result = RemoteSyncResult::default();

    for item in remote {
        let matched = existing
            .iter()
            .enumerate()
            .find(|(_, task)| task.id.is_some() && claims(task, item));
        let Some((index, task)) = matched else {
            tracing::debug!("new remote task {}", item.name);
            creates.push(TaskCreate {
                name: item.name.clone(),
                description: Some(item.description.clone()),
                assignees: item.assignees.clone(),
                ..TaskCreate::default()
            });
            continue;
        };
        claimed[index] = true;
        let id = require_id(EntityKind::Task, task.id, &task.name)?;

        let current = cleanse_description(task.description.as_deref().unwrap_or_default());
        if !starts_with_ignore_case(&current, &item.description) {
            updates.push((
                id,
                TaskUpdate {
                    name: Some(item.name.clone()),
                    description: Some(item.description.clone()),
                    ..TaskUpdate::default()
                },
            ));
        }

        if !same_assignees(task, &item.assignees) {
            let body: Vec<AssigneeUpsert> =
                item.assignees.iter().map(|id| AssigneeUpsert { id: *id }).collect();
            if let Err(err) = api.replace_task_assignees(id, &body) {
                tracing::warn!("could not reassign task {}: {err}", task.name);
                result.skipped += 1;
            }
        }
    }

    if !creates.is_empty() {
        tracing::info!("Creating {} new tasks...", creates.len());
        api.create_many_tasks(project_id, &creates)
            .api_context(&format!("Creating tasks in project '{}'", project.name))?;
        result.created = creates.len();
    }

    let stale: Vec<&Task> = existing
        .iter()
        .zip(&claimed)
        .filter(|(_, claimed)| !**claimed)
        .map(|(task, _)| task)
        .collect();
    if !stale.is_empty() {
        tracing::info!("Deleting {} closed tasks...", stale.len());
    }
    for task in stale {
        let Some(id) = task.id else { continue };
        match api.delete_task(id) {
            Ok(()) => {
                tracing::info!("Removed completed task {}.", task.name);
                result.deleted += 1;
            }
            Err(err) => {
                tracing::warn!("could not remove task {}: {err}", task.name);
                result.skipped += 1;
            }
        }
    }

    for (id, update) in &updates {
        match api.update_task(*id, update) {
            Ok(()) => result.updated += 1,
            Err(err) => {
                tracing::warn!("could not update task {id}: {err}");
                result.skipped += 1;
            }
        }
    }
    Ok(result)
}
