//! Passes that run once every task exists in the destination.

use std::collections::BTreeSet;

use pmtask_client::models::{NameBody, Task};
use pmtask_client::ProjectManagerApi;
use pmtask_core::wbs::is_descendant;
use pmtask_core::{EntityKind, IdentityMap, SyncResult};

use crate::error::{ApiResultExt, SyncError};
use crate::progress::Progress;
use crate::stages::tasks::by_outline;

/// Rebuild the task hierarchy under every source summary task.
///
/// The API inserts a re-parented task as the parent's first child, so the
/// descendants are applied deepest-outline first. Children whose destination
/// copy already sits at the source outline position are left alone.
///
/// `src_tasks` must be in outline order; `dest_before` is the destination
/// snapshot taken before tasks were reconciled. Returns the number of
/// re-parent calls made.
pub fn reparent_tasks(
    dest: &dyn ProjectManagerApi,
    map: &IdentityMap,
    src_tasks: &[Task],
    dest_before: &[Task],
    progress: &mut dyn Progress,
) -> Result<usize, SyncError> {
    let mut changes = 0;
    for parent in src_tasks.iter().filter(|t| t.is_summary == Some(true)) {
        let Some(dest_parent) = map.map_key_guid(EntityKind::Task, parent.id) else {
            progress.note(&format!("No destination task found for {}", parent.name));
            continue;
        };

        let mut children: Vec<&Task> = src_tasks
            .iter()
            .filter(|t| t.project_id == parent.project_id && is_descendant(t.wbs(), parent.wbs()))
            .collect();
        children.sort_by(|a, b| by_outline(a, b));
        children.reverse();

        for child in children {
            let Some(dest_child) = map.map_key_guid(EntityKind::Task, child.id) else {
                progress.note(&format!("No destination task found for {}", child.name));
                continue;
            };
            let in_place = dest_before
                .iter()
                .find(|t| t.id == Some(dest_child))
                .is_some_and(|t| t.wbs == child.wbs);
            if in_place {
                continue;
            }
            dest.add_parent_task(dest_child, dest_parent)
                .api_context(&format!("Indenting '{}' under '{}'", child.name, parent.name))?;
            changes += 1;
        }
    }
    Ok(changes)
}

fn tag_names(task: &Task) -> BTreeSet<&str> {
    task.tags.iter().map(|t| t.name.as_str()).collect()
}

#[derive(Debug, PartialEq)]
enum TagChange<'a> {
    Replace(Vec<&'a str>),
    Remove(Vec<&'a str>),
}

/// The single call that turns `current` into `wanted`, if any.
fn tag_change<'a>(
    wanted: &BTreeSet<&'a str>,
    current: &BTreeSet<&'a str>,
) -> Option<TagChange<'a>> {
    if wanted == current {
        None
    } else if wanted.is_empty() {
        Some(TagChange::Remove(current.iter().copied().collect()))
    } else {
        Some(TagChange::Replace(wanted.iter().copied().collect()))
    }
}

/// Make each destination task carry exactly its source task's tag names.
///
/// The API only offers replace-all and remove-all, so a task whose tag set
/// differs at all gets its whole set replaced. Returns tags written as
/// creates and tags removed as deletes.
pub fn replicate_tags(
    dest: &dyn ProjectManagerApi,
    map: &IdentityMap,
    src_tasks: &[Task],
    dest_before: &[Task],
    progress: &mut dyn Progress,
) -> Result<SyncResult, SyncError> {
    let mut result = SyncResult::default();
    for task in src_tasks {
        let Some(dest_id) = map.map_key_guid(EntityKind::Task, task.id) else {
            progress.note(&format!("No destination task found for {}", task.name));
            continue;
        };
        // Tasks created in this run are not in the snapshot and start untagged.
        let existing = dest_before.iter().find(|t| t.id == Some(dest_id));
        let wanted = tag_names(task);
        let current = existing.map(tag_names).unwrap_or_default();

        match tag_change(&wanted, &current) {
            None => {}
            Some(TagChange::Remove(names)) => {
                let remove: Vec<NameBody> = names.into_iter().map(NameBody::new).collect();
                dest.remove_task_tags(dest_id, &remove)
                    .api_context(&format!("Removing tags from '{}'", task.name))?;
                result.deletes += remove.len();
            }
            Some(TagChange::Replace(names)) => {
                let replace: Vec<NameBody> = names.into_iter().map(NameBody::new).collect();
                dest.replace_task_tags(dest_id, &replace)
                    .api_context(&format!("Replacing tags on '{}'", task.name))?;
                result.creates += replace.len();
            }
        }
    }
    Ok(result)
}
