//! Custom fields and their values, for projects and for tasks.
//!
//! Field definitions cannot be edited through the API, so a changed field is
//! replaced. Field values have no delete call; an orphaned value is cleared
//! by writing the empty string.

use pmtask_client::models::{FieldCreate, FieldDefinition, FieldValue, FieldValueUpdate, Project};
use pmtask_client::{fetch_all, Query};
use pmtask_core::{reconcile, Capabilities, EntityKind, IdentityMap, Keyed, Strategy, SyncResult};
use uuid::Uuid;

use super::{key_of, require_id, require_mapping, StageContext};
use crate::error::{ApiResultExt, SyncError};
use crate::progress::{Stage, StageSummary};

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// Field definitions. Task fields belong to a project, so their identity is
/// scoped by project name.
struct FieldRules {
    project_scoped: bool,
}

impl Keyed<FieldDefinition> for FieldRules {
    fn identity(&self, record: &FieldDefinition) -> String {
        match (self.project_scoped, record.project.as_ref().and_then(|p| p.name.as_deref())) {
            (true, Some(project)) => format!("{project} - {}", record.name),
            _ => record.name.clone(),
        }
    }

    fn primary_key(&self, record: &FieldDefinition) -> String {
        key_of(record.id)
    }
}

impl Strategy<FieldDefinition> for FieldRules {
    fn equals(&self, src: &FieldDefinition, dest: &FieldDefinition) -> bool {
        src.name == dest.name
            && src.field_type == dest.field_type
            && src.short_id == dest.short_id
            && src.options == dest.options
    }
}

fn same_value(src: &FieldValue, dest: &FieldValue) -> bool {
    src.short_id == dest.short_id
        && src.name == dest.name
        && src.field_type == dest.field_type
        && src.value == dest.value
}

/// Values of one project's fields.
struct ProjectValueRules<'p> {
    project: &'p str,
}

impl Keyed<FieldValue> for ProjectValueRules<'_> {
    fn identity(&self, record: &FieldValue) -> String {
        format!("{} - {}", self.project, record.name)
    }

    fn primary_key(&self, record: &FieldValue) -> String {
        key_of(record.id)
    }
}

impl Strategy<FieldValue> for ProjectValueRules<'_> {
    fn equals(&self, src: &FieldValue, dest: &FieldValue) -> bool {
        same_value(src, dest)
    }
}

/// Values of task fields, scoped by the owning task's name.
///
/// A value's `id` is its field definition's id, shared by every task that
/// sets the field, so the key pairs it with the owning task.
struct TaskValueRules;

fn task_value_key(task: Option<Uuid>, field: Option<Uuid>) -> String {
    format!("{}:{}", key_of(task), key_of(field))
}

impl Keyed<FieldValue> for TaskValueRules {
    fn identity(&self, record: &FieldValue) -> String {
        let task = record
            .task
            .as_ref()
            .and_then(|t| t.name.as_deref())
            .unwrap_or_default();
        format!("{task} - {}", record.name)
    }

    fn primary_key(&self, record: &FieldValue) -> String {
        task_value_key(record.task.as_ref().and_then(|t| t.id), record.id)
    }
}

impl Strategy<FieldValue> for TaskValueRules {
    fn equals(&self, src: &FieldValue, dest: &FieldValue) -> bool {
        same_value(src, dest)
    }
}

fn field_create(field: &FieldDefinition) -> FieldCreate {
    FieldCreate {
        name: field.name.clone(),
        field_type: field.field_type.clone(),
        short_id: field.short_id.clone(),
        options: field.options.clone(),
    }
}

fn cleared() -> FieldValueUpdate {
    FieldValueUpdate {
        value: Some(String::new()),
    }
}

// ---------------------------------------------------------------------------
// Project fields
// ---------------------------------------------------------------------------

pub(crate) fn sync_project_fields(cx: &mut StageContext<'_>) -> Result<(), SyncError> {
    let src = cx
        .src
        .list_project_fields()
        .api_context("Fetching project fields from source")?;
    let dest_fields = cx
        .dest
        .list_project_fields()
        .api_context("Fetching project fields from destination")?;
    cx.started(Stage::ProjectFields, src.len());

    let dest = cx.dest;
    let capabilities = Capabilities::create_delete(
        move |field: &FieldDefinition, _: &IdentityMap| {
            let created = dest
                .create_project_field(&field_create(field))
                .api_context(&format!("Creating project field '{}'", field.name))?;
            super::created_key(created, EntityKind::ProjectField, &field.name)
        },
        move |field: &FieldDefinition| {
            let id = require_id(EntityKind::ProjectField, field.id, &field.name)?;
            dest.delete_project_field(id)
                .api_context(&format!("Deleting project field '{}'", field.name))
        },
    );
    let rules = FieldRules {
        project_scoped: false,
    };
    let result = reconcile(
        EntityKind::ProjectField,
        &src,
        &dest_fields,
        &mut cx.map,
        &rules,
        capabilities,
    )?;
    cx.finished(StageSummary::synced(Stage::ProjectFields, src.len(), result));
    Ok(())
}

/// Field values of every source project that made it to the destination.
pub(crate) fn sync_project_field_values(
    cx: &mut StageContext<'_>,
    src_projects: &[Project],
) -> Result<(), SyncError> {
    cx.started(Stage::ProjectFieldValues, src_projects.len());
    let mut total = SyncResult::default();
    for project in src_projects {
        let Some(dest_project) = cx.map.map_key_guid(EntityKind::Project, project.id) else {
            cx.note(&format!("No destination project found for {}", project.name));
            continue;
        };
        let src_project = require_id(EntityKind::Project, project.id, &project.name)?;
        let src = cx
            .src
            .list_project_field_values(src_project)
            .api_context(&format!("Fetching field values of '{}' from source", project.name))?;
        let dest_values = cx
            .dest
            .list_project_field_values(dest_project)
            .api_context(&format!(
                "Fetching field values of '{}' from destination",
                project.name
            ))?;

        let dest = cx.dest;
        let capabilities = Capabilities::full(
            move |value: &FieldValue, map: &IdentityMap| {
                let field = require_mapping(map, EntityKind::ProjectField, value.id, &value.name)?;
                let body = FieldValueUpdate {
                    value: value.value.clone(),
                };
                dest.update_project_field_value(dest_project, field, &body)
                    .api_context(&format!("Setting project field '{}'", value.name))?;
                Ok(Some(field.to_string()))
            },
            move |src_value: &FieldValue, dest_value: &FieldValue, _: &IdentityMap| {
                let field = require_id(EntityKind::ProjectField, dest_value.id, &dest_value.name)?;
                let body = FieldValueUpdate {
                    value: src_value.value.clone(),
                };
                dest.update_project_field_value(dest_project, field, &body)
                    .api_context(&format!("Updating project field '{}'", dest_value.name))
            },
            move |value: &FieldValue| {
                let field = require_id(EntityKind::ProjectField, value.id, &value.name)?;
                dest.update_project_field_value(dest_project, field, &cleared())
                    .api_context(&format!("Clearing project field '{}'", value.name))
            },
        );
        let rules = ProjectValueRules {
            project: &project.name,
        };
        total += reconcile(
            EntityKind::ProjectFieldValue,
            &src,
            &dest_values,
            &mut cx.map,
            &rules,
            capabilities,
        )?;
    }
    cx.finished(StageSummary::synced(
        Stage::ProjectFieldValues,
        src_projects.len(),
        total,
    ));
    Ok(())
}

// ---------------------------------------------------------------------------
// Task fields
// ---------------------------------------------------------------------------

pub(crate) fn sync_task_fields(cx: &mut StageContext<'_>) -> Result<(), SyncError> {
    let all = fetch_all(cx.page_size, &Query::new(), |q| cx.src.query_task_fields(q))
        .api_context("Fetching task fields from source")?;
    let dest_fields = fetch_all(cx.page_size, &Query::new(), |q| cx.dest.query_task_fields(q))
        .api_context("Fetching task fields from destination")?;

    // Fields of projects that were not cloned (deleted projects) stay behind.
    let (src, skipped): (Vec<_>, Vec<_>) = all.into_iter().partition(|f| {
        cx.map
            .map_key_guid(EntityKind::Project, f.project.as_ref().and_then(|p| p.id))
            .is_some()
    });
    if !skipped.is_empty() {
        tracing::debug!("skipping {} task field(s) of uncloned projects", skipped.len());
    }
    cx.started(Stage::TaskFields, src.len());

    let dest = cx.dest;
    let capabilities = Capabilities::create_delete(
        move |field: &FieldDefinition, map: &IdentityMap| {
            let project = require_mapping(
                map,
                EntityKind::Project,
                field.project.as_ref().and_then(|p| p.id),
                &field.name,
            )?;
            let created = dest
                .create_task_field(project, &field_create(field))
                .api_context(&format!("Creating task field '{}'", field.name))?;
            super::created_key(created, EntityKind::TaskField, &field.name)
        },
        move |field: &FieldDefinition| {
            let project = require_id(
                EntityKind::Project,
                field.project.as_ref().and_then(|p| p.id),
                &field.name,
            )?;
            let id = require_id(EntityKind::TaskField, field.id, &field.name)?;
            dest.delete_task_field(project, id)
                .api_context(&format!("Deleting task field '{}'", field.name))
        },
    );
    let rules = FieldRules {
        project_scoped: true,
    };
    let result = reconcile(
        EntityKind::TaskField,
        &src,
        &dest_fields,
        &mut cx.map,
        &rules,
        capabilities,
    )?;
    cx.finished(StageSummary::synced(Stage::TaskFields, src.len(), result));
    Ok(())
}

pub(crate) fn sync_task_field_values(cx: &mut StageContext<'_>) -> Result<(), SyncError> {
    let all = fetch_all(cx.page_size, &Query::new(), |q| {
        cx.src.query_task_field_values(q)
    })
    .api_context("Fetching task field values from source")?;
    let dest_values = fetch_all(cx.page_size, &Query::new(), |q| {
        cx.dest.query_task_field_values(q)
    })
    .api_context("Fetching task field values from destination")?;

    let src: Vec<FieldValue> = all
        .into_iter()
        .filter(|v| {
            cx.map
                .map_key_guid(EntityKind::Task, v.task.as_ref().and_then(|t| t.id))
                .is_some()
        })
        .collect();
    cx.started(Stage::TaskFieldValues, src.len());

    let dest = cx.dest;
    let capabilities = Capabilities::full(
        move |value: &FieldValue, map: &IdentityMap| {
            let task_name = value
                .task
                .as_ref()
                .and_then(|t| t.name.as_deref())
                .unwrap_or_default();
            let task = require_mapping(
                map,
                EntityKind::Task,
                value.task.as_ref().and_then(|t| t.id),
                task_name,
            )?;
            let field = require_mapping(map, EntityKind::TaskField, value.id, &value.name)?;
            let body = FieldValueUpdate {
                value: value.value.clone(),
            };
            dest.update_task_field_value(task, field, &body)
                .api_context(&format!("Setting task field '{}' on '{task_name}'", value.name))?;
            Ok(Some(task_value_key(Some(task), Some(field))))
        },
        move |src_value: &FieldValue, dest_value: &FieldValue, _: &IdentityMap| {
            let (task, field) = value_target(dest_value)?;
            let body = FieldValueUpdate {
                value: src_value.value.clone(),
            };
            dest.update_task_field_value(task, field, &body)
                .api_context(&format!("Updating task field '{}'", dest_value.name))
        },
        move |value: &FieldValue| {
            let (task, field) = value_target(value)?;
            dest.update_task_field_value(task, field, &cleared())
                .api_context(&format!("Clearing task field '{}'", value.name))
        },
    );
    let result = reconcile(
        EntityKind::TaskFieldValue,
        &src,
        &dest_values,
        &mut cx.map,
        &TaskValueRules,
        capabilities,
    )?;
    cx.finished(StageSummary::synced(Stage::TaskFieldValues, src.len(), result));
    Ok(())
}

/// Task and field ids of a destination task field value.
fn value_target(value: &FieldValue) -> Result<(Uuid, Uuid), SyncError> {
    let task = require_id(
        EntityKind::Task,
        value.task.as_ref().and_then(|t| t.id),
        &value.name,
    )?;
    let field = require_id(EntityKind::TaskField, value.id, &value.name)?;
    Ok((task, field))
}

#[cfg(test)]
mod tests {
    use pmtask_client::models::NamedRef;

    use super::*;

    fn field(name: &str, project: Option<&str>) -> FieldDefinition {
        FieldDefinition {
            name: name.into(),
            field_type: Some("Text".into()),
            project: project.map(|p| NamedRef {
                id: None,
                name: Some(p.into()),
            }),
            ..FieldDefinition::default()
        }
    }

    #[test]
    fn task_field_identity_is_scoped_by_project() {
        let scoped = FieldRules {
            project_scoped: true,
        };
        assert_eq!(scoped.identity(&field("Risk", Some("Apollo"))), "Apollo - Risk");
        assert_eq!(scoped.identity(&field("Risk", None)), "Risk");
        let flat = FieldRules {
            project_scoped: false,
        };
        assert_eq!(flat.identity(&field("Risk", Some("Apollo"))), "Risk");
    }

    #[test]
    fn field_options_compare_by_value() {
        let rules = FieldRules {
            project_scoped: false,
        };
        let mut a = field("Risk", None);
        a.options = Some(vec!["Low".into(), "High".into()]);
        let mut b = a.clone();
        assert!(rules.equals(&a, &b));
        b.options = Some(vec!["High".into(), "Low".into()]);
        assert!(!rules.equals(&a, &b));
    }

    #[test]
    fn task_values_of_one_field_have_distinct_keys_per_task() {
        let effort = Some(Uuid::from_u128(7));
        let value = |task: u128, name: &str| FieldValue {
            id: effort,
            name: "Effort".into(),
            value: Some("3".into()),
            task: Some(NamedRef {
                id: Some(Uuid::from_u128(task)),
                name: Some(name.into()),
            }),
            ..FieldValue::default()
        };
        let sketch = value(1, "Sketch");
        let review = value(2, "Review");

        assert_ne!(
            TaskValueRules.primary_key(&sketch),
            TaskValueRules.primary_key(&review)
        );
        assert_eq!(
            TaskValueRules.primary_key(&sketch),
            format!("{}:{}", Uuid::from_u128(1), Uuid::from_u128(7))
        );
        assert_eq!(TaskValueRules.identity(&review), "Review - Effort");
    }

    #[test]
    fn project_value_identity_uses_the_owning_project() {
        let rules = ProjectValueRules { project: "Apollo" };
        let value = FieldValue {
            name: "Budget code".into(),
            ..FieldValue::default()
        };
        assert_eq!(rules.identity(&value), "Apollo - Budget code");
    }
}
