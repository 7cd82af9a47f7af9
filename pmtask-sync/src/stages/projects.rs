//! Projects, and the task statuses each project owns.

use pmtask_client::models::{
    NamedRef, Project, ProjectCreate, TaskStatus, TaskStatusCreate, TaskStatusUpdate,
};
use pmtask_client::{fetch_all, Query};
use pmtask_core::{reconcile, Capabilities, EntityKind, IdentityMap, Keyed, Strategy, SyncResult};

use super::{created_key, key_of, optional_mapping, require_id, StageContext};
use crate::error::{ApiResultExt, SyncError};
use crate::progress::{Stage, StageSummary};

struct ProjectRules;

fn ref_name(r: &Option<NamedRef>) -> Option<&str> {
    r.as_ref().and_then(|r| r.name.as_deref())
}

impl Keyed<Project> for ProjectRules {
    fn identity(&self, record: &Project) -> String {
        record.name.clone()
    }

    fn primary_key(&self, record: &Project) -> String {
        key_of(record.id)
    }
}

impl Strategy<Project> for ProjectRules {
    fn equals(&self, src: &Project, dest: &Project) -> bool {
        src.name == dest.name
            && src.hourly_rate == dest.hourly_rate
            && src.budget == dest.budget
            && src.description == dest.description
            && ref_name(&src.folder) == ref_name(&dest.folder)
            && ref_name(&src.charge_code) == ref_name(&dest.charge_code)
            && ref_name(&src.customer) == ref_name(&dest.customer)
            && src.status.as_ref().map(|s| &s.name) == dest.status.as_ref().map(|s| &s.name)
            && ref_name(&src.priority) == ref_name(&dest.priority)
            && src.status_update == dest.status_update
    }
}

fn project_create(project: &Project, map: &IdentityMap) -> ProjectCreate {
    let status = project.status.as_ref().map(|s| NamedRef {
        id: s.id,
        name: Some(s.name.clone()),
    });
    ProjectCreate {
        name: project.name.clone(),
        description: project.description.clone(),
        hourly_rate: project.hourly_rate,
        budget: project.budget,
        status_update: project.status_update.clone(),
        folder_id: optional_mapping(map, EntityKind::ProjectFolder, project.folder.as_ref()),
        charge_code_id: optional_mapping(
            map,
            EntityKind::ProjectChargeCode,
            project.charge_code.as_ref(),
        ),
        manager_id: optional_mapping(map, EntityKind::Resource, project.manager.as_ref()),
        customer_id: optional_mapping(map, EntityKind::Customer, project.customer.as_ref()),
        status_id: optional_mapping(map, EntityKind::ProjectStatus, status.as_ref()),
        priority_id: optional_mapping(map, EntityKind::ProjectPriority, project.priority.as_ref()),
    }
}

/// Clone live projects. Returns the source projects for the per-project
/// stages that follow.
pub(crate) fn sync_projects(cx: &mut StageContext<'_>) -> Result<Vec<Project>, SyncError> {
    let live = Query::filtered("status/isDeleted eq false");
    let src = fetch_all(cx.page_size, &live, |q| cx.src.query_projects(q))
        .api_context("Fetching projects from source")?;
    let dest_projects = fetch_all(cx.page_size, &Query::new(), |q| cx.dest.query_projects(q))
        .api_context("Fetching projects from destination")?;
    cx.started(Stage::Projects, src.len());

    let dest = cx.dest;
    let capabilities = Capabilities::create_delete(
        move |project: &Project, map: &IdentityMap| {
            let created = dest
                .create_project(&project_create(project, map))
                .api_context(&format!("Creating project '{}'", project.name))?;
            created_key(created, EntityKind::Project, &project.name)
        },
        move |project: &Project| {
            let id = require_id(EntityKind::Project, project.id, &project.name)?;
            dest.delete_project(id, true)
                .api_context(&format!("Deleting project '{}'", project.name))
        },
    );
    let result = reconcile(
        EntityKind::Project,
        &src,
        &dest_projects,
        &mut cx.map,
        &ProjectRules,
        capabilities,
    )?;
    cx.finished(StageSummary::synced(Stage::Projects, src.len(), result));
    Ok(src)
}

// ---------------------------------------------------------------------------
// Task statuses
// ---------------------------------------------------------------------------

struct TaskStatusRules<'p> {
    project: &'p str,
}

impl Keyed<TaskStatus> for TaskStatusRules<'_> {
    fn identity(&self, record: &TaskStatus) -> String {
        format!("{} - {}", self.project, record.name)
    }

    fn primary_key(&self, record: &TaskStatus) -> String {
        key_of(record.id)
    }
}

impl Strategy<TaskStatus> for TaskStatusRules<'_> {
    // `isDone` cannot be written through the API, so it is not compared.
    fn equals(&self, src: &TaskStatus, dest: &TaskStatus) -> bool {
        src.name == dest.name && src.order == dest.order
    }
}

pub(crate) fn sync_task_statuses(
    cx: &mut StageContext<'_>,
    src_projects: &[Project],
) -> Result<(), SyncError> {
    cx.started(Stage::TaskStatuses, src_projects.len());
    let mut total = SyncResult::default();
    for project in src_projects {
        let Some(dest_project) = cx.map.map_key_guid(EntityKind::Project, project.id) else {
            cx.note(&format!("No destination project found for {}", project.name));
            continue;
        };
        let src_project = require_id(EntityKind::Project, project.id, &project.name)?;
        let src = cx
            .src
            .list_task_statuses(src_project)
            .api_context(&format!("Fetching task statuses of '{}' from source", project.name))?;
        let dest_statuses = cx
            .dest
            .list_task_statuses(dest_project)
            .api_context(&format!(
                "Fetching task statuses of '{}' from destination",
                project.name
            ))?;

        let dest = cx.dest;
        let capabilities = Capabilities::full(
            move |status: &TaskStatus, _: &IdentityMap| {
                let body = TaskStatusCreate {
                    name: status.name.clone(),
                    order: status.order,
                    is_done: status.is_done,
                };
                let created = dest
                    .create_task_status(dest_project, &body)
                    .api_context(&format!("Creating task status '{}'", status.name))?;
                created_key(created, EntityKind::TaskStatus, &status.name)
            },
            move |src_status: &TaskStatus, dest_status: &TaskStatus, _: &IdentityMap| {
                let body = TaskStatusUpdate {
                    id: require_id(EntityKind::TaskStatus, dest_status.id, &dest_status.name)?,
                    name: src_status.name.clone(),
                    order: src_status.order,
                };
                dest.update_task_status(dest_project, &body)
                    .api_context(&format!("Updating task status '{}'", dest_status.name))
            },
            move |status: &TaskStatus| {
                let id = require_id(EntityKind::TaskStatus, status.id, &status.name)?;
                dest.delete_task_status(dest_project, id)
                    .api_context(&format!("Deleting task status '{}'", status.name))
            },
        );
        let rules = TaskStatusRules {
            project: &project.name,
        };
        total += reconcile(
            EntityKind::TaskStatus,
            &src,
            &dest_statuses,
            &mut cx.map,
            &rules,
            capabilities,
        )?;
    }
    cx.finished(StageSummary::synced(Stage::TaskStatuses, src_projects.len(), total));
    Ok(())
}
