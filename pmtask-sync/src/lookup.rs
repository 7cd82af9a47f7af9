//! Resolve user-supplied project and task references.

use pmtask_client::models::{Project, Task};
use pmtask_client::{fetch_all, ProjectManagerApi, Query, DEFAULT_PAGE_SIZE};
use uuid::Uuid;

use crate::error::{ApiResultExt, SyncError};

/// `"{short id} - {name} ({id})"`, as shown in candidate lists.
pub fn describe_project(project: &Project) -> String {
    format!(
        "{} - {} ({})",
        project.short_id.as_deref().unwrap_or("-"),
        project.name,
        project.id.map(|id| id.to_string()).unwrap_or_default()
    )
}

fn project_matches(project: &Project, needle: &str) -> bool {
    project.short_id.as_deref() == Some(needle)
        || project.name.eq_ignore_ascii_case(needle)
        || project
            .id
            .is_some_and(|id| id.to_string().eq_ignore_ascii_case(needle))
}

/// Find exactly one project by id, short id, or case-insensitive name.
///
/// All projects are fetched and matched locally so a miss can list what
/// does exist.
pub fn find_project(api: &dyn ProjectManagerApi, needle: &str) -> Result<Project, SyncError> {
    let needle = needle.trim();
    let projects = fetch_all(DEFAULT_PAGE_SIZE, &Query::new(), |q| api.query_projects(q))
        .api_context("Fetching projects")?;
    let mut hits: Vec<&Project> = projects.iter().filter(|p| project_matches(p, needle)).collect();
    match hits.len() {
        1 => Ok(hits.remove(0).clone()),
        0 => Err(SyncError::ProjectNotFound {
            needle: needle.to_string(),
            candidates: projects.iter().map(describe_project).collect(),
        }),
        _ => Err(SyncError::ProjectAmbiguous {
            needle: needle.to_string(),
            candidates: hits.into_iter().map(describe_project).collect(),
        }),
    }
}

/// OData string literal: single quotes doubled.
pub fn odata_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Find a task by id or short id.
pub fn find_task(api: &dyn ProjectManagerApi, needle: &str) -> Result<Task, SyncError> {
    let needle = needle.trim();
    let filter = match Uuid::parse_str(needle) {
        Ok(id) => format!("id eq {id}"),
        Err(_) => format!("shortId eq {}", odata_literal(needle)),
    };
    let tasks = api
        .query_tasks(&Query::filtered(filter).page(1, 0))
        .api_context(&format!("Looking up task '{needle}'"))?;
    tasks
        .into_iter()
        .next()
        .ok_or_else(|| SyncError::TaskNotFound(needle.to_string()))
}
