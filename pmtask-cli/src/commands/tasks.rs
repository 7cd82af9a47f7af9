//! `pmtask list-tasks`, `pmtask query-tasks`, `pmtask create-task`

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use pmtask_client::models::{Task, TaskCreate};
use pmtask_client::{fetch_all, ProjectManagerApi, Query};
use pmtask_core::wbs::compare_outline;
use pmtask_sync::{describe_project, find_project};

use crate::commands::AppContext;
use crate::output::{display_opt, print_records};

#[derive(Debug, Serialize, Tabled)]
pub struct TaskRow {
    #[tabled(display_with = "display_opt")]
    pub wbs: Option<String>,
    #[tabled(rename = "short id", display_with = "display_opt")]
    pub short_id: Option<String>,
    pub name: String,
    #[tabled(rename = "% complete", display_with = "display_opt")]
    pub percent_complete: Option<i32>,
    #[tabled(display_with = "display_opt")]
    pub status: Option<String>,
    #[tabled(display_with = "display_opt")]
    pub id: Option<Uuid>,
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            wbs: task.wbs.clone(),
            short_id: task.short_id.clone(),
            name: task.name.clone(),
            percent_complete: task.percent_complete,
            status: task.status.as_ref().and_then(|s| s.name.clone()),
            id: task.id,
        }
    }
}

fn sort_by_outline(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| compare_outline(a.wbs(), b.wbs()).then_with(|| a.id.cmp(&b.id)));
}

fn print_tasks(ctx: &AppContext, tasks: &[Task]) -> Result<()> {
    let rows: Vec<TaskRow> = tasks.iter().map(TaskRow::from).collect();
    print_records(ctx.format, &rows)?;
    if ctx.format.is_text() {
        println!("Total {} tasks.", rows.len());
    }
    Ok(())
}

#[derive(Args, Debug)]
pub struct ListTasksArgs {
    /// Project id, short id, or name.
    #[arg(long, alias = "pmproject")]
    pub project: String,
}

impl ListTasksArgs {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        let client = ctx.connect()?;
        let project = find_project(&client, &self.project)?;
        let id = project
            .id
            .with_context(|| format!("project '{}' has no id", project.name))?;
        let mut tasks = fetch_all(
            ctx.settings.page_size,
            &Query::filtered(format!("projectId eq {id}")),
            |q| client.query_tasks(q),
        )
        .with_context(|| format!("failed to list tasks of '{}'", project.name))?;
        sort_by_outline(&mut tasks);

        if ctx.format.is_text() {
            println!("Project {}", describe_project(&project));
        }
        print_tasks(ctx, &tasks)
    }
}

#[derive(Args, Debug)]
pub struct QueryTasksArgs {
    /// OData filter, e.g. "percentComplete lt 100".
    #[arg(long, alias = "query")]
    pub filter: String,
}

impl QueryTasksArgs {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        let client = ctx.connect()?;
        let tasks = fetch_all(
            ctx.settings.page_size,
            &Query::filtered(self.filter.as_str()),
            |q| client.query_tasks(q),
        )
        .with_context(|| format!("failed to query tasks with '{}'", self.filter))?;
        print_tasks(ctx, &tasks)
    }
}

#[derive(Args, Debug)]
pub struct CreateTaskArgs {
    /// Project id, short id, or name.
    #[arg(long, alias = "pmproject")]
    pub project: String,

    #[arg(long)]
    pub name: String,

    #[arg(long, alias = "desc")]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreatedRow {
    name: String,
    id: Option<Uuid>,
}

impl CreateTaskArgs {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        let client = ctx.connect()?;
        let project = find_project(&client, &self.project)?;
        let project_id = project
            .id
            .with_context(|| format!("project '{}' has no id", project.name))?;
        let body = TaskCreate {
            name: self.name.clone(),
            description: self.description,
            ..TaskCreate::default()
        };
        let created = client
            .create_task(project_id, &body)
            .with_context(|| format!("failed to create task in '{}'", project.name))?;

        if ctx.format.is_text() {
            println!(
                "Created task {}: {}",
                self.name,
                created.id.map(|id| id.to_string()).unwrap_or_default()
            );
            return Ok(());
        }
        let row = CreatedRow {
            name: self.name,
            id: created.id,
        };
        crate::output::write_records(ctx.format, &[row], &mut std::io::stdout().lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(wbs: &str, n: u128) -> Task {
        Task {
            id: Some(Uuid::from_u128(n)),
            name: format!("task {wbs}"),
            wbs: Some(wbs.to_string()),
            ..Task::default()
        }
    }

    #[test]
    fn tasks_sort_in_outline_order() {
        let mut tasks = vec![task("2", 1), task("1.10", 2), task("1.2", 3), task("1", 4)];
        sort_by_outline(&mut tasks);
        let order: Vec<&str> = tasks.iter().map(Task::wbs).collect();
        assert_eq!(order, vec!["1", "1.2", "1.10", "2"]);
    }

    #[test]
    fn rows_carry_status_name() {
        let mut t = task("1", 1);
        t.status = Some(pmtask_client::models::NamedRef {
            id: None,
            name: Some("Done".into()),
        });
        t.percent_complete = Some(100);
        let row = TaskRow::from(&t);
        assert_eq!(row.status.as_deref(), Some("Done"));
        assert_eq!(row.percent_complete, Some(100));
    }
}
