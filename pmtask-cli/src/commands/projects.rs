//! `pmtask list-projects`

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use pmtask_client::models::Project;
use pmtask_client::{fetch_all, ProjectManagerApi, Query};

use crate::commands::AppContext;
use crate::output::{display_opt, print_records};

#[derive(Args, Debug)]
pub struct ListProjectsArgs {
    /// Include projects whose status is deleted.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ProjectRow {
    #[tabled(rename = "short id", display_with = "display_opt")]
    pub short_id: Option<String>,
    pub name: String,
    #[tabled(display_with = "display_opt")]
    pub status: Option<String>,
    #[tabled(display_with = "display_opt")]
    pub customer: Option<String>,
    #[tabled(display_with = "display_opt")]
    pub id: Option<Uuid>,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            short_id: project.short_id.clone(),
            name: project.name.clone(),
            status: project.status.as_ref().map(|s| s.name.clone()),
            customer: project.customer.as_ref().and_then(|c| c.name.clone()),
            id: project.id,
        }
    }
}

impl ListProjectsArgs {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        let client = ctx.connect()?;
        let query = if self.all {
            Query::new()
        } else {
            Query::filtered("status/isDeleted eq false")
        };
        let projects = fetch_all(ctx.settings.page_size, &query, |q| client.query_projects(q))
            .context("failed to list projects")?;

        let rows: Vec<ProjectRow> = projects.iter().map(ProjectRow::from).collect();
        if ctx.format.is_text() {
            println!("Found {} projects:", rows.len());
        }
        print_records(ctx.format, &rows)
    }
}
