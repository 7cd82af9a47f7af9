//! `pmtask sonarcloud`, `pmtask git-blame-files`

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use pmtask_core::RemoteTask;
use pmtask_ingest::{collect_file_tasks, folder_or_default, SonarClient, TaskRenderer};
use pmtask_sync::{find_project, sync_remote_tasks, RemoteSyncResult};

use crate::commands::AppContext;
use crate::output::write_records;

#[derive(Debug, Serialize)]
struct SyncRow {
    project: String,
    created: usize,
    updated: usize,
    deleted: usize,
    skipped: usize,
}

fn renderer(ctx: &AppContext) -> Result<TaskRenderer> {
    TaskRenderer::new(ctx.settings.template_dir.as_deref()).context("failed to load task templates")
}

/// Mirror `remote` into the named project and report the outcome.
fn push_tasks(ctx: &AppContext, project: &str, remote: &[RemoteTask]) -> Result<()> {
    let client = ctx.connect()?;
    let project = find_project(&client, project)?;
    eprintln!("Syncing with ProjectManager Project '{}'...", project.name);

    let result: RemoteSyncResult =
        sync_remote_tasks(&client, &project, remote, ctx.settings.page_size)?;

    if ctx.format.is_text() {
        println!("{result}");
        return Ok(());
    }
    let row = SyncRow {
        project: project.name,
        created: result.created,
        updated: result.updated,
        deleted: result.deleted,
        skipped: result.skipped,
    };
    write_records(ctx.format, &[row], &mut std::io::stdout().lock())
}

#[derive(Args, Debug)]
pub struct SonarArgs {
    /// SonarCloud project key.
    #[arg(long, alias = "scproject")]
    pub sonar_project: String,

    /// ProjectManager project id, short id, or name.
    #[arg(long, alias = "pmproject")]
    pub project: String,

    #[arg(long, short = 's', env = "SONAR_TOKEN", hide_env_values = true)]
    pub sonar_token: Option<String>,
}

impl SonarArgs {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        let mut settings = ctx.settings.clone();
        if self.sonar_token.is_some() {
            settings.sonar_token = self.sonar_token;
        }
        let token = settings.sonar_token()?;
        let renderer = renderer(ctx)?;

        let tasks = SonarClient::new(token)
            .fetch_tasks(&self.sonar_project, &renderer)
            .with_context(|| format!("failed to read SonarCloud project '{}'", self.sonar_project))?;
        eprintln!(
            "Found {} findings in SonarCloud project '{}'.",
            tasks.len(),
            self.sonar_project
        );
        push_tasks(ctx, &self.project, &tasks)
    }
}

#[derive(Args, Debug)]
pub struct GitBlameArgs {
    /// Folder to sweep; defaults to the current directory.
    #[arg(long)]
    pub folder: Option<String>,

    /// Comma-separated glob patterns, e.g. "*.cs,*.vb".
    #[arg(long, short = 'p')]
    pub pattern: String,

    /// ProjectManager project id, short id, or name.
    #[arg(long, alias = "pmproject")]
    pub project: String,
}

impl GitBlameArgs {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        let folder = folder_or_default(self.folder.as_deref());
        let tasks = collect_file_tasks(&folder, &self.pattern, &renderer(ctx)?)
            .with_context(|| format!("failed to scan {}", folder.display()))?;
        eprintln!("Found {} matching files in {}.", tasks.len(), folder.display());
        push_tasks(ctx, &self.project, &tasks)
    }
}
