//! `pmtask clone-account`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::Tabled;

use pmtask_sync::{clone_account, CloneOptions, Outcome, Progress, Stage, StageSummary};

use crate::commands::{connect, AppContext};
use crate::output::print_records;

#[derive(Args, Debug)]
pub struct CloneArgs {
    /// API key of the account to copy into.
    #[arg(long, env = "PM_DEST_API_KEY", hide_env_values = true)]
    pub dest_api_key: String,

    /// Environment of the destination account; defaults to the source's.
    #[arg(long, env = "PM_DEST_ENV")]
    pub dest_env: Option<String>,

    /// Where to write the identity map CSV.
    #[arg(long)]
    pub map_output: Option<PathBuf>,
}

/// Prints stage progress to stderr so stdout carries only the report.
struct ConsoleProgress;

impl Progress for ConsoleProgress {
    fn stage_started(&mut self, stage: Stage, attempted: usize) {
        if stage.is_match_only() {
            eprintln!("Comparing {attempted} {stage}.");
        } else {
            eprintln!("Cloning {attempted} {stage}...");
        }
    }

    fn stage_finished(&mut self, summary: &StageSummary) {
        let line = summary.to_string();
        if summary.result().is_empty() {
            eprintln!("  {}", line.bright_black());
        } else {
            eprintln!("  {}", line.green());
        }
    }

    fn note(&mut self, message: &str) {
        eprintln!("  {}", message.yellow());
    }
}

#[derive(Debug, Serialize, Tabled)]
struct StageRow {
    stage: String,
    attempted: usize,
    created: usize,
    updated: usize,
    deleted: usize,
    matched: usize,
}

impl From<&StageSummary> for StageRow {
    fn from(summary: &StageSummary) -> Self {
        let result = summary.result();
        Self {
            stage: summary.stage.to_string(),
            attempted: summary.attempted,
            created: result.creates,
            updated: result.updates,
            deleted: result.deletes,
            matched: match summary.outcome {
                Outcome::Matched(n) => n,
                Outcome::Synced(_) => 0,
            },
        }
    }
}

impl CloneArgs {
    pub fn run(self, ctx: &AppContext) -> Result<()> {
        let src = ctx.connect().context("source account")?;
        let dest_env = self.dest_env.as_deref().unwrap_or(&ctx.settings.env);
        let dest = connect(dest_env, &self.dest_api_key).context("destination account")?;

        let options = CloneOptions {
            page_size: ctx.settings.page_size,
            map_output: Some(self.map_output.unwrap_or_else(|| ctx.settings.map_output.clone())),
        };
        let report = clone_account(&src, &dest, &mut ConsoleProgress, &options)?;

        let rows: Vec<StageRow> = report.stages.iter().map(StageRow::from).collect();
        print_records(ctx.format, &rows)?;
        if ctx.format.is_text() {
            println!("{}", format!("Clone complete. {}", report.totals()).bold());
            if let Some(path) = &options.map_output {
                println!("Identity map written to {}.", path.display());
            }
        }
        Ok(())
    }
}
