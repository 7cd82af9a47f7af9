//! pmtask: clone ProjectManager accounts and mirror external findings as tasks.
//!
//! # Usage
//!
//! ```text
//! pmtask clone-account --dest-api-key <key> [--dest-env <env>] [--map-output <csv>]
//! pmtask list-projects
//! pmtask list-tasks --project <id|short id|name>
//! pmtask query-tasks --filter <odata>
//! pmtask read-comments --task <short id|id>
//! pmtask add-comment --task <short id|id> --message <text>
//! pmtask create-task --project <project> --name <name> [--description <text>]
//! pmtask sonarcloud --sonar-project <key> --project <project> [--sonar-token <token>]
//! pmtask git-blame-files [--folder <dir>] --pattern <globs> --project <project>
//! ```
//!
//! Global flags: `--api-key`, `--env`, `--format text|csv|tsv|json`, `-v`.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Args, Parser, Subcommand};

use commands::{
    clone::CloneArgs,
    comments::{AddCommentArgs, ReadCommentsArgs},
    ingest::{GitBlameArgs, SonarArgs},
    projects::ListProjectsArgs,
    tasks::{CreateTaskArgs, ListTasksArgs, QueryTasksArgs},
    AppContext,
};
use config::{Overrides, Settings};
use output::OutputFormat;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "pmtask",
    version,
    about = "Clone ProjectManager accounts and sync external findings into tasks",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// API key of the (source) account.
    #[arg(long, short = 'a', alias = "apikey", env = "PM_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// `production` or the base URL of another environment.
    #[arg(long, short = 'e', env = "PM_ENV", global = true)]
    env: Option<String>,

    /// Records requested per page.
    #[arg(long, env = "PM_PAGE_SIZE", global = true)]
    page_size: Option<usize>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    /// Config file to read instead of the default location.
    #[arg(long, env = "PMTASK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy every supported record from this account into another one.
    CloneAccount(CloneArgs),

    /// List active projects.
    ListProjects(ListProjectsArgs),

    /// List the tasks of one project in outline order.
    ListTasks(ListTasksArgs),

    /// List tasks matching an OData filter.
    QueryTasks(QueryTasksArgs),

    /// Show the discussion on a task.
    ReadComments(ReadCommentsArgs),

    /// Post a discussion comment on a task.
    AddComment(AddCommentArgs),

    /// Create one task in a project.
    CreateTask(CreateTaskArgs),

    /// Mirror SonarCloud hotspots and issues into a project.
    #[command(name = "sonarcloud")]
    SonarCloud(SonarArgs),

    /// Mirror one task per matching file into a project.
    GitBlameFiles(GitBlameArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    let file = match cli.global.config.as_deref() {
        Some(path) => config::load_at(path)?,
        None => config::load()?,
    };
    let overrides = Overrides {
        api_key: cli.global.api_key,
        env: cli.global.env,
        page_size: cli.global.page_size,
        ..Overrides::default()
    };
    let ctx = AppContext {
        settings: Settings::resolve(overrides, file),
        format: cli.global.format,
    };

    match cli.command {
        Commands::CloneAccount(args) => args.run(&ctx),
        Commands::ListProjects(args) => args.run(&ctx),
        Commands::ListTasks(args) => args.run(&ctx),
        Commands::QueryTasks(args) => args.run(&ctx),
        Commands::ReadComments(args) => args.run(&ctx),
        Commands::AddComment(args) => args.run(&ctx),
        Commands::CreateTask(args) => args.run(&ctx),
        Commands::SonarCloud(args) => args.run(&ctx),
        Commands::GitBlameFiles(args) => args.run(&ctx),
    }
}
