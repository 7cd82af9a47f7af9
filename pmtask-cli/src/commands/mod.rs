//! Subcommand implementations and the plumbing they share.

pub mod clone;
pub mod comments;
pub mod ingest;
pub mod projects;
pub mod tasks;

use anyhow::{Context, Result};
use colored::Colorize;

use pmtask_client::{HttpClient, ProjectManagerApi};

use crate::config::Settings;
use crate::output::OutputFormat;

/// Resolved settings plus the output format every command honours.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub format: OutputFormat,
}

/// Build a client for `env` and check the key by asking who it belongs to.
pub fn connect(env: &str, api_key: &str) -> Result<HttpClient> {
    let client = HttpClient::for_environment(env, api_key)?;
    let me = client
        .me()
        .with_context(|| format!("failed to log on to {}", client.base_url()))?;
    eprintln!(
        "Logged on as {} ({}) in workspace {}.",
        me.email_address.as_deref().unwrap_or("?").bold(),
        me.role_name.as_deref().unwrap_or("?"),
        me.work_space_name.as_deref().unwrap_or("?"),
    );
    tracing::debug!(base_url = client.base_url(), "connected");
    Ok(client)
}

impl AppContext {
    /// Client for the account named by the global flags.
    pub fn connect(&self) -> Result<HttpClient> {
        connect(&self.settings.env, self.settings.api_key()?)
    }
}
