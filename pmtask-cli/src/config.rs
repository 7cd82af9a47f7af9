//! Settings resolution: CLI flag > environment > config file > default.
//!
//! Environment variables are folded into the flags by clap (`PM_API_KEY`,
//! `PM_ENV`, `PM_PAGE_SIZE`, `SONAR_TOKEN`), so this module only has to
//! layer flags over the YAML file at `<config dir>/pmtask/config.yaml`.
//!
//! - `load()` derives the path from `dirs::config_dir()`
//! - `load_at(path)` reads an explicit file; a missing file is an empty config

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use pmtask_client::DEFAULT_PAGE_SIZE;

pub const DEFAULT_ENV: &str = "production";
pub const DEFAULT_MAP_OUTPUT: &str = "identity-map.csv";

/// Contents of `config.yaml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub env: Option<String>,
    pub page_size: Option<usize>,
    pub sonar_token: Option<String>,
    pub map_output: Option<PathBuf>,
    /// Directory of `.tera` files overriding the built-in task templates.
    pub template_dir: Option<PathBuf>,
}

/// Values given on the command line (or through their environment variables).
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_key: Option<String>,
    pub env: Option<String>,
    pub page_size: Option<usize>,
    pub sonar_token: Option<String>,
    pub map_output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_key: Option<String>,
    pub env: String,
    pub page_size: usize,
    pub sonar_token: Option<String>,
    pub map_output: PathBuf,
    pub template_dir: Option<PathBuf>,
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pmtask"))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.yaml"))
}

pub fn load() -> Result<FileConfig> {
    match default_config_path() {
        Some(path) => load_at(&path),
        None => Ok(FileConfig::default()),
    }
}

pub fn load_at(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(FileConfig::default());
    }
    serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config {}", path.display()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl Settings {
    pub fn resolve(flags: Overrides, file: FileConfig) -> Self {
        Self {
            api_key: non_blank(flags.api_key).or(non_blank(file.api_key)),
            env: non_blank(flags.env)
                .or(non_blank(file.env))
                .unwrap_or_else(|| DEFAULT_ENV.to_string()),
            page_size: flags
                .page_size
                .or(file.page_size)
                .filter(|n| *n > 0)
                .unwrap_or(DEFAULT_PAGE_SIZE),
            sonar_token: non_blank(flags.sonar_token).or(non_blank(file.sonar_token)),
            map_output: flags
                .map_output
                .or(file.map_output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MAP_OUTPUT)),
            template_dir: file
                .template_dir
                .or_else(|| config_dir().map(|dir| dir.join("templates"))),
        }
    }

    pub fn api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) => Ok(key),
            None => bail!(
                "no API key: pass --api-key, set PM_API_KEY, or add api_key to {}",
                default_config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "config.yaml".to_string())
            ),
        }
    }

    pub fn sonar_token(&self) -> Result<&str> {
        match self.sonar_token.as_deref() {
            Some(token) => Ok(token),
            None => bail!("no SonarCloud token: pass --sonar-token or set SONAR_TOKEN"),
        }
    }
}
