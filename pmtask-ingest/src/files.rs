//! Folder sweep: one remote task per file matching a set of glob patterns.

use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Utc};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::Serialize;
use walkdir::WalkDir;

use pmtask_core::RemoteTask;

use crate::error::{io_err, IngestError};
use crate::render::TaskRenderer;

/// What the sweep learned about one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFacts {
    /// Full path; doubles as the task's unique id.
    pub path: String,
    pub directory: String,
    pub name: String,
    pub len: u64,
    pub modified: DateTime<Utc>,
    /// `author<email> date` of the last commit touching the file.
    pub last_change: Option<String>,
}

/// Compile a comma-separated pattern list. Blank entries are ignored; an
/// empty list matches nothing.
pub fn parse_patterns(patterns: &str) -> Result<GlobSet, IngestError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        builder.add(GlobBuilder::new(pattern).literal_separator(true).build()?);
    }
    Ok(builder.build()?)
}

/// Last commit on `file` as reported by `git log`, run inside `folder`.
/// `None` when git is missing, the folder is not a repository, or the file
/// has no history.
pub fn git_last_change(folder: &Path, file: &Path) -> Option<String> {
    let output = Command::new("git")
        .arg("log")
        .arg("--pretty=format:%an<%ae> %ad")
        .arg("-n")
        .arg("1")
        .arg(file)
        .current_dir(folder)
        .output()
        .map_err(|e| tracing::debug!("git log {}: {e}", file.display()))
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Walk `folder` and collect facts for each file whose path relative to the
/// folder, or bare file name, matches `patterns`. Results are in walk order
/// (sorted by file name within each directory).
pub fn scan_files(
    folder: &Path,
    patterns: &GlobSet,
    blame: &dyn Fn(&Path, &Path) -> Option<String>,
) -> Result<Vec<FileFacts>, IngestError> {
    let root = folder.canonicalize().map_err(|e| io_err(folder, e))?;
    let mut files = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let rel = path.strip_prefix(&root).unwrap_or(path);
        if !patterns.is_match(rel) && !patterns.is_match(entry.file_name()) {
            continue;
        }
        let meta = entry.metadata()?;
        let modified = meta.modified().map_err(|e| io_err(path, e))?;
        files.push(FileFacts {
            path: path.display().to_string(),
            directory: path
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            name: entry.file_name().to_string_lossy().into_owned(),
            len: meta.len(),
            modified: DateTime::<Utc>::from(modified),
            last_change: blame(&root, path),
        });
    }
    tracing::info!("{} files in {} match", files.len(), root.display());
    Ok(files)
}

/// Sweep `folder` with git metadata and render one task per file.
pub fn collect_file_tasks(
    folder: &Path,
    patterns: &str,
    renderer: &TaskRenderer,
) -> Result<Vec<RemoteTask>, IngestError> {
    let patterns = parse_patterns(patterns)?;
    scan_files(folder, &patterns, &git_last_change)?
        .iter()
        .map(|file| renderer.file(file))
        .collect()
}

/// Folder argument with the `.` default applied.
pub fn folder_or_default(folder: Option<&str>) -> PathBuf {
    match folder.map(str::trim) {
        Some(f) if !f.is_empty() => PathBuf::from(f),
        _ => PathBuf::from("."),
    }
}
