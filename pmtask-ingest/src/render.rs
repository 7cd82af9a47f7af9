//! Tera rendering of task names and descriptions for every ingest source.
//!
//! Embedded templates can be overridden per install by dropping a file with
//! the same relative name (e.g. `sonar/hotspot_name.tera`) into the
//! directory passed to [`TaskRenderer::new`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera, Value};

use pmtask_core::RemoteTask;

use crate::error::{io_err, IngestError};
use crate::files::FileFacts;
use crate::sonar::{Hotspot, Issue, SONARCLOUD_WEB};

const TPLS: &[(&str, &str)] = &[
    ("sonar/hotspot_name.tera", include_str!("templates/sonar/hotspot_name.tera")),
    (
        "sonar/hotspot_description.md.tera",
        include_str!("templates/sonar/hotspot_description.md.tera"),
    ),
    ("sonar/issue_name.tera", include_str!("templates/sonar/issue_name.tera")),
    (
        "sonar/issue_description.md.tera",
        include_str!("templates/sonar/issue_description.md.tera"),
    ),
    ("files/name.tera", include_str!("templates/files/name.tera")),
    (
        "files/description.md.tera",
        include_str!("templates/files/description.md.tera"),
    ),
];

/// Escape the five HTML-significant characters.
pub fn html_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn html_encode_filter(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(html_encode(s))),
        Value::Null => Ok(Value::String(String::new())),
        other => Ok(Value::String(html_encode(&other.to_string()))),
    }
}

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, IngestError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut templates = Vec::new();
    for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|s| s.to_str()) != Some("tera")
        {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path);
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        templates.push((normalize_template_name(rel), contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, IngestError> {
    let mut templates: HashMap<String, String> = TPLS
        .iter()
        .map(|(name, content)| (name.to_string(), content.to_string()))
        .collect();
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            tracing::debug!("template override {name}");
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.register_filter("html_encode", html_encode_filter);
    tera.add_raw_templates(templates.into_iter().collect::<Vec<_>>())?;
    Ok(tera)
}

#[derive(Serialize)]
struct SonarContext<'a, T> {
    #[serde(flatten)]
    finding: HashMap<&'static str, &'a T>,
    source: &'a str,
    line: u32,
    link: String,
}

#[derive(Serialize)]
struct FileContext<'a> {
    file: &'a FileFacts,
    modified: String,
}

/// Renders [`RemoteTask`]s from hotspots, issues and scanned files.
pub struct TaskRenderer {
    tera: Tera,
    template_dir: Option<PathBuf>,
}

impl TaskRenderer {
    pub fn new(user_template_dir: Option<&Path>) -> Result<Self, IngestError> {
        Ok(Self {
            tera: build_tera(user_template_dir)?,
            template_dir: user_template_dir.map(Path::to_path_buf),
        })
    }

    /// Directory overrides were loaded from, if any.
    pub fn template_dir(&self) -> Option<&Path> {
        self.template_dir.as_deref()
    }

    fn render(&self, name: &str, context: &Context) -> Result<String, IngestError> {
        let text = self.tera.render(name, context)?;
        Ok(text.trim_end_matches(['\r', '\n']).to_string())
    }

    fn sonar_context<T: Serialize>(
        &self,
        key: &'static str,
        finding: &T,
        component: &str,
        line: Option<u32>,
        project: &str,
        link: String,
    ) -> Result<Context, IngestError> {
        let prefix = format!("{project}:");
        let source = component.strip_prefix(&prefix).unwrap_or(component);
        Ok(Context::from_serialize(SonarContext {
            finding: HashMap::from([(key, finding)]),
            source,
            line: line.unwrap_or(0),
            link,
        })?)
    }

    pub fn hotspot(&self, hotspot: &Hotspot, project: &str) -> Result<RemoteTask, IngestError> {
        let link = format!(
            "{SONARCLOUD_WEB}/project/security_hotspots?id={project}&hotspots={}",
            hotspot.key
        );
        let context = self.sonar_context(
            "hotspot",
            hotspot,
            &hotspot.component,
            hotspot.line,
            project,
            link,
        )?;
        Ok(RemoteTask::new(
            hotspot.key.clone(),
            self.render("sonar/hotspot_name.tera", &context)?,
            self.render("sonar/hotspot_description.md.tera", &context)?,
        ))
    }

    pub fn issue(&self, issue: &Issue, project: &str) -> Result<RemoteTask, IngestError> {
        let link = format!(
            "{SONARCLOUD_WEB}/project/issues?resolved=false&id={project}&open={}",
            issue.key
        );
        let context =
            self.sonar_context("issue", issue, &issue.component, issue.line, project, link)?;
        Ok(RemoteTask::new(
            issue.key.clone(),
            self.render("sonar/issue_name.tera", &context)?,
            self.render("sonar/issue_description.md.tera", &context)?,
        ))
    }

    pub fn file(&self, file: &FileFacts) -> Result<RemoteTask, IngestError> {
        let context = Context::from_serialize(FileContext {
            file,
            modified: file.modified.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        })?;
        Ok(RemoteTask::new(
            file.path.clone(),
            self.render("files/name.tera", &context)?,
            self.render("files/description.md.tera", &context)?,
        ))
    }
}
