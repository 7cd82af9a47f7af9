//! pmtask ingest library: external sources that produce [`RemoteTask`]s.
//!
//! - [`sonar`]: SonarCloud hotspots and issues
//! - [`files`]: folder sweep with git history
//! - [`render`]: Tera templates for task names and descriptions
//!
//! [`RemoteTask`]: pmtask_core::RemoteTask

pub mod error;
pub mod files;
pub mod render;
pub mod sonar;

pub use error::IngestError;
pub use files::{
    collect_file_tasks, folder_or_default, git_last_change, parse_patterns, scan_files, FileFacts,
};
pub use render::{html_encode, TaskRenderer};
pub use sonar::{fetch_pages, Hotspot, Issue, Paging, SonarClient, SONARCLOUD_API};
