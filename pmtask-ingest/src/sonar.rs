//! SonarCloud security hotspots and code issues.

use std::thread;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use pmtask_core::RemoteTask;

use crate::error::IngestError;
use crate::render::TaskRenderer;

pub const SONARCLOUD_API: &str = "https://sonarcloud.io/api";
pub const SONARCLOUD_WEB: &str = "https://sonarcloud.io";

/// Every this many pages the pager waits before the next request.
const PAUSE_EVERY: u32 = 10;
const RATE_LIMIT_PAUSE: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub page_index: u32,
    pub page_size: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub key: String,
    pub component: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub security_category: String,
    #[serde(default)]
    pub vulnerability_probability: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub creation_date: String,
    #[serde(default)]
    pub update_date: String,
    #[serde(default)]
    pub rule_key: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub key: String,
    #[serde(default)]
    pub rule: String,
    #[serde(default)]
    pub severity: String,
    pub component: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub creation_date: String,
    #[serde(default)]
    pub update_date: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct HotspotPage {
    pub paging: Paging,
    #[serde(default)]
    pub hotspots: Vec<Hotspot>,
}

#[derive(Debug, Deserialize)]
pub struct IssuePage {
    pub paging: Paging,
    #[serde(default)]
    pub issues: Vec<Issue>,
}

/// One page of a Sonar search response.
pub trait SonarPage {
    type Item;
    fn paging(&self) -> &Paging;
    fn into_items(self) -> Vec<Self::Item>;
}

impl SonarPage for HotspotPage {
    type Item = Hotspot;
    fn paging(&self) -> &Paging {
        &self.paging
    }
    fn into_items(self) -> Vec<Hotspot> {
        self.hotspots
    }
}

impl SonarPage for IssuePage {
    type Item = Issue;
    fn paging(&self) -> &Paging {
        &self.paging
    }
    fn into_items(self) -> Vec<Issue> {
        self.issues
    }
}

/// Request pages `1, 2, ...` until one comes back shorter than its own
/// declared page size. Sleeps `pause` before every tenth page.
pub fn fetch_pages<P, F>(pause: Duration, mut fetch: F) -> Result<Vec<P::Item>, IngestError>
where
    P: SonarPage,
    F: FnMut(u32) -> Result<P, IngestError>,
{
    let mut items = Vec::new();
    let mut page_number = 1;
    loop {
        if page_number % PAUSE_EVERY == 0 && !pause.is_zero() {
            thread::sleep(pause);
        }
        let page = fetch(page_number)?;
        let page_size = page.paging().page_size as usize;
        let batch = page.into_items();
        let short = batch.len() < page_size || batch.is_empty();
        items.extend(batch);
        if short {
            return Ok(items);
        }
        page_number += 1;
    }
}

/// Blocking SonarCloud web API client.
pub struct SonarClient {
    agent: ureq::Agent,
    base_url: String,
    token: String,
    pause: Duration,
}

impl SonarClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(SONARCLOUD_API, token)
    }

    pub fn with_base_url(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("pmtask/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            pause: RATE_LIMIT_PAUSE,
        }
    }

    /// Override the pause taken every tenth page.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<T, IngestError> {
        let endpoint = format!("GET {path}");
        let mut request = self
            .agent
            .get(&format!("{}{path}", self.base_url))
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/json");
        for (key, value) in params {
            request = request.query(key, value);
        }
        tracing::debug!("{endpoint} {params:?}");
        match request.call() {
            Ok(response) => response
                .into_json::<T>()
                .map_err(|source| IngestError::Decode { endpoint, source }),
            Err(ureq::Error::Status(status, response)) => {
                let message = response
                    .into_string()
                    .unwrap_or_else(|_| "no error details".to_string());
                Err(IngestError::Status {
                    endpoint,
                    status,
                    message,
                })
            }
            Err(ureq::Error::Transport(transport)) => Err(IngestError::Transport {
                endpoint,
                message: transport.to_string(),
            }),
        }
    }

    pub fn hotspots(&self, project: &str) -> Result<Vec<Hotspot>, IngestError> {
        fetch_pages(self.pause, |page| {
            self.get::<HotspotPage>(
                "/hotspots/search",
                &[("projectKey", project.to_string()), ("p", page.to_string())],
            )
        })
    }

    pub fn issues(&self, project: &str) -> Result<Vec<Issue>, IngestError> {
        fetch_pages(self.pause, |page| {
            self.get::<IssuePage>(
                "/issues/search",
                &[("projects", project.to_string()), ("p", page.to_string())],
            )
        })
    }

    /// Hotspots followed by issues, rendered as remote tasks.
    pub fn fetch_tasks(
        &self,
        project: &str,
        renderer: &TaskRenderer,
    ) -> Result<Vec<RemoteTask>, IngestError> {
        let hotspots = self.hotspots(project)?;
        let issues = self.issues(project)?;
        tracing::info!(
            "SonarCloud project {project}: {} hotspots, {} issues",
            hotspots.len(),
            issues.len()
        );
        let mut tasks = Vec::with_capacity(hotspots.len() + issues.len());
        for hotspot in &hotspots {
            tasks.push(renderer.hotspot(hotspot, project)?);
        }
        for issue in &issues {
            tasks.push(renderer.issue(issue, project)?);
        }
        Ok(tasks)
    }
}
