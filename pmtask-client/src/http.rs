//! Blocking HTTP implementation of [`ProjectManagerApi`] on top of ureq.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::api::{ApiResult, ProjectManagerApi};
use crate::envelope::ApiResponse;
use crate::error::ApiError;
use crate::models::*;
use crate::paging::Query;

pub const PRODUCTION_URL: &str = "https://api.projectmanager.com";

const API_PREFIX: &str = "/api/data";
const DEFAULT_APP_NAME: &str = "pmtask";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Map an environment name or URL to the API base URL.
///
/// `"production"` (any case) selects the public API; anything that looks
/// like an http(s) URL is used as-is without its trailing slash.
pub fn resolve_base_url(env: &str) -> Result<String, ApiError> {
    let env = env.trim();
    if env.eq_ignore_ascii_case("production") {
        return Ok(PRODUCTION_URL.to_string());
    }
    if env.starts_with("https://") || env.starts_with("http://") {
        return Ok(env.trim_end_matches('/').to_string());
    }
    Err(ApiError::UnknownEnvironment(env.to_string()))
}

pub struct HttpClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    app_name: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("pmtask/", env!("CARGO_PKG_VERSION")))
            .build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }

    /// Build a client for a named environment (see [`resolve_base_url`]).
    pub fn for_environment(env: &str, api_key: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self::new(resolve_base_url(env)?, api_key))
    }

    /// Name reported to the API in the `X-Integration-Name` header.
    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -----------------------------------------------------------------------
    // Transport
    // -----------------------------------------------------------------------

    fn send<T: DeserializeOwned>(
        &self,
        method: &str,
        path: &str,
        params: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> ApiResult<(String, ApiResponse<T>)> {
        let endpoint = format!("{method} {path}");
        let url = format!("{}{API_PREFIX}{path}", self.base_url);
        let mut request = self
            .agent
            .request(method, &url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Accept", "application/json")
            .set("X-Integration-Name", &self.app_name);
        for (key, value) in params {
            request = request.query(key, value);
        }

        tracing::debug!("{endpoint}");
        let result = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };
        match result {
            Ok(response) => {
                let envelope = response
                    .into_json::<ApiResponse<T>>()
                    .map_err(|source| ApiError::Decode {
                        endpoint: endpoint.clone(),
                        source,
                    })?;
                Ok((endpoint, envelope))
            }
            Err(ureq::Error::Status(status, response)) => {
                let message = response
                    .into_json::<ApiResponse<serde_json::Value>>()
                    .map(|r| r.error_message())
                    .unwrap_or_else(|_| "no error details".to_string());
                Err(ApiError::Status {
                    endpoint,
                    status,
                    message,
                })
            }
            Err(ureq::Error::Transport(transport)) => Err(ApiError::Transport {
                endpoint,
                message: transport.to_string(),
            }),
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &Query) -> ApiResult<T> {
        let (endpoint, envelope) = self.send::<T>("GET", path, &query.params(), None)?;
        envelope.into_data(&endpoint)
    }

    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> ApiResult<T> {
        let body = serde_json::to_value(body)?;
        let (endpoint, envelope) = self.send::<T>("POST", path, &[], Some(body))?;
        envelope.into_data(&endpoint)
    }

    fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: Option<&B>) -> ApiResult<()> {
        let body = body.map(serde_json::to_value).transpose()?;
        let (endpoint, envelope) = self.send::<serde_json::Value>("POST", path, &[], body)?;
        envelope.into_unit(&endpoint)
    }

    fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        let body = serde_json::to_value(body)?;
        let (endpoint, envelope) = self.send::<serde_json::Value>("PUT", path, &[], Some(body))?;
        envelope.into_unit(&endpoint)
    }

    fn delete(&self, path: &str, params: &[(&str, String)]) -> ApiResult<()> {
        let (endpoint, envelope) = self.send::<serde_json::Value>("DELETE", path, params, None)?;
        envelope.into_unit(&endpoint)
    }

    fn delete_with_body<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ApiResult<()> {
        let body = serde_json::to_value(body)?;
        let (endpoint, envelope) = self.send::<serde_json::Value>("DELETE", path, &[], Some(body))?;
        envelope.into_unit(&endpoint)
    }
}

impl ProjectManagerApi for HttpClient {
    fn me(&self) -> ApiResult<WorkspaceUser> {
        self.get("/me", &Query::new())
    }

    fn list_customers(&self) -> ApiResult<Vec<NamedItem>> {
        self.get("/projects/customers", &Query::new())
    }

    fn create_customer(&self, body: &NameBody) -> ApiResult<Created> {
        self.post("/projects/customers", body)
    }

    fn update_customer(&self, id: Uuid, body: &NameBody) -> ApiResult<()> {
        self.put(&format!("/projects/customers/{id}"), body)
    }

    fn delete_customer(&self, id: Uuid) -> ApiResult<()> {
        self.delete(&format!("/projects/customers/{id}"), &[])
    }

    fn list_project_priorities(&self) -> ApiResult<Vec<NamedItem>> {
        self.get("/projects/priorities", &Query::new())
    }

    fn list_charge_codes(&self) -> ApiResult<Vec<NamedItem>> {
        self.get("/projects/chargecodes", &Query::new())
    }

    fn list_project_folders(&self) -> ApiResult<Vec<NamedItem>> {
        self.get("/project-folders", &Query::new())
    }

    fn list_project_statuses(&self) -> ApiResult<Vec<ProjectStatus>> {
        self.get("/projects/statuses", &Query::new())
    }

    fn list_project_fields(&self) -> ApiResult<Vec<FieldDefinition>> {
        self.get("/projects/fields", &Query::new())
    }

    fn create_project_field(&self, body: &FieldCreate) -> ApiResult<Created> {
        self.post("/projects/fields", body)
    }

    fn delete_project_field(&self, field_id: Uuid) -> ApiResult<()> {
        self.delete(&format!("/projects/fields/{field_id}"), &[])
    }

    fn list_project_field_values(&self, project_id: Uuid) -> ApiResult<Vec<FieldValue>> {
        self.get(&format!("/projects/{project_id}/fields"), &Query::new())
    }

    fn update_project_field_value(
        &self,
        project_id: Uuid,
        field_id: Uuid,
        body: &FieldValueUpdate,
    ) -> ApiResult<()> {
        self.put(&format!("/projects/{project_id}/fields/{field_id}"), body)
    }

    fn list_resource_skills(&self) -> ApiResult<Vec<NamedItem>> {
        self.get("/resources/skills", &Query::new())
    }

    fn create_resource_skill(&self, body: &NameBody) -> ApiResult<Created> {
        self.post("/resources/skills", body)
    }

    fn update_resource_skill(&self, id: Uuid, body: &NameBody) -> ApiResult<()> {
        self.put(&format!("/resources/skills/{id}"), body)
    }

    fn delete_resource_skill(&self, id: Uuid) -> ApiResult<()> {
        self.delete(&format!("/resources/skills/{id}"), &[])
    }

    fn list_resource_teams(&self) -> ApiResult<Vec<NamedItem>> {
        self.get("/resources/teams", &Query::new())
    }

    fn create_resource_team(&self, body: &NameBody) -> ApiResult<Created> {
        self.post("/resources/teams", body)
    }

    fn update_resource_team(&self, id: Uuid, body: &NameBody) -> ApiResult<()> {
        self.put(&format!("/resources/teams/{id}"), body)
    }

    fn delete_resource_team(&self, id: Uuid) -> ApiResult<()> {
        self.delete(&format!("/resources/teams/{id}"), &[])
    }

    fn query_tags(&self, query: &Query) -> ApiResult<Vec<Tag>> {
        self.get("/tags", query)
    }

    fn create_tag(&self, body: &TagCreate) -> ApiResult<Created> {
        self.post("/tags", body)
    }

    fn query_resources(&self, query: &Query) -> ApiResult<Vec<Resource>> {
        self.get("/resources", query)
    }

    fn create_resource(&self, body: &ResourceCreate) -> ApiResult<Created> {
        self.post("/resources", body)
    }

    fn update_resource(&self, id: Uuid, body: &ResourceUpdate) -> ApiResult<()> {
        self.put(&format!("/resources/{id}"), body)
    }

    fn query_projects(&self, query: &Query) -> ApiResult<Vec<Project>> {
        self.get("/projects", query)
    }

    fn create_project(&self, body: &ProjectCreate) -> ApiResult<Created> {
        self.post("/projects", body)
    }

    fn delete_project(&self, id: Uuid, hard_delete: bool) -> ApiResult<()> {
        self.delete(
            &format!("/projects/{id}"),
            &[("hardDelete", hard_delete.to_string())],
        )
    }

    fn list_task_statuses(&self, project_id: Uuid) -> ApiResult<Vec<TaskStatus>> {
        self.get(&format!("/projects/{project_id}/tasks/statuses"), &Query::new())
    }

    fn create_task_status(&self, project_id: Uuid, body: &TaskStatusCreate) -> ApiResult<Created> {
        self.post(&format!("/projects/{project_id}/tasks/statuses"), body)
    }

    fn update_task_status(&self, project_id: Uuid, body: &TaskStatusUpdate) -> ApiResult<()> {
        self.put(&format!("/projects/{project_id}/tasks/statuses"), body)
    }

    fn delete_task_status(&self, project_id: Uuid, status_id: Uuid) -> ApiResult<()> {
        self.delete(
            &format!("/projects/{project_id}/tasks/statuses/{status_id}"),
            &[],
        )
    }

    fn query_task_fields(&self, query: &Query) -> ApiResult<Vec<FieldDefinition>> {
        self.get("/tasks/fields", query)
    }

    fn create_task_field(&self, project_id: Uuid, body: &FieldCreate) -> ApiResult<Created> {
        self.post(&format!("/projects/{project_id}/tasks/fields"), body)
    }

    fn delete_task_field(&self, project_id: Uuid, field_id: Uuid) -> ApiResult<()> {
        self.delete(&format!("/projects/{project_id}/tasks/fields/{field_id}"), &[])
    }

    fn query_task_field_values(&self, query: &Query) -> ApiResult<Vec<FieldValue>> {
        self.get("/tasks/fields/values", query)
    }

    fn update_task_field_value(
        &self,
        task_id: Uuid,
        field_id: Uuid,
        body: &FieldValueUpdate,
    ) -> ApiResult<()> {
        self.put(&format!("/tasks/{task_id}/fields/{field_id}"), body)
    }

    fn query_tasks(&self, query: &Query) -> ApiResult<Vec<Task>> {
        self.get("/tasks", query)
    }

    fn create_task(&self, project_id: Uuid, body: &TaskCreate) -> ApiResult<Created> {
        self.post(&format!("/projects/{project_id}/tasks"), body)
    }

    fn create_many_tasks(&self, project_id: Uuid, body: &[TaskCreate]) -> ApiResult<Vec<Created>> {
        self.post(&format!("/projects/{project_id}/tasks/bulk"), body)
    }

    fn update_task(&self, id: Uuid, body: &TaskUpdate) -> ApiResult<()> {
        self.put(&format!("/tasks/{id}"), body)
    }

    fn delete_task(&self, id: Uuid) -> ApiResult<()> {
        self.delete(&format!("/tasks/{id}"), &[])
    }

    fn add_parent_task(&self, task_id: Uuid, parent_id: Uuid) -> ApiResult<()> {
        self.post_unit::<()>(&format!("/tasks/{task_id}/parent/{parent_id}"), None)
    }

    fn replace_task_tags(&self, task_id: Uuid, tags: &[NameBody]) -> ApiResult<()> {
        self.post_unit(&format!("/tasks/{task_id}/tags"), Some(tags))
    }

    fn remove_task_tags(&self, task_id: Uuid, tags: &[NameBody]) -> ApiResult<()> {
        self.delete_with_body(&format!("/tasks/{task_id}/tags"), tags)
    }

    fn replace_task_assignees(
        &self,
        task_id: Uuid,
        assignees: &[AssigneeUpsert],
    ) -> ApiResult<()> {
        self.post_unit(&format!("/tasks/{task_id}/assignees"), Some(assignees))
    }

    fn query_timesheets(&self, query: &Query) -> ApiResult<Vec<Timesheet>> {
        self.get("/timesheets", query)
    }

    fn create_timesheet(&self, body: &TimesheetCreate) -> ApiResult<Created> {
        self.post("/timesheets", body)
    }

    fn update_timesheet(&self, id: Uuid, body: &TimesheetUpdate) -> ApiResult<()> {
        self.put(&format!("/timesheets/{id}"), body)
    }

    fn delete_timesheet(&self, id: Uuid) -> ApiResult<()> {
        self.delete(&format!("/timesheets/{id}"), &[])
    }

    fn list_task_comments(&self, task_id: Uuid) -> ApiResult<Vec<Comment>> {
        self.get(&format!("/tasks/{task_id}/comments"), &Query::new())
    }

    fn create_task_comment(
        &self,
        task_id: Uuid,
        body: &CommentCreate,
    ) -> ApiResult<CommentCreated> {
        self.post(&format!("/tasks/{task_id}/comments"), body)
    }
}
