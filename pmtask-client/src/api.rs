//! The surface of the project-management API the sync and ingest code use.
//!
//! Everything goes through [`ProjectManagerApi`] so the pipeline can run
//! against [`HttpClient`](crate::HttpClient) in production and an in-memory
//! fake in tests.

use uuid::Uuid;

use crate::error::ApiError;
use crate::models::*;
use crate::paging::Query;

pub type ApiResult<T> = Result<T, ApiError>;

pub trait ProjectManagerApi {
    /// The user the API key belongs to.
    fn me(&self) -> ApiResult<WorkspaceUser>;

    // Customers
    fn list_customers(&self) -> ApiResult<Vec<NamedItem>>;
    fn create_customer(&self, body: &NameBody) -> ApiResult<Created>;
    fn update_customer(&self, id: Uuid, body: &NameBody) -> ApiResult<()>;
    fn delete_customer(&self, id: Uuid) -> ApiResult<()>;

    // Workspace reference data (read-only)
    fn list_project_priorities(&self) -> ApiResult<Vec<NamedItem>>;
    fn list_charge_codes(&self) -> ApiResult<Vec<NamedItem>>;
    fn list_project_folders(&self) -> ApiResult<Vec<NamedItem>>;
    fn list_project_statuses(&self) -> ApiResult<Vec<ProjectStatus>>;

    // Project custom fields
    fn list_project_fields(&self) -> ApiResult<Vec<FieldDefinition>>;
    fn create_project_field(&self, body: &FieldCreate) -> ApiResult<Created>;
    fn delete_project_field(&self, field_id: Uuid) -> ApiResult<()>;
    fn list_project_field_values(&self, project_id: Uuid) -> ApiResult<Vec<FieldValue>>;
    fn update_project_field_value(
        &self,
        project_id: Uuid,
        field_id: Uuid,
        body: &FieldValueUpdate,
    ) -> ApiResult<()>;

    // Resource skills and teams
    fn list_resource_skills(&self) -> ApiResult<Vec<NamedItem>>;
    fn create_resource_skill(&self, body: &NameBody) -> ApiResult<Created>;
    fn update_resource_skill(&self, id: Uuid, body: &NameBody) -> ApiResult<()>;
    fn delete_resource_skill(&self, id: Uuid) -> ApiResult<()>;
    fn list_resource_teams(&self) -> ApiResult<Vec<NamedItem>>;
    fn create_resource_team(&self, body: &NameBody) -> ApiResult<Created>;
    fn update_resource_team(&self, id: Uuid, body: &NameBody) -> ApiResult<()>;
    fn delete_resource_team(&self, id: Uuid) -> ApiResult<()>;

    // Tags
    fn query_tags(&self, query: &Query) -> ApiResult<Vec<Tag>>;
    fn create_tag(&self, body: &TagCreate) -> ApiResult<Created>;

    // Resources
    fn query_resources(&self, query: &Query) -> ApiResult<Vec<Resource>>;
    fn create_resource(&self, body: &ResourceCreate) -> ApiResult<Created>;
    fn update_resource(&self, id: Uuid, body: &ResourceUpdate) -> ApiResult<()>;

    // Projects
    fn query_projects(&self, query: &Query) -> ApiResult<Vec<Project>>;
    fn create_project(&self, body: &ProjectCreate) -> ApiResult<Created>;
    fn delete_project(&self, id: Uuid, hard_delete: bool) -> ApiResult<()>;

    // Task statuses (per project)
    fn list_task_statuses(&self, project_id: Uuid) -> ApiResult<Vec<TaskStatus>>;
    fn create_task_status(&self, project_id: Uuid, body: &TaskStatusCreate) -> ApiResult<Created>;
    fn update_task_status(&self, project_id: Uuid, body: &TaskStatusUpdate) -> ApiResult<()>;
    fn delete_task_status(&self, project_id: Uuid, status_id: Uuid) -> ApiResult<()>;

    // Task custom fields
    fn query_task_fields(&self, query: &Query) -> ApiResult<Vec<FieldDefinition>>;
    fn create_task_field(&self, project_id: Uuid, body: &FieldCreate) -> ApiResult<Created>;
    fn delete_task_field(&self, project_id: Uuid, field_id: Uuid) -> ApiResult<()>;
    fn query_task_field_values(&self, query: &Query) -> ApiResult<Vec<FieldValue>>;
    fn update_task_field_value(
        &self,
        task_id: Uuid,
        field_id: Uuid,
        body: &FieldValueUpdate,
    ) -> ApiResult<()>;

    // Tasks
    fn query_tasks(&self, query: &Query) -> ApiResult<Vec<Task>>;
    fn create_task(&self, project_id: Uuid, body: &TaskCreate) -> ApiResult<Created>;
    fn create_many_tasks(&self, project_id: Uuid, body: &[TaskCreate]) -> ApiResult<Vec<Created>>;
    fn update_task(&self, id: Uuid, body: &TaskUpdate) -> ApiResult<()>;
    fn delete_task(&self, id: Uuid) -> ApiResult<()>;
    fn add_parent_task(&self, task_id: Uuid, parent_id: Uuid) -> ApiResult<()>;
    fn replace_task_tags(&self, task_id: Uuid, tags: &[NameBody]) -> ApiResult<()>;
    fn remove_task_tags(&self, task_id: Uuid, tags: &[NameBody]) -> ApiResult<()>;
    fn replace_task_assignees(&self, task_id: Uuid, assignees: &[AssigneeUpsert])
        -> ApiResult<()>;

    // Timesheets
    fn query_timesheets(&self, query: &Query) -> ApiResult<Vec<Timesheet>>;
    fn create_timesheet(&self, body: &TimesheetCreate) -> ApiResult<Created>;
    fn update_timesheet(&self, id: Uuid, body: &TimesheetUpdate) -> ApiResult<()>;
    fn delete_timesheet(&self, id: Uuid) -> ApiResult<()>;

    // Discussion
    fn list_task_comments(&self, task_id: Uuid) -> ApiResult<Vec<Comment>>;
    fn create_task_comment(&self, task_id: Uuid, body: &CommentCreate)
        -> ApiResult<CommentCreated>;
}
