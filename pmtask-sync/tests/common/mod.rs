//! In-memory account implementing `ProjectManagerApi` for integration tests.
//!
//! Every mutating call is appended to a call log as `"<method> <label>"` and
//! can be made to fail with [`FakeAccount::fail`]. Outline positions and
//! summary flags are derived from parent links the way the service does.

#![allow(dead_code)]

pub mod scenario;

use std::cell::RefCell;
use std::collections::HashMap;

use chrono::{TimeZone, Utc};
use pmtask_client::models::*;
use pmtask_client::{ApiError, ApiResult, ProjectManagerApi, Query};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct StoredTask {
    task: Task,
    parent: Option<Uuid>,
    rank: i64,
    status_id: Option<Uuid>,
    tag_names: Vec<String>,
    assignee_ids: Vec<Uuid>,
}

#[derive(Default)]
struct State {
    next: u128,
    calls: Vec<String>,
    failing: Vec<String>,
    me: WorkspaceUser,
    customers: Vec<NamedItem>,
    priorities: Vec<NamedItem>,
    charge_codes: Vec<NamedItem>,
    folders: Vec<NamedItem>,
    statuses: Vec<ProjectStatus>,
    project_fields: Vec<FieldDefinition>,
    project_values: Vec<(Uuid, Uuid, String)>,
    skills: Vec<NamedItem>,
    teams: Vec<NamedItem>,
    tags: Vec<Tag>,
    resources: Vec<Resource>,
    projects: Vec<Project>,
    task_statuses: Vec<(Uuid, TaskStatus)>,
    task_fields: Vec<FieldDefinition>,
    task_values: Vec<(Uuid, Uuid, String)>,
    tasks: Vec<StoredTask>,
    timesheets: Vec<Timesheet>,
    comments: Vec<(Uuid, Comment)>,
}

pub struct FakeAccount {
    seed: u128,
    state: RefCell<State>,
}

fn named(items: &[NamedItem], id: Option<Uuid>) -> Option<NamedRef> {
    let id = id?;
    items.iter().find(|i| i.id == Some(id)).map(|i| NamedRef {
        id: i.id,
        name: Some(i.name.clone()),
    })
}

fn page<T>(items: Vec<T>, query: &Query) -> Vec<T> {
    let skip = query.skip.unwrap_or(0);
    let top = query.top.unwrap_or(usize::MAX);
    items.into_iter().skip(skip).take(top).collect()
}

/// `field op value` of a single-clause filter, quotes stripped.
fn clause(query: &Query) -> Option<(String, String, String)> {
    let filter = query.filter.as_deref()?;
    let mut parts = filter.splitn(3, ' ');
    Some((
        parts.next()?.to_string(),
        parts.next()?.to_string(),
        parts.next()?.trim().trim_matches('\'').to_string(),
    ))
}

fn person(resource: &Resource) -> String {
    format!("{} {}", resource.first_name, resource.last_name)
}

impl FakeAccount {
    /// Ids generated by different seeds never collide.
    pub fn new(seed: u128) -> Self {
        let state = State {
            me: WorkspaceUser {
                email_address: Some("owner@example.com".into()),
                full_name: Some("Account Owner".into()),
                role_name: Some("Administrator".into()),
                work_space_name: Some(format!("workspace-{seed}")),
            },
            ..State::default()
        };
        Self {
            seed,
            state: RefCell::new(state),
        }
    }

    fn next_id(state: &mut State, seed: u128) -> Uuid {
        state.next += 1;
        Uuid::from_u128((seed << 64) | state.next)
    }

    fn fresh_id(&self) -> Uuid {
        let mut state = self.state.borrow_mut();
        Self::next_id(&mut *state, self.seed)
    }

    /// Make every later call to `method` fail.
    pub fn fail(&self, method: &str) {
        self.state.borrow_mut().failing.push(method.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn calls_to(&self, method: &str) -> usize {
        let prefix = format!("{method} ");
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    fn record(&self, method: &str, label: impl std::fmt::Display) -> ApiResult<()> {
        let mut state = self.state.borrow_mut();
        state.calls.push(format!("{method} {label}"));
        if state.failing.iter().any(|m| m == method) {
            return Err(ApiError::Rejected {
                endpoint: method.to_string(),
                message: "injected failure".into(),
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Seeding for data the API cannot create
    // -----------------------------------------------------------------------

    fn push_named(&self, pick: fn(&mut State) -> &mut Vec<NamedItem>, name: &str) -> Uuid {
        let id = self.fresh_id();
        let mut state = self.state.borrow_mut();
        pick(&mut *state).push(NamedItem {
            id: Some(id),
            name: name.into(),
        });
        id
    }

    pub fn add_priority(&self, name: &str) -> Uuid {
        self.push_named(|s| &mut s.priorities, name)
    }

    pub fn add_charge_code(&self, name: &str) -> Uuid {
        self.push_named(|s| &mut s.charge_codes, name)
    }

    pub fn add_folder(&self, name: &str) -> Uuid {
        self.push_named(|s| &mut s.folders, name)
    }

    pub fn add_project_status(&self, name: &str, deleted: bool) -> Uuid {
        let id = self.fresh_id();
        self.state.borrow_mut().statuses.push(ProjectStatus {
            id: Some(id),
            name: name.into(),
            is_deleted: Some(deleted),
        });
        id
    }

    /// A resource that signed up with an email address.
    pub fn add_invited_resource(&self, first: &str, last: &str, email: &str) -> Uuid {
        let id = self.fresh_id();
        self.state.borrow_mut().resources.push(Resource {
            id: Some(id),
            first_name: first.into(),
            last_name: last.into(),
            email: Some(email.into()),
            is_active: Some(true),
            ..Resource::default()
        });
        id
    }

    /// Mark a project as soft-deleted, the way the trash bin does.
    pub fn soft_delete_project(&self, project_id: Uuid) {
        let mut state = self.state.borrow_mut();
        if let Some(project) = state.projects.iter_mut().find(|p| p.id == Some(project_id)) {
            project.status = Some(ProjectStatus {
                id: None,
                name: "Deleted".into(),
                is_deleted: Some(true),
            });
        }
    }

    /// Append a task as the last child of `parent` (or the last root task).
    pub fn add_task(&self, project_id: Uuid, name: &str, parent: Option<Uuid>) -> Uuid {
        let created = self
            .create_task(
                project_id,
                &TaskCreate {
                    name: name.into(),
                    ..TaskCreate::default()
                },
            )
            .expect("seed task");
        let id = created.id.expect("task id");
        let mut state = self.state.borrow_mut();
        if let Some(stored) = state.tasks.iter_mut().find(|t| t.task.id == Some(id)) {
            stored.parent = parent;
        }
        id
    }

    pub fn set_task_tags(&self, task_id: Uuid, tags: &[&str]) {
        let mut state = self.state.borrow_mut();
        if let Some(stored) = state.tasks.iter_mut().find(|t| t.task.id == Some(task_id)) {
            stored.tag_names = tags.iter().map(|t| t.to_string()).collect();
        }
    }

    /// Detach a task from its parent and append it as the last root task.
    pub fn move_to_root(&self, task_id: Uuid) {
        let mut state = self.state.borrow_mut();
        let last = state.tasks.iter().map(|t| t.rank).max().unwrap_or(0);
        if let Some(stored) = state.tasks.iter_mut().find(|t| t.task.id == Some(task_id)) {
            stored.parent = None;
            stored.rank = last + 1;
        }
    }

    pub fn add_comment(&self, task_id: Uuid, author: &str, text: &str) -> Uuid {
        let id = self.fresh_id();
        self.state.borrow_mut().comments.push((
            task_id,
            Comment {
                id: Some(id),
                text: Some(text.into()),
                author_name: Some(author.into()),
                create_date: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single(),
                emoji: Vec::new(),
            },
        ));
        id
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    pub fn tasks(&self) -> Vec<Task> {
        self.query_tasks(&Query::new()).expect("tasks")
    }

    pub fn task_named(&self, name: &str) -> Task {
        self.tasks()
            .into_iter()
            .find(|t| t.name == name)
            .unwrap_or_else(|| panic!("no task named {name}"))
    }

    pub fn task_field_id(&self, name: &str) -> Uuid {
        self.state
            .borrow()
            .task_fields
            .iter()
            .find(|f| f.name == name)
            .and_then(|f| f.id)
            .unwrap_or_else(|| panic!("no task field named {name}"))
    }

    /// `(task name, value)` for every value set on the named task field.
    pub fn task_values(&self, field_name: &str) -> Vec<(String, String)> {
        let mut values: Vec<(String, String)> = self
            .query_task_field_values(&Query::new())
            .expect("values")
            .into_iter()
            .filter(|v| v.name == field_name)
            .map(|v| {
                let task = v.task.and_then(|t| t.name).unwrap_or_default();
                (task, v.value.unwrap_or_default())
            })
            .collect();
        values.sort();
        values
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.state.borrow().resources.clone()
    }

    pub fn projects(&self) -> Vec<Project> {
        self.state.borrow().projects.clone()
    }

    pub fn project_value(&self, project_id: Uuid, field_name: &str) -> Option<String> {
        self.list_project_field_values(project_id)
            .expect("values")
            .into_iter()
            .find(|v| v.name == field_name)
            .and_then(|v| v.value)
    }

    // -----------------------------------------------------------------------
    // Derived views
    // -----------------------------------------------------------------------

    fn outline(state: &State) -> HashMap<Uuid, String> {
        fn number(
            tasks: &[StoredTask],
            project: Option<Uuid>,
            parent: Option<Uuid>,
            prefix: &str,
            out: &mut HashMap<Uuid, String>,
        ) {
            let mut children: Vec<&StoredTask> = tasks
                .iter()
                .filter(|t| t.parent == parent && t.task.project_id == project)
                .collect();
            children.sort_by_key(|t| t.rank);
            for (i, child) in children.iter().enumerate() {
                let wbs = if prefix.is_empty() {
                    (i + 1).to_string()
                } else {
                    format!("{prefix}.{}", i + 1)
                };
                if let Some(id) = child.task.id {
                    number(tasks, project, Some(id), &wbs, out);
                    out.insert(id, wbs);
                }
            }
        }
        let mut out = HashMap::new();
        let mut projects: Vec<Option<Uuid>> = state.tasks.iter().map(|t| t.task.project_id).collect();
        projects.sort();
        projects.dedup();
        for project in projects {
            number(&state.tasks, project, None, "", &mut out);
        }
        out
    }

    fn task_view(state: &State, outline: &HashMap<Uuid, String>, stored: &StoredTask) -> Task {
        let mut task = stored.task.clone();
        let id = task.id;
        task.project = state
            .projects
            .iter()
            .find(|p| p.id == task.project_id)
            .map(|p| NamedRef {
                id: p.id,
                name: Some(p.name.clone()),
            });
        task.wbs = id.and_then(|id| outline.get(&id).cloned());
        task.is_summary = Some(state.tasks.iter().any(|t| t.parent.is_some() && t.parent == id));
        task.status = stored.status_id.and_then(|sid| {
            state
                .task_statuses
                .iter()
                .find(|(_, s)| s.id == Some(sid))
                .map(|(_, s)| NamedRef {
                    id: s.id,
                    name: Some(s.name.clone()),
                })
        });
        task.tags = stored
            .tag_names
            .iter()
            .map(|name| {
                state
                    .tags
                    .iter()
                    .find(|t| &t.name == name)
                    .cloned()
                    .unwrap_or_else(|| Tag {
                        id: None,
                        name: name.clone(),
                        color: None,
                    })
            })
            .collect();
        task.assignees = stored
            .assignee_ids
            .iter()
            .map(|rid| NamedRef {
                id: Some(*rid),
                name: state.resources.iter().find(|r| r.id == Some(*rid)).map(person),
            })
            .collect();
        task
    }

    fn task_name(state: &State, id: Uuid) -> Option<String> {
        state
            .tasks
            .iter()
            .find(|t| t.task.id == Some(id))
            .map(|t| t.task.name.clone())
    }

    fn field_value(field: &FieldDefinition, value: &str, task: Option<NamedRef>) -> FieldValue {
        FieldValue {
            id: field.id,
            name: field.name.clone(),
            short_id: field.short_id.clone(),
            field_type: field.field_type.clone(),
            value: Some(value.to_string()),
            task,
        }
    }

    fn upsert(values: &mut Vec<(Uuid, Uuid, String)>, owner: Uuid, field: Uuid, value: Option<&str>) {
        values.retain(|(o, f, _)| !(*o == owner && *f == field));
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            values.push((owner, field, value.to_string()));
        }
    }

    fn create_named(
        &self,
        method: &str,
        pick: fn(&mut State) -> &mut Vec<NamedItem>,
        body: &NameBody,
    ) -> ApiResult<Created> {
        self.record(method, &body.name)?;
        let id = self.push_named(pick, &body.name);
        Ok(Created { id: Some(id) })
    }

    fn update_named(
        &self,
        method: &str,
        pick: fn(&mut State) -> &mut Vec<NamedItem>,
        id: Uuid,
        body: &NameBody,
    ) -> ApiResult<()> {
        self.record(method, &body.name)?;
        let mut state = self.state.borrow_mut();
        if let Some(item) = pick(&mut *state).iter_mut().find(|i| i.id == Some(id)) {
            item.name = body.name.clone();
        }
        Ok(())
    }

    fn delete_named(
        &self,
        method: &str,
        pick: fn(&mut State) -> &mut Vec<NamedItem>,
        id: Uuid,
    ) -> ApiResult<()> {
        let name = {
            let mut state = self.state.borrow_mut();
            pick(&mut *state)
                .iter()
                .find(|i| i.id == Some(id))
                .map(|i| i.name.clone())
                .unwrap_or_default()
        };
        self.record(method, name)?;
        let mut state = self.state.borrow_mut();
        pick(&mut *state).retain(|i| i.id != Some(id));
        Ok(())
    }
}

impl ProjectManagerApi for FakeAccount {
    fn me(&self) -> ApiResult<WorkspaceUser> {
        Ok(self.state.borrow().me.clone())
    }

    fn list_customers(&self) -> ApiResult<Vec<NamedItem>> {
        Ok(self.state.borrow().customers.clone())
    }

    fn create_customer(&self, body: &NameBody) -> ApiResult<Created> {
        self.create_named("create_customer", |s| &mut s.customers, body)
    }

    fn update_customer(&self, id: Uuid, body: &NameBody) -> ApiResult<()> {
        self.update_named("update_customer", |s| &mut s.customers, id, body)
    }

    fn delete_customer(&self, id: Uuid) -> ApiResult<()> {
        self.delete_named("delete_customer", |s| &mut s.customers, id)
    }

    fn list_project_priorities(&self) -> ApiResult<Vec<NamedItem>> {
        Ok(self.state.borrow().priorities.clone())
    }

    fn list_charge_codes(&self) -> ApiResult<Vec<NamedItem>> {
        Ok(self.state.borrow().charge_codes.clone())
    }

    fn list_project_folders(&self) -> ApiResult<Vec<NamedItem>> {
        Ok(self.state.borrow().folders.clone())
    }

    fn list_project_statuses(&self) -> ApiResult<Vec<ProjectStatus>> {
        Ok(self.state.borrow().statuses.clone())
    }

    fn list_project_fields(&self) -> ApiResult<Vec<FieldDefinition>> {
        Ok(self.state.borrow().project_fields.clone())
    }

    fn create_project_field(&self, body: &FieldCreate) -> ApiResult<Created> {
        self.record("create_project_field", &body.name)?;
        let id = self.fresh_id();
        self.state.borrow_mut().project_fields.push(FieldDefinition {
            id: Some(id),
            name: body.name.clone(),
            field_type: body.field_type.clone(),
            short_id: body.short_id.clone(),
            options: body.options.clone(),
            project: None,
        });
        Ok(Created { id: Some(id) })
    }

    fn delete_project_field(&self, field_id: Uuid) -> ApiResult<()> {
        self.record("delete_project_field", field_id)?;
        let mut state = self.state.borrow_mut();
        state.project_fields.retain(|f| f.id != Some(field_id));
        state.project_values.retain(|(_, f, _)| *f != field_id);
        Ok(())
    }

    fn list_project_field_values(&self, project_id: Uuid) -> ApiResult<Vec<FieldValue>> {
        let state = self.state.borrow();
        Ok(state
            .project_values
            .iter()
            .filter(|(p, _, _)| *p == project_id)
            .filter_map(|(_, field, value)| {
                state
                    .project_fields
                    .iter()
                    .find(|f| f.id == Some(*field))
                    .map(|f| Self::field_value(f, value, None))
            })
            .collect())
    }

    fn update_project_field_value(
        &self,
        project_id: Uuid,
        field_id: Uuid,
        body: &FieldValueUpdate,
    ) -> ApiResult<()> {
        self.record(
            "update_project_field_value",
            body.value.as_deref().unwrap_or_default(),
        )?;
        Self::upsert(
            &mut self.state.borrow_mut().project_values,
            project_id,
            field_id,
            body.value.as_deref(),
        );
        Ok(())
    }

    fn list_resource_skills(&self) -> ApiResult<Vec<NamedItem>> {
        Ok(self.state.borrow().skills.clone())
    }

    fn create_resource_skill(&self, body: &NameBody) -> ApiResult<Created> {
        self.create_named("create_resource_skill", |s| &mut s.skills, body)
    }

    fn update_resource_skill(&self, id: Uuid, body: &NameBody) -> ApiResult<()> {
        self.update_named("update_resource_skill", |s| &mut s.skills, id, body)
    }

    fn delete_resource_skill(&self, id: Uuid) -> ApiResult<()> {
        self.delete_named("delete_resource_skill", |s| &mut s.skills, id)
    }

    fn list_resource_teams(&self) -> ApiResult<Vec<NamedItem>> {
        Ok(self.state.borrow().teams.clone())
    }

    fn create_resource_team(&self, body: &NameBody) -> ApiResult<Created> {
        self.create_named("create_resource_team", |s| &mut s.teams, body)
    }

    fn update_resource_team(&self, id: Uuid, body: &NameBody) -> ApiResult<()> {
        self.update_named("update_resource_team", |s| &mut s.teams, id, body)
    }

    fn delete_resource_team(&self, id: Uuid) -> ApiResult<()> {
        self.delete_named("delete_resource_team", |s| &mut s.teams, id)
    }

    fn query_tags(&self, query: &Query) -> ApiResult<Vec<Tag>> {
        Ok(page(self.state.borrow().tags.clone(), query))
    }

    fn create_tag(&self, body: &TagCreate) -> ApiResult<Created> {
        self.record("create_tag", &body.name)?;
        let id = self.fresh_id();
        self.state.borrow_mut().tags.push(Tag {
            id: Some(id),
            name: body.name.clone(),
            color: body.color.clone(),
        });
        Ok(Created { id: Some(id) })
    }

    fn query_resources(&self, query: &Query) -> ApiResult<Vec<Resource>> {
        let all = self.state.borrow().resources.clone();
        let filtered = match clause(query) {
            Some((field, _, value)) if field == "isActive" => all
                .into_iter()
                .filter(|r| r.is_active == Some(value == "true"))
                .collect(),
            Some(other) => panic!("unsupported resource filter {other:?}"),
            None => all,
        };
        Ok(page(filtered, query))
    }

    fn create_resource(&self, body: &ResourceCreate) -> ApiResult<Created> {
        self.record("create_resource", format!("{} {}", body.first_name, body.last_name))?;
        let id = self.fresh_id();
        let mut state = self.state.borrow_mut();
        let teams = body
            .team_ids
            .iter()
            .filter_map(|t| named(&state.teams, Some(*t)))
            .collect();
        let skills = body
            .skill_ids
            .iter()
            .filter_map(|s| named(&state.skills, Some(*s)))
            .collect();
        state.resources.push(Resource {
            id: Some(id),
            first_name: body.first_name.clone(),
            last_name: body.last_name.clone(),
            email: body.email.clone(),
            hourly_rate: body.hourly_rate,
            phone: body.phone.clone(),
            city: body.city.clone(),
            state: body.state.clone(),
            country: body.country_code.clone(),
            notes: body.notes.clone(),
            color_name: body.color_name.clone(),
            is_active: Some(true),
            teams,
            skills,
            ..Resource::default()
        });
        Ok(Created { id: Some(id) })
    }

    fn update_resource(&self, id: Uuid, body: &ResourceUpdate) -> ApiResult<()> {
        let label = if body.is_active == Some(false) {
            format!("{id} deactivate")
        } else {
            id.to_string()
        };
        self.record("update_resource", label)?;
        let mut state = self.state.borrow_mut();
        let Some(r) = state.resources.iter_mut().find(|r| r.id == Some(id)) else {
            return Ok(());
        };
        if let Some(v) = &body.first_name {
            r.first_name = v.clone();
        }
        if let Some(v) = &body.last_name {
            r.last_name = v.clone();
        }
        if body.hourly_rate.is_some() {
            r.hourly_rate = body.hourly_rate;
        }
        if body.phone.is_some() {
            r.phone = body.phone.clone();
        }
        if body.city.is_some() {
            r.city = body.city.clone();
        }
        if body.state.is_some() {
            r.state = body.state.clone();
        }
        if body.country_code.is_some() {
            r.country = body.country_code.clone();
        }
        if body.notes.is_some() {
            r.notes = body.notes.clone();
        }
        if body.color_name.is_some() {
            r.color_name = body.color_name.clone();
        }
        if body.is_active.is_some() {
            r.is_active = body.is_active;
        }
        Ok(())
    }

    fn query_projects(&self, query: &Query) -> ApiResult<Vec<Project>> {
        let all = self.state.borrow().projects.clone();
        let filtered = match clause(query) {
            Some((field, _, _)) if field == "status/isDeleted" => all
                .into_iter()
                .filter(|p| p.status.as_ref().and_then(|s| s.is_deleted) != Some(true))
                .collect(),
            Some(other) => panic!("unsupported project filter {other:?}"),
            None => all,
        };
        Ok(page(filtered, query))
    }

    fn create_project(&self, body: &ProjectCreate) -> ApiResult<Created> {
        self.record("create_project", &body.name)?;
        let mut state = self.state.borrow_mut();
        let id = Self::next_id(&mut *state, self.seed);
        let short_id = format!("P{}", state.projects.len() + 1);
        let status = body
            .status_id
            .and_then(|sid| state.statuses.iter().find(|s| s.id == Some(sid)).cloned());
        let manager = body.manager_id.and_then(|mid| {
            state.resources.iter().find(|r| r.id == Some(mid)).map(|r| NamedRef {
                id: r.id,
                name: Some(person(r)),
            })
        });
        let project = Project {
            id: Some(id),
            short_id: Some(short_id),
            name: body.name.clone(),
            description: body.description.clone(),
            hourly_rate: body.hourly_rate,
            budget: body.budget,
            status_update: body.status_update.clone(),
            folder: named(&state.folders, body.folder_id),
            charge_code: named(&state.charge_codes, body.charge_code_id),
            customer: named(&state.customers, body.customer_id),
            status,
            priority: named(&state.priorities, body.priority_id),
            manager,
        };
        state.projects.push(project);
        Ok(Created { id: Some(id) })
    }

    fn delete_project(&self, id: Uuid, hard_delete: bool) -> ApiResult<()> {
        let name = self
            .state
            .borrow()
            .projects
            .iter()
            .find(|p| p.id == Some(id))
            .map(|p| p.name.clone())
            .unwrap_or_default();
        self.record("delete_project", format!("{name} hard={hard_delete}"))?;
        let mut state = self.state.borrow_mut();
        state.projects.retain(|p| p.id != Some(id));
        state.tasks.retain(|t| t.task.project_id != Some(id));
        state.task_statuses.retain(|(p, _)| *p != id);
        state
            .task_fields
            .retain(|f| f.project.as_ref().and_then(|p| p.id) != Some(id));
        state.project_values.retain(|(p, _, _)| *p != id);
        Ok(())
    }

    fn list_task_statuses(&self, project_id: Uuid) -> ApiResult<Vec<TaskStatus>> {
        Ok(self
            .state
            .borrow()
            .task_statuses
            .iter()
            .filter(|(p, _)| *p == project_id)
            .map(|(_, s)| s.clone())
            .collect())
    }

    fn create_task_status(&self, project_id: Uuid, body: &TaskStatusCreate) -> ApiResult<Created> {
        self.record("create_task_status", &body.name)?;
        let id = self.fresh_id();
        self.state.borrow_mut().task_statuses.push((
            project_id,
            TaskStatus {
                id: Some(id),
                name: body.name.clone(),
                order: body.order,
                is_done: body.is_done,
            },
        ));
        Ok(Created { id: Some(id) })
    }

    fn update_task_status(&self, project_id: Uuid, body: &TaskStatusUpdate) -> ApiResult<()> {
        self.record("update_task_status", &body.name)?;
        let mut state = self.state.borrow_mut();
        if let Some((_, status)) = state
            .task_statuses
            .iter_mut()
            .find(|(p, s)| *p == project_id && s.id == Some(body.id))
        {
            status.name = body.name.clone();
            status.order = body.order;
        }
        Ok(())
    }

    fn delete_task_status(&self, project_id: Uuid, status_id: Uuid) -> ApiResult<()> {
        self.record("delete_task_status", status_id)?;
        self.state
            .borrow_mut()
            .task_statuses
            .retain(|(p, s)| !(*p == project_id && s.id == Some(status_id)));
        Ok(())
    }

    fn query_task_fields(&self, query: &Query) -> ApiResult<Vec<FieldDefinition>> {
        Ok(page(self.state.borrow().task_fields.clone(), query))
    }

    fn create_task_field(&self, project_id: Uuid, body: &FieldCreate) -> ApiResult<Created> {
        self.record("create_task_field", &body.name)?;
        let mut state = self.state.borrow_mut();
        let id = Self::next_id(&mut *state, self.seed);
        let project = state
            .projects
            .iter()
            .find(|p| p.id == Some(project_id))
            .map(|p| NamedRef {
                id: p.id,
                name: Some(p.name.clone()),
            });
        state.task_fields.push(FieldDefinition {
            id: Some(id),
            name: body.name.clone(),
            field_type: body.field_type.clone(),
            short_id: body.short_id.clone(),
            options: body.options.clone(),
            project,
        });
        Ok(Created { id: Some(id) })
    }

    fn delete_task_field(&self, _project_id: Uuid, field_id: Uuid) -> ApiResult<()> {
        self.record("delete_task_field", field_id)?;
        let mut state = self.state.borrow_mut();
        state.task_fields.retain(|f| f.id != Some(field_id));
        state.task_values.retain(|(_, f, _)| *f != field_id);
        Ok(())
    }

    fn query_task_field_values(&self, query: &Query) -> ApiResult<Vec<FieldValue>> {
        let state = self.state.borrow();
        let values = state
            .task_values
            .iter()
            .filter_map(|(task, field, value)| {
                let def = state.task_fields.iter().find(|f| f.id == Some(*field))?;
                let task_ref = NamedRef {
                    id: Some(*task),
                    name: Self::task_name(&state, *task),
                };
                Some(Self::field_value(def, value, Some(task_ref)))
            })
            .collect();
        Ok(page(values, query))
    }

    fn update_task_field_value(
        &self,
        task_id: Uuid,
        field_id: Uuid,
        body: &FieldValueUpdate,
    ) -> ApiResult<()> {
        self.record(
            "update_task_field_value",
            body.value.as_deref().unwrap_or_default(),
        )?;
        Self::upsert(
            &mut self.state.borrow_mut().task_values,
            task_id,
            field_id,
            body.value.as_deref(),
        );
        Ok(())
    }

    fn query_tasks(&self, query: &Query) -> ApiResult<Vec<Task>> {
        let state = self.state.borrow();
        let outline = Self::outline(&state);
        let mut all: Vec<Task> = state
            .tasks
            .iter()
            .map(|t| Self::task_view(&state, &outline, t))
            .collect();
        if let Some((field, _, value)) = clause(query) {
            all.retain(|t| match field.as_str() {
                "projectId" => t.project_id.map(|p| p.to_string()) == Some(value.clone()),
                "shortId" => t.short_id.as_deref() == Some(value.as_str()),
                "id" => t.id.map(|p| p.to_string()) == Some(value.clone()),
                other => panic!("unsupported task filter {other}"),
            });
        }
        Ok(page(all, query))
    }

    fn create_task(&self, project_id: Uuid, body: &TaskCreate) -> ApiResult<Created> {
        self.record("create_task", &body.name)?;
        let mut state = self.state.borrow_mut();
        let id = Self::next_id(&mut *state, self.seed);
        let rank = state.next as i64;
        let short_id = format!("T-{}", state.tasks.len() + 1);
        state.tasks.push(StoredTask {
            task: Task {
                id: Some(id),
                short_id: Some(short_id),
                project_id: Some(project_id),
                name: body.name.clone(),
                description: body.description.clone(),
                percent_complete: body.percent_complete,
                priority_id: body.priority_id,
                planned_start_date: body.planned_start_date,
                planned_finish_date: body.planned_finish_date,
                planned_duration: body.planned_duration,
                planned_effort: body.planned_effort,
                planned_cost: body.planned_cost,
                actual_start_date: body.actual_start_date,
                actual_cost: body.actual_cost,
                theme: body.theme.clone(),
                is_locked: body.is_locked,
                is_milestone: body.is_milestone,
                ..Task::default()
            },
            parent: None,
            rank,
            status_id: body.status_id,
            tag_names: Vec::new(),
            assignee_ids: body.assignees.clone(),
        });
        Ok(Created { id: Some(id) })
    }

    fn create_many_tasks(&self, project_id: Uuid, body: &[TaskCreate]) -> ApiResult<Vec<Created>> {
        self.record("create_many_tasks", body.len())?;
        let before = self.state.borrow().calls.len();
        let created = body
            .iter()
            .map(|task| self.create_task(project_id, task))
            .collect::<ApiResult<Vec<_>>>()?;
        self.state.borrow_mut().calls.truncate(before);
        Ok(created)
    }

    fn update_task(&self, id: Uuid, body: &TaskUpdate) -> ApiResult<()> {
        let name = body.name.clone().unwrap_or_else(|| id.to_string());
        self.record("update_task", name)?;
        let mut state = self.state.borrow_mut();
        let Some(stored) = state.tasks.iter_mut().find(|t| t.task.id == Some(id)) else {
            return Err(ApiError::Rejected {
                endpoint: "update_task".into(),
                message: "no such task".into(),
            });
        };
        let t = &mut stored.task;
        if let Some(v) = &body.name {
            t.name = v.clone();
        }
        if body.description.is_some() {
            t.description = body.description.clone();
        }
        if body.percent_complete.is_some() {
            t.percent_complete = body.percent_complete;
        }
        if body.priority_id.is_some() {
            t.priority_id = body.priority_id;
        }
        if body.planned_start_date.is_some() {
            t.planned_start_date = body.planned_start_date;
        }
        if body.planned_finish_date.is_some() {
            t.planned_finish_date = body.planned_finish_date;
        }
        if body.planned_duration.is_some() {
            t.planned_duration = body.planned_duration;
        }
        if body.planned_effort.is_some() {
            t.planned_effort = body.planned_effort;
        }
        if body.planned_cost.is_some() {
            t.planned_cost = body.planned_cost;
        }
        if body.actual_start_date.is_some() {
            t.actual_start_date = body.actual_start_date;
        }
        if body.actual_finish_date.is_some() {
            t.actual_finish_date = body.actual_finish_date;
        }
        if body.actual_cost.is_some() {
            t.actual_cost = body.actual_cost;
        }
        if body.theme.is_some() {
            t.theme = body.theme.clone();
        }
        if body.is_locked.is_some() {
            t.is_locked = body.is_locked;
        }
        if body.is_milestone.is_some() {
            t.is_milestone = body.is_milestone;
        }
        if body.status_id.is_some() {
            stored.status_id = body.status_id;
        }
        Ok(())
    }

    fn delete_task(&self, id: Uuid) -> ApiResult<()> {
        let name = Self::task_name(&self.state.borrow(), id).unwrap_or_default();
        self.record("delete_task", name)?;
        let mut state = self.state.borrow_mut();
        state.tasks.retain(|t| t.task.id != Some(id));
        for t in state.tasks.iter_mut().filter(|t| t.parent == Some(id)) {
            t.parent = None;
        }
        state.task_values.retain(|(t, _, _)| *t != id);
        Ok(())
    }

    fn add_parent_task(&self, task_id: Uuid, parent_id: Uuid) -> ApiResult<()> {
        let (child, parent) = {
            let state = self.state.borrow();
            (
                Self::task_name(&state, task_id).unwrap_or_default(),
                Self::task_name(&state, parent_id).unwrap_or_default(),
            )
        };
        self.record("add_parent_task", format!("{child} -> {parent}"))?;
        let mut state = self.state.borrow_mut();
        let first = state
            .tasks
            .iter()
            .filter(|t| t.parent == Some(parent_id))
            .map(|t| t.rank)
            .min()
            .unwrap_or(0);
        if let Some(stored) = state.tasks.iter_mut().find(|t| t.task.id == Some(task_id)) {
            stored.parent = Some(parent_id);
            stored.rank = first - 1;
        }
        Ok(())
    }

    fn replace_task_tags(&self, task_id: Uuid, tags: &[NameBody]) -> ApiResult<()> {
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        self.record("replace_task_tags", names.join(","))?;
        let mut state = self.state.borrow_mut();
        if let Some(stored) = state.tasks.iter_mut().find(|t| t.task.id == Some(task_id)) {
            stored.tag_names = names.iter().map(|n| n.to_string()).collect();
        }
        Ok(())
    }

    fn remove_task_tags(&self, task_id: Uuid, tags: &[NameBody]) -> ApiResult<()> {
        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        self.record("remove_task_tags", names.join(","))?;
        let mut state = self.state.borrow_mut();
        if let Some(stored) = state.tasks.iter_mut().find(|t| t.task.id == Some(task_id)) {
            stored.tag_names.retain(|n| !names.contains(&n.as_str()));
        }
        Ok(())
    }

    fn replace_task_assignees(&self, task_id: Uuid, assignees: &[AssigneeUpsert]) -> ApiResult<()> {
        self.record("replace_task_assignees", assignees.len())?;
        let mut state = self.state.borrow_mut();
        if let Some(stored) = state.tasks.iter_mut().find(|t| t.task.id == Some(task_id)) {
            stored.assignee_ids = assignees.iter().map(|a| a.id).collect();
        }
        Ok(())
    }

    fn query_timesheets(&self, query: &Query) -> ApiResult<Vec<Timesheet>> {
        let state = self.state.borrow();
        let views: Vec<Timesheet> = state
            .timesheets
            .iter()
            .filter(|t| match clause(query) {
                Some((field, _, _)) if field == "minutes" => t.minutes.unwrap_or(0) > 0,
                Some(other) => panic!("unsupported timesheet filter {other:?}"),
                None => true,
            })
            .map(|entry| {
                let mut view = entry.clone();
                view.resource = entry.resource_id.and_then(|rid| {
                    state.resources.iter().find(|r| r.id == Some(rid)).map(|r| PersonRef {
                        id: r.id,
                        first_name: Some(r.first_name.clone()),
                        last_name: Some(r.last_name.clone()),
                    })
                });
                let task = entry
                    .task_id
                    .and_then(|tid| state.tasks.iter().find(|t| t.task.id == Some(tid)));
                view.task = task.map(|t| NamedRef {
                    id: t.task.id,
                    name: Some(t.task.name.clone()),
                });
                view.project = task
                    .and_then(|t| state.projects.iter().find(|p| p.id == t.task.project_id))
                    .map(|p| NamedRef {
                        id: p.id,
                        name: Some(p.name.clone()),
                    });
                view
            })
            .collect();
        Ok(page(views, query))
    }

    fn create_timesheet(&self, body: &TimesheetCreate) -> ApiResult<Created> {
        self.record(
            "create_timesheet",
            body.date.map(|d| d.to_string()).unwrap_or_default(),
        )?;
        let id = self.fresh_id();
        self.state.borrow_mut().timesheets.push(Timesheet {
            id: Some(id),
            date: body.date,
            hours: body.hours,
            minutes: body.minutes,
            notes: body.notes.clone(),
            resource_id: body.resource_id,
            task_id: body.task_id,
            ..Timesheet::default()
        });
        Ok(Created { id: Some(id) })
    }

    fn update_timesheet(&self, id: Uuid, body: &TimesheetUpdate) -> ApiResult<()> {
        self.record("update_timesheet", id)?;
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.timesheets.iter_mut().find(|t| t.id == Some(id)) {
            entry.hours = body.hours;
            entry.minutes = body.minutes;
            entry.notes = body.notes.clone();
        }
        Ok(())
    }

    fn delete_timesheet(&self, id: Uuid) -> ApiResult<()> {
        self.record("delete_timesheet", id)?;
        self.state.borrow_mut().timesheets.retain(|t| t.id != Some(id));
        Ok(())
    }

    fn list_task_comments(&self, task_id: Uuid) -> ApiResult<Vec<Comment>> {
        Ok(self
            .state
            .borrow()
            .comments
            .iter()
            .filter(|(t, _)| *t == task_id)
            .map(|(_, c)| c.clone())
            .collect())
    }

    fn create_task_comment(&self, task_id: Uuid, body: &CommentCreate) -> ApiResult<CommentCreated> {
        self.record("create_task_comment", &body.text)?;
        let author = self.state.borrow().me.full_name.clone().unwrap_or_default();
        let id = self.add_comment(task_id, &author, &body.text);
        Ok(CommentCreated {
            discussion_comment_id: Some(id),
        })
    }
}
