//! A small but complete source account, a destination with leftovers from
//! an earlier life, and a progress sink that remembers what it saw.

use chrono::NaiveDate;
use pmtask_client::models::*;
use pmtask_client::ProjectManagerApi;
use pmtask_sync::{Progress, Stage, StageSummary};
use uuid::Uuid;

use super::FakeAccount;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub started: Vec<(Stage, usize)>,
    pub finished: Vec<StageSummary>,
    pub notes: Vec<String>,
}

impl RecordingProgress {
    pub fn summary(&self, stage: Stage) -> StageSummary {
        *self
            .finished
            .iter()
            .find(|s| s.stage == stage)
            .unwrap_or_else(|| panic!("stage {stage} did not finish"))
    }
}

impl Progress for RecordingProgress {
    fn stage_started(&mut self, stage: Stage, attempted: usize) {
        self.started.push((stage, attempted));
    }

    fn stage_finished(&mut self, summary: &StageSummary) {
        self.finished.push(*summary);
    }

    fn note(&mut self, message: &str) {
        self.notes.push(message.to_string());
    }
}

pub struct Source {
    pub account: FakeAccount,
    pub apollo: Uuid,
    pub gemini: Uuid,
}

fn created(result: pmtask_client::ApiResult<Created>) -> Uuid {
    result.expect("seed").id.expect("seed id")
}

/// Two projects, one of them in the trash. Apollo's outline:
///
/// ```text
/// 1     Design
/// 1.1   Sketch      (Todo, tagged urgent + blocked, Effort = 3)
/// 1.2   Review
/// 1.2.1 Sign-off
/// 2     Build       (assigned to Ada, 90 minutes logged)
/// ```
pub fn seeded_source() -> Source {
    let a = FakeAccount::new(1);

    created(a.create_customer(&NameBody::new("Acme")));
    created(a.create_customer(&NameBody::new("Globex")));
    let high = a.add_priority("High");
    let billable = a.add_charge_code("Billable");
    let ops = a.add_folder("Ops");
    let active = a.add_project_status("Active", false);
    a.add_project_status("Archived", true);

    let risk = created(a.create_project_field(&FieldCreate {
        name: "Risk".into(),
        field_type: Some("Text".into()),
        short_id: Some("R1".into()),
        options: None,
    }));
    let rust = created(a.create_resource_skill(&NameBody::new("Rust")));
    let platform = created(a.create_resource_team(&NameBody::new("Platform")));
    created(a.create_tag(&TagCreate {
        name: "urgent".into(),
        color: Some("red".into()),
    }));
    created(a.create_tag(&TagCreate {
        name: "blocked".into(),
        color: None,
    }));

    let ada = created(a.create_resource(&ResourceCreate {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: Some("ada@example.com".into()),
        hourly_rate: Some(120.0),
        city: Some("London".into()),
        country_code: Some("GB".into()),
        team_ids: vec![platform],
        skill_ids: vec![rust],
        ..ResourceCreate::default()
    }));

    let customer = a.list_customers().expect("customers")[0].id;
    let apollo = created(a.create_project(&ProjectCreate {
        name: "Apollo".into(),
        description: Some("Moonshot".into()),
        budget: Some(1_000_000.0),
        folder_id: Some(ops),
        charge_code_id: Some(billable),
        customer_id: customer,
        status_id: Some(active),
        priority_id: Some(high),
        manager_id: Some(ada),
        ..ProjectCreate::default()
    }));
    let gemini = created(a.create_project(&ProjectCreate {
        name: "Gemini".into(),
        ..ProjectCreate::default()
    }));

    a.update_project_field_value(
        apollo,
        risk,
        &FieldValueUpdate {
            value: Some("Low".into()),
        },
    )
    .expect("seed value");

    let todo = created(a.create_task_status(
        apollo,
        &TaskStatusCreate {
            name: "Todo".into(),
            order: Some(1),
            is_done: Some(false),
        },
    ));
    created(a.create_task_status(
        apollo,
        &TaskStatusCreate {
            name: "Done".into(),
            order: Some(2),
            is_done: Some(true),
        },
    ));
    let effort = created(a.create_task_field(
        apollo,
        &FieldCreate {
            name: "Effort".into(),
            field_type: Some("Number".into()),
            short_id: Some("E1".into()),
            options: None,
        },
    ));

    let design = a.add_task(apollo, "Design", None);
    let sketch = a.add_task(apollo, "Sketch", Some(design));
    let review = a.add_task(apollo, "Review", Some(design));
    a.add_task(apollo, "Sign-off", Some(review));
    let build = a.add_task(apollo, "Build", None);
    a.add_task(gemini, "Old work", None);

    a.update_task(
        sketch,
        &TaskUpdate {
            status_id: Some(todo),
            planned_start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            planned_finish_date: NaiveDate::from_ymd_opt(2024, 3, 8),
            planned_duration: Some(6),
            ..TaskUpdate::default()
        },
    )
    .expect("seed task");
    a.set_task_tags(sketch, &["urgent", "blocked"]);
    a.replace_task_assignees(build, &[AssigneeUpsert { id: ada }])
        .expect("seed assignee");
    a.update_task_field_value(
        sketch,
        effort,
        &FieldValueUpdate {
            value: Some("3".into()),
        },
    )
    .expect("seed task value");

    a.create_timesheet(&TimesheetCreate {
        resource_id: Some(ada),
        task_id: Some(build),
        date: NaiveDate::from_ymd_opt(2024, 3, 4),
        hours: Some(1.5),
        minutes: Some(90),
        notes: Some("pairing".into()),
        ..TimesheetCreate::default()
    })
    .expect("seed timesheet");
    a.create_timesheet(&TimesheetCreate {
        resource_id: Some(ada),
        task_id: Some(build),
        date: NaiveDate::from_ymd_opt(2024, 3, 5),
        minutes: Some(0),
        ..TimesheetCreate::default()
    })
    .expect("seed empty timesheet");

    a.soft_delete_project(gemini);
    a.clear_calls();
    Source {
        account: a,
        apollo,
        gemini,
    }
}

/// Matching reference data, a stray customer, a hand-invited user, and a
/// contractor nobody remembers.
pub fn prepared_destination() -> FakeAccount {
    let d = FakeAccount::new(2);
    d.add_priority("High");
    d.add_charge_code("Billable");
    d.add_folder("Ops");
    d.add_project_status("Active", false);
    created(d.create_customer(&NameBody::new("Initech")));
    d.add_invited_resource("Grace", "Hopper", "grace@example.com");
    created(d.create_resource(&ResourceCreate {
        first_name: "Old".into(),
        last_name: "Contractor".into(),
        ..ResourceCreate::default()
    }));
    d.clear_calls();
    d
}
