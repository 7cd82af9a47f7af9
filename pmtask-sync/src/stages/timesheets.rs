//! Time entries with at least one minute logged.

use pmtask_client::models::{Timesheet, TimesheetCreate, TimesheetUpdate};
use pmtask_client::{fetch_all, Query};
use pmtask_core::{reconcile, Capabilities, EntityKind, IdentityMap, Keyed, Strategy};

use super::{created_key, key_of, require_id, StageContext};
use crate::error::{ApiResultExt, SyncError};
use crate::progress::{Stage, StageSummary};

struct TimesheetRules;

fn describe(entry: &Timesheet) -> String {
    let date = entry.date.map(|d| d.to_string()).unwrap_or_default();
    let (first, last) = entry
        .resource
        .as_ref()
        .map(|r| {
            (
                r.first_name.as_deref().unwrap_or_default(),
                r.last_name.as_deref().unwrap_or_default(),
            )
        })
        .unwrap_or_default();
    let name = |r: &Option<pmtask_client::models::NamedRef>| {
        r.as_ref()
            .and_then(|r| r.name.clone())
            .unwrap_or_default()
    };
    format!(
        "{date} {first} {last} {} {} {}",
        name(&entry.project),
        name(&entry.task),
        name(&entry.admin_type)
    )
}

impl Keyed<Timesheet> for TimesheetRules {
    // Lowercased: the API capitalises resource names on write.
    fn identity(&self, record: &Timesheet) -> String {
        describe(record).to_lowercase()
    }

    fn primary_key(&self, record: &Timesheet) -> String {
        key_of(record.id)
    }
}

impl Strategy<Timesheet> for TimesheetRules {
    // Approval state cannot be written, so it is not compared.
    fn equals(&self, src: &Timesheet, dest: &Timesheet) -> bool {
        src.date == dest.date
            && src.hours == dest.hours
            && src.minutes == dest.minutes
            && src.notes == dest.notes
    }
}

/// A source entry can be cloned when every reference it carries was cloned.
fn references_cloned(entry: &Timesheet, map: &IdentityMap) -> bool {
    let resolved =
        |kind: EntityKind, id: Option<uuid::Uuid>| id.is_none() || map.map_key_guid(kind, id).is_some();
    resolved(EntityKind::Resource, entry.resource_id) && resolved(EntityKind::Task, entry.task_id)
}

pub(crate) fn sync_timesheets(cx: &mut StageContext<'_>) -> Result<(), SyncError> {
    let logged = Query::filtered("minutes gt 0");
    let all = fetch_all(cx.page_size, &logged, |q| cx.src.query_timesheets(q))
        .api_context("Fetching timesheets from source")?;
    let dest_entries = fetch_all(cx.page_size, &logged, |q| cx.dest.query_timesheets(q))
        .api_context("Fetching timesheets from destination")?;

    let (src, skipped): (Vec<_>, Vec<_>) =
        all.into_iter().partition(|t| references_cloned(t, &cx.map));
    for entry in &skipped {
        tracing::warn!(
            "not cloning timesheet '{}': its resource or task was not cloned",
            describe(entry).trim()
        );
    }
    if !skipped.is_empty() {
        cx.note(&format!(
            "Skipping {} timesheet(s) of inactive resources or deleted projects",
            skipped.len()
        ));
    }
    cx.started(Stage::Timesheets, src.len());

    let dest = cx.dest;
    let capabilities = Capabilities::full(
        move |entry: &Timesheet, map: &IdentityMap| {
            let body = TimesheetCreate {
                resource_id: map.map_key_guid(EntityKind::Resource, entry.resource_id),
                task_id: map.map_key_guid(EntityKind::Task, entry.task_id),
                admin_type_id: entry.admin_type.as_ref().and_then(|a| a.id),
                date: entry.date,
                hours: entry.hours,
                minutes: entry.minutes,
                notes: entry.notes.clone(),
            };
            let label = describe(entry);
            let created = dest
                .create_timesheet(&body)
                .api_context(&format!("Creating timesheet '{}'", label.trim()))?;
            created_key(created, EntityKind::Timesheet, &label)
        },
        move |src_entry: &Timesheet, dest_entry: &Timesheet, _: &IdentityMap| {
            let id = require_id(EntityKind::Timesheet, dest_entry.id, &describe(dest_entry))?;
            let body = TimesheetUpdate {
                hours: src_entry.hours,
                minutes: src_entry.minutes,
                notes: src_entry.notes.clone(),
            };
            dest.update_timesheet(id, &body)
                .api_context("Updating timesheet")
        },
        move |entry: &Timesheet| {
            let id = require_id(EntityKind::Timesheet, entry.id, &describe(entry))?;
            dest.delete_timesheet(id).api_context("Deleting timesheet")
        },
    );
    let result = reconcile(
        EntityKind::Timesheet,
        &src,
        &dest_entries,
        &mut cx.map,
        &TimesheetRules,
        capabilities,
    )?;
    cx.finished(StageSummary::synced(Stage::Timesheets, src.len(), result));
    Ok(())
}
