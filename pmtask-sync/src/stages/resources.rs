//! Resources (people). Two rules keep real users safe:
//!
//! - source emails are dropped before anything is created, so cloning never
//!   invites anyone into the destination workspace;
//! - only destination resources without an email take part, so users who
//!   were invited by hand are never updated or deactivated.
//!
//! Resources with history cannot be deleted; orphans are deactivated.

use pmtask_client::models::{Resource, ResourceCreate, ResourceUpdate};
use pmtask_client::{fetch_all, Query};
use pmtask_core::{reconcile, Capabilities, EntityKind, IdentityMap, Keyed, Strategy};
use uuid::Uuid;

use super::{created_key, key_of, require_id, require_mapping, StageContext};
use crate::error::{ApiResultExt, SyncError};
use crate::progress::{Stage, StageSummary};

struct ResourceRules;

fn display_name(resource: &Resource) -> String {
    format!("{} {}", resource.first_name, resource.last_name)
}

impl Keyed<Resource> for ResourceRules {
    // The API capitalises names on write, so identity ignores case.
    fn identity(&self, record: &Resource) -> String {
        display_name(record).to_lowercase()
    }

    fn primary_key(&self, record: &Resource) -> String {
        key_of(record.id)
    }
}

impl Strategy<Resource> for ResourceRules {
    fn equals(&self, src: &Resource, dest: &Resource) -> bool {
        src.color == dest.color
            && src.first_name.to_lowercase() == dest.first_name.to_lowercase()
            && src.last_name.to_lowercase() == dest.last_name.to_lowercase()
            && src.avatar_url == dest.avatar_url
            && src.city == dest.city
            && src.color_name == dest.color_name
            && src.country == dest.country
            && src.country_name == dest.country_name
            && src.hourly_rate == dest.hourly_rate
            && src.is_active == dest.is_active
            && src.notes == dest.notes
            && src.phone == dest.phone
            && src.state == dest.state
    }
}

fn has_email(resource: &Resource) -> bool {
    resource
        .email
        .as_deref()
        .is_some_and(|email| !email.trim().is_empty())
}

fn mapped_ids(
    map: &IdentityMap,
    kind: EntityKind,
    refs: &[pmtask_client::models::NamedRef],
) -> Result<Vec<Uuid>, SyncError> {
    refs.iter()
        .map(|r| require_mapping(map, kind, r.id, r.name.as_deref().unwrap_or_default()))
        .collect()
}

fn resource_create(resource: &Resource, map: &IdentityMap) -> Result<ResourceCreate, SyncError> {
    Ok(ResourceCreate {
        first_name: resource.first_name.clone(),
        last_name: resource.last_name.clone(),
        email: None,
        hourly_rate: resource.hourly_rate,
        phone: resource.phone.clone(),
        city: resource.city.clone(),
        state: resource.state.clone(),
        country_code: resource.country.clone(),
        notes: resource.notes.clone(),
        color_name: resource.color_name.clone(),
        role_id: None,
        team_ids: mapped_ids(map, EntityKind::ResourceTeam, &resource.teams)?,
        skill_ids: mapped_ids(map, EntityKind::ResourceSkill, &resource.skills)?,
    })
}

fn resource_update(resource: &Resource) -> ResourceUpdate {
    ResourceUpdate {
        first_name: Some(resource.first_name.clone()),
        last_name: Some(resource.last_name.clone()),
        hourly_rate: resource.hourly_rate,
        phone: resource.phone.clone(),
        city: resource.city.clone(),
        state: resource.state.clone(),
        country_code: resource.country.clone(),
        notes: resource.notes.clone(),
        color_name: resource.color_name.clone(),
        is_active: None,
    }
}

pub(crate) fn sync_resources(cx: &mut StageContext<'_>) -> Result<(), SyncError> {
    let active = Query::filtered("isActive eq true");
    let mut src = fetch_all(cx.page_size, &active, |q| cx.src.query_resources(q))
        .api_context("Fetching resources from source")?;
    let dest_all = fetch_all(cx.page_size, &active, |q| cx.dest.query_resources(q))
        .api_context("Fetching resources from destination")?;

    for resource in &mut src {
        resource.email = None;
    }
    let dest_resources: Vec<Resource> = dest_all.into_iter().filter(|r| !has_email(r)).collect();
    cx.started(Stage::Resources, src.len());

    let dest = cx.dest;
    let capabilities = Capabilities::full(
        move |resource: &Resource, map: &IdentityMap| {
            let name = display_name(resource);
            let body = resource_create(resource, map)?;
            let created = dest
                .create_resource(&body)
                .api_context(&format!("Creating resource '{name}'"))?;
            created_key(created, EntityKind::Resource, &name)
        },
        move |src_resource: &Resource, dest_resource: &Resource, _: &IdentityMap| {
            let name = display_name(dest_resource);
            let id = require_id(EntityKind::Resource, dest_resource.id, &name)?;
            dest.update_resource(id, &resource_update(src_resource))
                .api_context(&format!("Updating resource '{name}'"))
        },
        move |resource: &Resource| {
            let name = display_name(resource);
            let id = require_id(EntityKind::Resource, resource.id, &name)?;
            let body = ResourceUpdate {
                is_active: Some(false),
                ..ResourceUpdate::default()
            };
            dest.update_resource(id, &body)
                .api_context(&format!("Deactivating resource '{name}'"))
        },
    );
    let result = reconcile(
        EntityKind::Resource,
        &src,
        &dest_resources,
        &mut cx.map,
        &ResourceRules,
        capabilities,
    )?;
    cx.finished(StageSummary::synced(Stage::Resources, src.len(), result));
    Ok(())
}
