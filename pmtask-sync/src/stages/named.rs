//! Kinds that are nothing but a name: customers, resource skills, and
//! resource teams. All three support create, rename, and delete.

use pmtask_client::models::{Created, NameBody, NamedItem, ProjectStatus};
use pmtask_client::{ApiResult, ProjectManagerApi};
use pmtask_core::{reconcile, Capabilities, EntityKind, IdentityMap, Keyed, Strategy};
use uuid::Uuid;

use super::{created_key, key_of, require_id, StageContext};
use crate::error::{ApiResultExt, SyncError};
use crate::progress::{Stage, StageSummary};

/// Identity is the name; two records are equal when their names are.
pub(crate) struct ByName;

impl Keyed<NamedItem> for ByName {
    fn identity(&self, record: &NamedItem) -> String {
        record.name.clone()
    }

    fn primary_key(&self, record: &NamedItem) -> String {
        key_of(record.id)
    }
}

impl Strategy<NamedItem> for ByName {
    fn equals(&self, src: &NamedItem, dest: &NamedItem) -> bool {
        src.name == dest.name
    }
}

impl Keyed<ProjectStatus> for ByName {
    fn identity(&self, record: &ProjectStatus) -> String {
        record.name.clone()
    }

    fn primary_key(&self, record: &ProjectStatus) -> String {
        key_of(record.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NamedKind {
    Customer,
    ResourceSkill,
    ResourceTeam,
}

impl NamedKind {
    fn entity(self) -> EntityKind {
        match self {
            NamedKind::Customer => EntityKind::Customer,
            NamedKind::ResourceSkill => EntityKind::ResourceSkill,
            NamedKind::ResourceTeam => EntityKind::ResourceTeam,
        }
    }

    fn stage(self) -> Stage {
        match self {
            NamedKind::Customer => Stage::Customers,
            NamedKind::ResourceSkill => Stage::ResourceSkills,
            NamedKind::ResourceTeam => Stage::ResourceTeams,
        }
    }

    fn list(self, api: &dyn ProjectManagerApi) -> ApiResult<Vec<NamedItem>> {
        match self {
            NamedKind::Customer => api.list_customers(),
            NamedKind::ResourceSkill => api.list_resource_skills(),
            NamedKind::ResourceTeam => api.list_resource_teams(),
        }
    }

    fn create(self, api: &dyn ProjectManagerApi, body: &NameBody) -> ApiResult<Created> {
        match self {
            NamedKind::Customer => api.create_customer(body),
            NamedKind::ResourceSkill => api.create_resource_skill(body),
            NamedKind::ResourceTeam => api.create_resource_team(body),
        }
    }

    fn update(self, api: &dyn ProjectManagerApi, id: Uuid, body: &NameBody) -> ApiResult<()> {
        match self {
            NamedKind::Customer => api.update_customer(id, body),
            NamedKind::ResourceSkill => api.update_resource_skill(id, body),
            NamedKind::ResourceTeam => api.update_resource_team(id, body),
        }
    }

    fn delete(self, api: &dyn ProjectManagerApi, id: Uuid) -> ApiResult<()> {
        match self {
            NamedKind::Customer => api.delete_customer(id),
            NamedKind::ResourceSkill => api.delete_resource_skill(id),
            NamedKind::ResourceTeam => api.delete_resource_team(id),
        }
    }
}

pub(crate) fn sync_named(cx: &mut StageContext<'_>, kind: NamedKind) -> Result<(), SyncError> {
    let entity = kind.entity();
    let stage = kind.stage();
    let src = kind
        .list(cx.src)
        .api_context(&format!("Fetching {stage} from source"))?;
    let dest_items = kind
        .list(cx.dest)
        .api_context(&format!("Fetching {stage} from destination"))?;
    cx.started(stage, src.len());

    let dest = cx.dest;
    let capabilities = Capabilities::full(
        move |item: &NamedItem, _: &IdentityMap| {
            let created = kind
                .create(dest, &NameBody::new(&item.name))
                .api_context(&format!("Creating {entity} '{}'", item.name))?;
            created_key(created, entity, &item.name)
        },
        move |src_item: &NamedItem, dest_item: &NamedItem, _: &IdentityMap| {
            let id = require_id(entity, dest_item.id, &dest_item.name)?;
            kind.update(dest, id, &NameBody::new(&src_item.name))
                .api_context(&format!("Updating {entity} '{}'", dest_item.name))
        },
        move |item: &NamedItem| {
            let id = require_id(entity, item.id, &item.name)?;
            kind.delete(dest, id)
                .api_context(&format!("Deleting {entity} '{}'", item.name))
        },
    );
    let result = reconcile(entity, &src, &dest_items, &mut cx.map, &ByName, capabilities)?;
    cx.finished(StageSummary::synced(stage, src.len(), result));
    Ok(())
}
