//! Workspace tags. Tags can only be created: renames and deletes are not
//! exposed by the API.

use pmtask_client::models::{Tag, TagCreate};
use pmtask_client::{fetch_all, Query};
use pmtask_core::{reconcile, Capabilities, EntityKind, IdentityMap, Keyed, Strategy};

use super::{created_key, key_of, StageContext};
use crate::error::{ApiResultExt, SyncError};
use crate::progress::{Stage, StageSummary};

struct TagRules;

impl Keyed<Tag> for TagRules {
    fn identity(&self, record: &Tag) -> String {
        record.name.clone()
    }

    fn primary_key(&self, record: &Tag) -> String {
        key_of(record.id)
    }
}

impl Strategy<Tag> for TagRules {
    fn equals(&self, src: &Tag, dest: &Tag) -> bool {
        src.name == dest.name && src.color == dest.color
    }
}

pub(crate) fn sync_tags(cx: &mut StageContext<'_>) -> Result<(), SyncError> {
    let src = fetch_all(cx.page_size, &Query::new(), |q| cx.src.query_tags(q))
        .api_context("Fetching tags from source")?;
    let dest_tags = fetch_all(cx.page_size, &Query::new(), |q| cx.dest.query_tags(q))
        .api_context("Fetching tags from destination")?;
    cx.started(Stage::Tags, src.len());

    let dest = cx.dest;
    let capabilities = Capabilities::create_only(move |tag: &Tag, _: &IdentityMap| {
        let body = TagCreate {
            name: tag.name.clone(),
            color: tag.color.clone(),
        };
        let created = dest
            .create_tag(&body)
            .api_context(&format!("Creating tag '{}'", tag.name))?;
        created_key(created, EntityKind::Tag, &tag.name)
    });
    let result = reconcile(EntityKind::Tag, &src, &dest_tags, &mut cx.map, &TagRules, capabilities)?;
    cx.finished(StageSummary::synced(Stage::Tags, src.len(), result));
    Ok(())
}
