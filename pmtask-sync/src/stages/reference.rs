//! Workspace reference data the API cannot create: priorities, charge
//! codes, folders, and project statuses. These are matched by name so later
//! stages can translate foreign keys.

use pmtask_client::models::NamedItem;
use pmtask_client::{ApiResult, ProjectManagerApi};
use pmtask_core::{match_only, EntityKind};

use super::named::ByName;
use super::StageContext;
use crate::error::{ApiResultExt, SyncError};
use crate::progress::{Stage, StageSummary};

pub(crate) fn match_reference_data(cx: &mut StageContext<'_>) -> Result<(), SyncError> {
    match_named(cx, Stage::ProjectPriorities, EntityKind::ProjectPriority, |api| {
        api.list_project_priorities()
    })?;
    match_named(cx, Stage::ProjectChargeCodes, EntityKind::ProjectChargeCode, |api| {
        api.list_charge_codes()
    })?;
    match_named(cx, Stage::ProjectFolders, EntityKind::ProjectFolder, |api| {
        api.list_project_folders()
    })?;
    match_statuses(cx)
}

fn match_named<F>(
    cx: &mut StageContext<'_>,
    stage: Stage,
    kind: EntityKind,
    list: F,
) -> Result<(), SyncError>
where
    F: Fn(&dyn ProjectManagerApi) -> ApiResult<Vec<NamedItem>>,
{
    let src = list(cx.src).api_context(&format!("Fetching {stage} from source"))?;
    let dest = list(cx.dest).api_context(&format!("Fetching {stage} from destination"))?;
    cx.started(stage, src.len());
    let matched = match_only(kind, &src, &dest, &mut cx.map, &ByName);
    cx.finished(StageSummary::matched(stage, src.len(), matched));
    Ok(())
}

fn match_statuses(cx: &mut StageContext<'_>) -> Result<(), SyncError> {
    let stage = Stage::ProjectStatuses;
    let mut src = cx
        .src
        .list_project_statuses()
        .api_context("Fetching project statuses from source")?;
    src.retain(|s| s.is_deleted != Some(true));
    let dest = cx
        .dest
        .list_project_statuses()
        .api_context("Fetching project statuses from destination")?;
    cx.started(stage, src.len());
    let matched = match_only(EntityKind::ProjectStatus, &src, &dest, &mut cx.map, &ByName);
    cx.finished(StageSummary::matched(stage, src.len(), matched));
    Ok(())
}
