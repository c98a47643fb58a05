//! Owned skins: live fetch with a per-account cache as fallback.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::catalog::{CatalogClient, SkinIndex, SkinRecord};
use crate::db::Repository;
use crate::error::AppError;
use crate::riot::RiotClient;
use crate::riot::types::EntitlementsDto;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub puuid: String,
    pub skins: Vec<SkinRecord>,
    /// Unix seconds.
    pub captured_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    #[serde(flatten)]
    pub inventory: InventoryRecord,
    pub from_cache: bool,
}

/// Fetches the player's skin level entitlements and resolves them through
/// the catalog.
#[instrument(skip_all, fields(puuid = %session.puuid))]
pub async fn get_owned_skins(
    riot: &RiotClient,
    catalog: &CatalogClient,
    session: &Session,
) -> Result<InventoryRecord, AppError> {
    let version = catalog.client_version().await?;
    let entitlements = riot.get_owned_skin_levels(session, &version).await?;
    let index = catalog.skin_index().await?;

    Ok(hydrate_inventory(
        &session.puuid,
        &entitlements,
        &index,
        chrono::Utc::now().timestamp(),
    ))
}

/// One record per skin, sorted by name. Levels the catalog does not know
/// are dropped.
pub fn hydrate_inventory(
    puuid: &str,
    entitlements: &EntitlementsDto,
    index: &SkinIndex,
    captured_at: i64,
) -> InventoryRecord {
    let mut seen = HashSet::new();
    let mut skins = Vec::new();

    for entitlement in &entitlements.entitlements {
        let Some(skin) = index.lookup(&entitlement.item_id) else {
            debug!(item_id = %entitlement.item_id, "🎒 Unknown skin level skipped");
            continue;
        };
        if seen.insert(skin.uuid.clone()) {
            skins.push(skin.clone());
        }
    }

    skins.sort_by(|a, b| a.name.cmp(&b.name));

    InventoryRecord {
        puuid: puuid.to_string(),
        skins,
        captured_at,
    }
}

pub async fn read_cached_inventory(
    repo: &Repository,
    puuid: &str,
) -> Result<Option<InventoryRecord>, AppError> {
    let Some(row) = repo.get_cached_inventory(puuid).await? else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(&row.payload)?))
}

pub async fn write_cached_inventory(
    repo: &Repository,
    inventory: &InventoryRecord,
) -> Result<(), AppError> {
    let payload = serde_json::to_string(inventory)?;
    repo.put_cached_inventory(&inventory.puuid, &payload, inventory.captured_at)
        .await
}

/// Live inventory, or the last cached one when the live fetch fails.
///
/// When both fail the live error is returned so the caller can report the
/// upstream failure; a cache read failure is returned as is.
#[instrument(skip_all, fields(puuid = %session.puuid))]
pub async fn load_inventory(
    repo: &Repository,
    riot: &RiotClient,
    catalog: &CatalogClient,
    session: &Session,
) -> Result<InventoryResponse, AppError> {
    let live_error = match get_owned_skins(riot, catalog, session).await {
        Ok(inventory) => {
            if let Err(e) = write_cached_inventory(repo, &inventory).await {
                warn!(error = %e, "🎒 ⚠️ Failed to cache inventory");
            }
            info!(skins = inventory.skins.len(), "🎒 Inventory fetched");
            return Ok(InventoryResponse {
                inventory,
                from_cache: false,
            });
        }
        Err(e) => e,
    };

    warn!(error = %live_error, "🎒 ⚠️ Live inventory fetch failed, trying cache");

    match read_cached_inventory(repo, &session.puuid).await? {
        Some(inventory) => Ok(InventoryResponse {
            inventory,
            from_cache: true,
        }),
        None => Err(live_error),
    }
}
