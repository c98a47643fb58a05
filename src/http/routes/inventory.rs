use axum::{Json, extract::State, http::HeaderMap};
use tracing::instrument;

use super::active_session;
use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::inventory::{InventoryResponse, load_inventory};

/// Live inventory, the cached one with `fromCache: true` when Riot fails.
#[instrument(skip_all)]
pub async fn get_inventory(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<InventoryResponse>, ApiError> {
    let session = active_session(&state, &headers).await?;

    let inventory = load_inventory(&state.repo, &state.riot, &state.catalog, &session).await?;
    Ok(Json(inventory))
}
