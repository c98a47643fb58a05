use axum::{Json, extract::State, http::HeaderMap};
use serde_json::{Value, json};

use super::browser_session;
use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::riot::Region;

pub async fn get_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let sid = browser_session(&state, &headers).await?;
    let account = state
        .accounts
        .get_active_account(&sid)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    let region: Region = account.region.parse()?;
    let stats = state
        .henrik
        .player_stats(&account.game_name, &account.tag_line, region)
        .await;

    Ok(Json(json!({
        "account": account,
        "level": stats.account,
        "rank": stats.rank,
    })))
}
