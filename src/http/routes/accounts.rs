use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::browser_session;
use crate::http::cookies::{active_cookie, session_id};
use crate::http::error::ApiError;
use crate::http::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    #[serde(default)]
    puuid: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let sid = browser_session(&state, &headers).await?;

    let accounts = state.accounts.list_accounts(&sid).await?;
    let active = state.accounts.get_active_account(&sid).await?;

    Ok(Json(json!({ "accounts": accounts, "activeAccount": active })).into_response())
}

#[instrument(skip_all)]
pub async fn switch(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SwitchRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let puuid = body
        .puuid
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("puuid is required"))?;

    // Without a browser session the registry is empty, so the switch fails.
    let sid = session_id(&headers).ok_or_else(ApiError::account_not_found)?;

    if !state.accounts.switch_account(&sid, &puuid).await? {
        return Err(ApiError::account_not_found());
    }

    let active = state
        .accounts
        .get_active_account(&sid)
        .await?
        .ok_or_else(ApiError::account_not_found)?;

    let message = format!("Switched to {}#{}", active.game_name, active.tag_line);
    let cookie = active_cookie(&active.puuid, state.config.cookie_secure);

    Ok((
        [(SET_COOKIE, cookie)],
        Json(json!({
            "success": true,
            "message": message,
            "activeAccount": active,
        })),
    )
        .into_response())
}
