use axum::{
    Json,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::browser_session;
use crate::error::AppError;
use crate::http::cookies::{
    ACTIVE_COOKIE, SESSION_COOKIE, active_cookie, expired_cookie, session_cookie, session_id,
};
use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::riot::Region;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    ssid: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    puuid: Option<String>,
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let ssid = body
        .ssid
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request("ssid is required"))?;

    let region = body
        .region
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(str::parse::<Region>)
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let outcome = match state.riot.login_with_ssid(ssid, region).await {
        Ok(outcome) => outcome,
        Err(AppError::AuthRejected) => return Err(ApiError::invalid_credentials()),
        Err(AppError::InvalidRegion(message)) => {
            warn!(%message, "🔑 ⚠️ Could not determine account region");
            return Err(ApiError::bad_request(
                "Could not determine the account region, please provide it",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    // Reuse the browser session only when we still know it.
    let sid = match session_id(&headers) {
        Some(sid) if state.accounts.session_exists(&sid).await? => sid,
        _ => uuid::Uuid::new_v4().to_string(),
    };

    let account = state.accounts.link_account(&sid, &outcome).await?;
    info!(puuid = %account.puuid, "🔑 Login succeeded");

    let secure = state.config.cookie_secure;
    let cookies = AppendHeaders([
        (SET_COOKIE, session_cookie(&sid, secure)),
        (SET_COOKIE, active_cookie(&account.puuid, secure)),
    ]);

    Ok((cookies, Json(json!({ "success": true, "account": account }))).into_response())
}

#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let sid = browser_session(&state, &headers).await?;

    let request: LogoutRequest = if body.iter().all(u8::is_ascii_whitespace) {
        LogoutRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::bad_request(e.to_string()))?
    };

    let puuid = match request.puuid.filter(|p| !p.is_empty()) {
        Some(puuid) => puuid,
        None => state
            .accounts
            .get_active_account(&sid)
            .await?
            .map(|account| account.puuid)
            .ok_or_else(|| ApiError::bad_request("No account to log out"))?,
    };

    if !state.accounts.remove_account(&sid, &puuid).await? {
        return Err(ApiError::account_not_found());
    }

    let active = state.accounts.get_active_account(&sid).await?;
    let secure = state.config.cookie_secure;
    let cookies = match &active {
        Some(account) => AppendHeaders([
            (SET_COOKIE, session_cookie(&sid, secure)),
            (SET_COOKIE, active_cookie(&account.puuid, secure)),
        ]),
        None => AppendHeaders([
            (SET_COOKIE, expired_cookie(SESSION_COOKIE)),
            (SET_COOKIE, expired_cookie(ACTIVE_COOKIE)),
        ]),
    };

    Ok((
        cookies,
        Json(json!({ "success": true, "activeAccount": active })),
    )
        .into_response())
}
