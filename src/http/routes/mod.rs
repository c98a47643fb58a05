pub mod accounts;
pub mod auth;
pub mod inventory;
pub mod stats;
pub mod store;

use axum::Json;
use axum::http::HeaderMap;
use serde_json::{Value, json};

use super::cookies::session_id;
use super::error::ApiError;
use super::state::AppState;
use crate::session::Session;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Browser session id of a request whose session is known server-side.
async fn browser_session(state: &AppState, headers: &HeaderMap) -> Result<String, ApiError> {
    let sid = session_id(headers).ok_or_else(ApiError::unauthorized)?;
    if !state.accounts.session_exists(&sid).await? {
        return Err(ApiError::unauthorized());
    }
    Ok(sid)
}

/// Usable credentials of the active account, refreshed if needed.
async fn active_session(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let sid = session_id(headers).ok_or_else(ApiError::unauthorized)?;
    state
        .sessions
        .get_session_with_refresh(&sid)
        .await
        .ok_or_else(ApiError::unauthorized)
}
