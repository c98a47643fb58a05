use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::HeaderMap,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{instrument, warn};

use super::{active_session, browser_session};
use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::store::{Wallet, load_store, load_wallet, store_history};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<u32>,
}

/// Store view plus the wallet; a wallet failure only blanks the wallet.
#[instrument(skip_all)]
pub async fn get_store(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let session = active_session(&state, &headers).await?;

    let (store, wallet) = tokio::join!(
        load_store(&state.repo, &state.riot, &state.catalog, &session),
        load_wallet(&state.riot, &state.catalog, &session),
    );

    let store = store?;
    let wallet = wallet
        .inspect_err(|e| warn!(error = %e, "🛒 ⚠️ Wallet unavailable"))
        .ok();

    Ok(Json(json!({ "store": store, "wallet": wallet })))
}

#[instrument(skip_all)]
pub async fn get_wallet(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Wallet>, ApiError> {
    let session = active_session(&state, &headers).await?;
    Ok(Json(load_wallet(&state.riot, &state.catalog, &session).await?))
}

pub async fn get_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let sid = browser_session(&state, &headers).await?;

    let account = state
        .accounts
        .get_active_account(&sid)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    let entries = store_history(&state.repo, &account.puuid, query.limit).await?;
    Ok(Json(json!({ "puuid": account.puuid, "entries": entries })))
}
