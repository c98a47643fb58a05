//! Fixtures shared by the unit tests.

use httpmock::prelude::*;
use serde_json::json;

use crate::config::Config;
use crate::db::{AccountRow, Repository, test_pool};

/// Every upstream pointed at the same mock server.
pub(crate) fn config_for(server: &MockServer) -> Config {
    Config {
        riot_auth_url: server.base_url(),
        riot_entitlements_url: server.base_url(),
        riot_geo_url: server.base_url(),
        riot_pd_url: Some(server.base_url()),
        catalog_url: server.base_url(),
        henrik_url: server.base_url(),
        ..Config::default()
    }
}

pub(crate) async fn test_repo() -> Repository {
    Repository::new(test_pool().await)
}

pub(crate) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Stores an account whose tokens expire `expires_in` seconds from now.
pub(crate) async fn seed_account(
    repo: &Repository,
    session_id: &str,
    puuid: &str,
    expires_in: i64,
) -> AccountRow {
    let row = AccountRow {
        session_id: session_id.into(),
        puuid: puuid.into(),
        region: "eu".into(),
        game_name: format!("Player-{puuid}"),
        tag_line: "EUW".into(),
        ssid: format!("ssid-{puuid}"),
        access_token: format!("access-{puuid}"),
        entitlements_token: format!("ent-{puuid}"),
        expires_at: now() + expires_in,
        updated_at: now(),
    };
    repo.create_session(session_id).await.unwrap();
    repo.upsert_account(&row).await.unwrap();
    row
}

/// Riot accepts `ssid-{puuid}` and answers with `fresh-access` / `fresh-ent`.
pub(crate) async fn mock_reauth_ok(server: &MockServer, puuid: &str) {
    mock_reauth_with_lifetime(server, puuid, 3600).await;
}

/// Same as [`mock_reauth_ok`] with a chosen `expires_in`.
pub(crate) async fn mock_reauth_with_lifetime(server: &MockServer, puuid: &str, expires_in: i64) {
    let cookie = format!("ssid=ssid-{puuid}");
    let location = format!(
        "https://playvalorant.com/opt_in#access_token=fresh-access&id_token=id&expires_in={expires_in}"
    );
    server
        .mock_async(|when, then| {
            when.method(GET).path("/authorize").header("cookie", cookie);
            then.status(303)
                .header("location", location)
                .header("set-cookie", "ssid=rotated-ssid; Path=/; HttpOnly");
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/token/v1")
                .header("authorization", "Bearer fresh-access");
            then.status(200)
                .json_body(json!({"entitlements_token": "fresh-ent"}));
        })
        .await;
}

/// Riot no longer accepts `ssid-{puuid}`.
pub(crate) async fn mock_reauth_rejected(server: &MockServer, puuid: &str) {
    let cookie = format!("ssid=ssid-{puuid}");
    server
        .mock_async(|when, then| {
            when.method(GET).path("/authorize").header("cookie", cookie);
            then.status(303)
                .header("location", "https://authenticate.riotgames.com/?client_id=x");
        })
        .await;
}
