use sqlx::FromRow;

/// One Riot account linked to a browser session, credentials included.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct AccountRow {
    pub session_id: String,
    pub puuid: String,
    pub region: String,
    pub game_name: String,
    pub tag_line: String,
    pub ssid: String,
    pub access_token: String,
    pub entitlements_token: String,
    pub expires_at: i64,
    pub updated_at: i64,
}

impl AccountRow {
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }
}

/// Tokens written back after a refresh.
#[derive(Debug, Clone)]
pub struct TokenUpdate<'a> {
    pub access_token: &'a str,
    pub entitlements_token: &'a str,
    pub expires_at: i64,
    pub ssid: Option<&'a str>,
}

#[derive(Debug, Clone, FromRow)]
pub struct InventoryCacheRow {
    pub puuid: String,
    pub payload: String,
    pub captured_at: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct StoreHistoryRow {
    pub puuid: String,
    pub date: String,
    pub offers: String,
    pub recorded_at: i64,
}
