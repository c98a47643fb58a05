use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppError;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS browser_sessions (
    id TEXT PRIMARY KEY NOT NULL,
    active_puuid TEXT,
    created_at INTEGER NOT NULL DEFAULT (unixepoch())
);

CREATE TABLE IF NOT EXISTS accounts (
    session_id TEXT NOT NULL,
    puuid TEXT NOT NULL,
    region TEXT NOT NULL,
    game_name TEXT NOT NULL,
    tag_line TEXT NOT NULL,
    ssid TEXT NOT NULL,
    access_token TEXT NOT NULL,
    entitlements_token TEXT NOT NULL,
    expires_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    PRIMARY KEY (session_id, puuid),
    FOREIGN KEY (session_id) REFERENCES browser_sessions(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS inventory_cache (
    puuid TEXT PRIMARY KEY NOT NULL,
    payload TEXT NOT NULL,
    captured_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS store_history (
    puuid TEXT NOT NULL,
    date TEXT NOT NULL,
    offers TEXT NOT NULL,
    recorded_at INTEGER NOT NULL,
    PRIMARY KEY (puuid, date)
);

CREATE INDEX IF NOT EXISTS idx_accounts_session ON accounts(session_id);
CREATE INDEX IF NOT EXISTS idx_store_history_puuid ON store_history(puuid, date DESC);
"#;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), AppError> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    info!("🗄️ Database migrations completed");
    Ok(())
}
