use sqlx::SqlitePool;

use super::models::{AccountRow, InventoryCacheRow, StoreHistoryRow, TokenUpdate};
use crate::error::AppError;

const ACCOUNT_COLUMN_NAMES: [&str; 10] = [
    "session_id",
    "puuid",
    "region",
    "game_name",
    "tag_line",
    "ssid",
    "access_token",
    "entitlements_token",
    "expires_at",
    "updated_at",
];

fn account_columns() -> String {
    ACCOUNT_COLUMN_NAMES.join(", ")
}

#[derive(Clone, Debug)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // === Browser sessions ===

    pub async fn create_session(&self, session_id: &str) -> Result<(), AppError> {
        sqlx::query("INSERT OR IGNORE INTO browser_sessions (id) VALUES (?)")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn session_exists(&self, session_id: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM browser_sessions WHERE id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(exists.is_some())
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM browser_sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_active_puuid(&self, session_id: &str) -> Result<Option<String>, AppError> {
        let active = sqlx::query_scalar::<_, Option<String>>(
            "SELECT active_puuid FROM browser_sessions WHERE id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(active.flatten())
    }

    pub async fn set_active_puuid(
        &self,
        session_id: &str,
        puuid: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE browser_sessions SET active_puuid = ? WHERE id = ?")
            .bind(puuid)
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // === Accounts ===

    pub async fn upsert_account(&self, account: &AccountRow) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (session_id, puuid, region, game_name, tag_line, ssid,
                                  access_token, entitlements_token, expires_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id, puuid) DO UPDATE SET
                region = excluded.region,
                game_name = excluded.game_name,
                tag_line = excluded.tag_line,
                ssid = excluded.ssid,
                access_token = excluded.access_token,
                entitlements_token = excluded.entitlements_token,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&account.session_id)
        .bind(&account.puuid)
        .bind(&account.region)
        .bind(&account.game_name)
        .bind(&account.tag_line)
        .bind(&account.ssid)
        .bind(&account.access_token)
        .bind(&account.entitlements_token)
        .bind(account.expires_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_account(
        &self,
        session_id: &str,
        puuid: &str,
    ) -> Result<Option<AccountRow>, AppError> {
        let columns = account_columns();
        let account = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {columns} FROM accounts WHERE session_id = ? AND puuid = ?"
        ))
        .bind(session_id)
        .bind(puuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    /// Most recently updated first.
    pub async fn list_accounts(&self, session_id: &str) -> Result<Vec<AccountRow>, AppError> {
        let columns = account_columns();
        let accounts = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {columns} FROM accounts WHERE session_id = ? ORDER BY updated_at DESC, rowid DESC"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(accounts)
    }

    pub async fn update_tokens(
        &self,
        session_id: &str,
        puuid: &str,
        tokens: &TokenUpdate<'_>,
        updated_at: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE accounts SET
                access_token = ?,
                entitlements_token = ?,
                expires_at = ?,
                ssid = COALESCE(?, ssid),
                updated_at = ?
            WHERE session_id = ? AND puuid = ?
            "#,
        )
        .bind(tokens.access_token)
        .bind(tokens.entitlements_token)
        .bind(tokens.expires_at)
        .bind(tokens.ssid)
        .bind(updated_at)
        .bind(session_id)
        .bind(puuid)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete_account(&self, session_id: &str, puuid: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM accounts WHERE session_id = ? AND puuid = ?")
            .bind(session_id)
            .bind(puuid)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // === Inventory cache ===

    pub async fn get_cached_inventory(
        &self,
        puuid: &str,
    ) -> Result<Option<InventoryCacheRow>, AppError> {
        let row = sqlx::query_as::<_, InventoryCacheRow>(
            "SELECT puuid, payload, captured_at FROM inventory_cache WHERE puuid = ?",
        )
        .bind(puuid)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn put_cached_inventory(
        &self,
        puuid: &str,
        payload: &str,
        captured_at: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO inventory_cache (puuid, payload, captured_at)
            VALUES (?, ?, ?)
            ON CONFLICT(puuid) DO UPDATE SET
                payload = excluded.payload,
                captured_at = excluded.captured_at
            "#,
        )
        .bind(puuid)
        .bind(payload)
        .bind(captured_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // === Store history ===

    pub async fn upsert_store_history(
        &self,
        puuid: &str,
        date: &str,
        offers: &str,
        recorded_at: i64,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO store_history (puuid, date, offers, recorded_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(puuid, date) DO UPDATE SET
                offers = excluded.offers,
                recorded_at = excluded.recorded_at
            "#,
        )
        .bind(puuid)
        .bind(date)
        .bind(offers)
        .bind(recorded_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_store_history(
        &self,
        puuid: &str,
        limit: u32,
    ) -> Result<Vec<StoreHistoryRow>, AppError> {
        let rows = sqlx::query_as::<_, StoreHistoryRow>(
            r#"
            SELECT puuid, date, offers, recorded_at
            FROM store_history
            WHERE puuid = ?
            ORDER BY date DESC
            LIMIT ?
            "#,
        )
        .bind(puuid)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
