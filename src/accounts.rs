//! Riot accounts linked to a browser session and which one is active.

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::db::{AccountRow, Repository};
use crate::error::AppError;
use crate::riot::LoginOutcome;
use crate::session::SessionProvider;

/// What the browser is allowed to see about a linked account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub puuid: String,
    pub region: String,
    pub game_name: String,
    pub tag_line: String,
}

impl From<AccountRow> for PublicAccount {
    fn from(row: AccountRow) -> Self {
        Self {
            puuid: row.puuid,
            region: row.region,
            game_name: row.game_name,
            tag_line: row.tag_line,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AccountRegistry {
    repo: Repository,
    sessions: SessionProvider,
}

impl AccountRegistry {
    pub fn new(repo: Repository, sessions: SessionProvider) -> Self {
        Self { repo, sessions }
    }

    /// Stores (or replaces) a logged-in account. It becomes active when the
    /// browser had no active account yet.
    #[instrument(skip_all, fields(puuid = %login.puuid))]
    pub async fn add_account(
        &self,
        session_id: &str,
        login: &LoginOutcome,
    ) -> Result<PublicAccount, AppError> {
        self.repo.create_session(session_id).await?;

        let row = AccountRow {
            session_id: session_id.to_string(),
            puuid: login.puuid.clone(),
            region: login.region.as_str().to_string(),
            game_name: login.game_name.clone(),
            tag_line: login.tag_line.clone(),
            ssid: login.ssid.clone(),
            access_token: login.tokens.access_token.clone(),
            entitlements_token: login.tokens.entitlements_token.clone(),
            expires_at: login.tokens.expires_at,
            updated_at: chrono::Utc::now().timestamp(),
        };
        self.repo.upsert_account(&row).await?;

        if self.repo.get_active_puuid(session_id).await?.is_none() {
            self.repo
                .set_active_puuid(session_id, Some(&login.puuid))
                .await?;
        }

        info!(riot_id = %row.riot_id(), "👤 Account linked");
        Ok(row.into())
    }

    /// Stores a freshly logged-in account and makes it active.
    pub async fn link_account(
        &self,
        session_id: &str,
        login: &LoginOutcome,
    ) -> Result<PublicAccount, AppError> {
        let account = self.add_account(session_id, login).await?;
        self.repo
            .set_active_puuid(session_id, Some(&account.puuid))
            .await?;
        Ok(account)
    }

    /// Makes `puuid` the active account. Returns `false`, leaving the active
    /// account untouched, when the account is unknown or its tokens cannot be
    /// refreshed.
    #[instrument(skip(self, session_id))]
    pub async fn switch_account(&self, session_id: &str, puuid: &str) -> Result<bool, AppError> {
        match self.sessions.session_for(session_id, puuid).await {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(false),
            Err(AppError::AuthRejected) => {
                let active = self.repo.get_active_puuid(session_id).await?;
                if active.as_deref() != Some(puuid) {
                    self.repo.delete_account(session_id, puuid).await?;
                    info!("👤 Dropped account whose credentials Riot rejected");
                }
                return Ok(false);
            }
            Err(e) if e.is_upstream() => {
                warn!(error = %e, "👤 ⚠️ Could not refresh account while switching");
                return Ok(false);
            }
            Err(e) => return Err(e),
        }

        self.repo.set_active_puuid(session_id, Some(puuid)).await?;
        info!("👤 Switched active account");
        Ok(true)
    }

    pub async fn get_active_account(
        &self,
        session_id: &str,
    ) -> Result<Option<PublicAccount>, AppError> {
        let Some(puuid) = self.repo.get_active_puuid(session_id).await? else {
            return Ok(None);
        };
        let account = self.repo.get_account(session_id, &puuid).await?;
        Ok(account.map(PublicAccount::from))
    }

    /// Most recently used first.
    pub async fn list_accounts(&self, session_id: &str) -> Result<Vec<PublicAccount>, AppError> {
        let rows = self.repo.list_accounts(session_id).await?;
        Ok(rows.into_iter().map(PublicAccount::from).collect())
    }

    /// Unlinks an account. When it was active the most recently used
    /// remaining account takes over; the browser session is dropped with its
    /// last account.
    #[instrument(skip(self, session_id))]
    pub async fn remove_account(&self, session_id: &str, puuid: &str) -> Result<bool, AppError> {
        if !self.repo.delete_account(session_id, puuid).await? {
            return Ok(false);
        }

        let remaining = self.repo.list_accounts(session_id).await?;
        let Some(next) = remaining.first() else {
            self.repo.delete_session(session_id).await?;
            info!("👤 Last account removed, browser session closed");
            return Ok(true);
        };

        let active = self.repo.get_active_puuid(session_id).await?;
        if active.as_deref() == Some(puuid) || active.is_none() {
            self.repo
                .set_active_puuid(session_id, Some(&next.puuid))
                .await?;
        }

        info!("👤 Account removed");
        Ok(true)
    }

    /// Whether the browser session is still known server-side.
    pub async fn session_exists(&self, session_id: &str) -> Result<bool, AppError> {
        self.repo.session_exists(session_id).await
    }
}
