//! Credential bundles for the active account, refreshed on demand.

use tracing::{debug, instrument, warn};

use crate::db::{AccountRow, Repository, TokenUpdate};
use crate::error::AppError;
use crate::riot::{Region, RiotClient};

/// Tokens needed to call the PD store endpoints for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub puuid: String,
    pub region: Region,
    pub access_token: String,
    pub entitlements_token: String,
    /// Unix seconds.
    pub expires_at: i64,
}

impl Session {
    fn from_row(row: &AccountRow) -> Result<Self, AppError> {
        Ok(Self {
            puuid: row.puuid.clone(),
            region: row.region.parse()?,
            access_token: row.access_token.clone(),
            entitlements_token: row.entitlements_token.clone(),
            expires_at: row.expires_at,
        })
    }

    pub fn is_fresh(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at > now + margin_secs
    }
}

#[derive(Debug, Clone)]
pub struct SessionProvider {
    repo: Repository,
    riot: RiotClient,
    margin_secs: i64,
}

impl SessionProvider {
    pub fn new(repo: Repository, riot: RiotClient, margin_secs: i64) -> Self {
        Self {
            repo,
            riot,
            margin_secs,
        }
    }

    /// Session of the browser's active account, or `None` when there is no
    /// active account or its tokens could not be refreshed.
    #[instrument(skip_all)]
    pub async fn get_session_with_refresh(&self, session_id: &str) -> Option<Session> {
        let puuid = match self.repo.get_active_puuid(session_id).await {
            Ok(Some(puuid)) => puuid,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "🔑 ⚠️ Failed to read active account");
                return None;
            }
        };

        match self.session_for(session_id, &puuid).await {
            Ok(session) => session,
            Err(e) => {
                warn!(puuid = %puuid, error = %e, "🔑 ⚠️ Session refresh failed");
                None
            }
        }
    }

    /// Session of one linked account, refreshing it when it is about to
    /// expire. `Ok(None)` when the account is not linked to this browser.
    #[instrument(skip(self, session_id))]
    pub async fn session_for(
        &self,
        session_id: &str,
        puuid: &str,
    ) -> Result<Option<Session>, AppError> {
        let Some(row) = self.repo.get_account(session_id, puuid).await? else {
            return Ok(None);
        };

        let session = Session::from_row(&row)?;
        let now = chrono::Utc::now().timestamp();
        if session.is_fresh(now, self.margin_secs) {
            return Ok(Some(session));
        }

        debug!(expires_at = session.expires_at, "🔑 Tokens near expiry, refreshing");
        let tokens = self.riot.refresh_tokens(&row.ssid).await?;

        let update = TokenUpdate {
            access_token: &tokens.access_token,
            entitlements_token: &tokens.entitlements_token,
            expires_at: tokens.expires_at,
            ssid: tokens.rotated_ssid.as_deref(),
        };
        self.repo
            .update_tokens(session_id, puuid, &update, chrono::Utc::now().timestamp())
            .await?;

        let refreshed = Session {
            access_token: tokens.access_token,
            entitlements_token: tokens.entitlements_token,
            expires_at: tokens.expires_at,
            ..session
        };
        if !refreshed.is_fresh(chrono::Utc::now().timestamp(), self.margin_secs) {
            return Err(AppError::ShortLivedTokens {
                expires_at: refreshed.expires_at,
            });
        }

        Ok(Some(refreshed))
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;
    use crate::testing::{
        config_for, mock_reauth_ok, mock_reauth_rejected, mock_reauth_with_lifetime, now,
        seed_account, test_repo,
    };

    async fn provider(server: &MockServer, repo: &Repository) -> SessionProvider {
        let riot = RiotClient::new(&config_for(server)).unwrap();
        SessionProvider::new(repo.clone(), riot, 300)
    }

    #[tokio::test]
    async fn fresh_session_is_returned_without_refresh() {
        let server = MockServer::start_async().await;
        let authorize = server
            .mock_async(|when, then| {
                when.path("/authorize");
                then.status(500);
            })
            .await;
        let repo = test_repo().await;
        seed_account(&repo, "browser", "p1", 3600).await;
        repo.set_active_puuid("browser", Some("p1")).await.unwrap();

        let session = provider(&server, &repo)
            .await
            .get_session_with_refresh("browser")
            .await
            .unwrap();

        authorize.assert_hits_async(0).await;
        assert_eq!(session.puuid, "p1");
        assert_eq!(session.access_token, "access-p1");
        assert_eq!(session.region, Region::Eu);
    }

    #[tokio::test]
    async fn session_within_margin_is_refreshed_and_persisted() {
        let server = MockServer::start_async().await;
        mock_reauth_ok(&server, "p1").await;
        let repo = test_repo().await;
        seed_account(&repo, "browser", "p1", 60).await;
        repo.set_active_puuid("browser", Some("p1")).await.unwrap();

        let session = provider(&server, &repo)
            .await
            .get_session_with_refresh("browser")
            .await
            .unwrap();

        assert_eq!(session.access_token, "fresh-access");
        assert_eq!(session.entitlements_token, "fresh-ent");
        assert!(session.is_fresh(now(), 300));

        let stored = repo.get_account("browser", "p1").await.unwrap().unwrap();
        assert_eq!(stored.access_token, "fresh-access");
        assert_eq!(stored.entitlements_token, "fresh-ent");
        assert_eq!(stored.ssid, "rotated-ssid");
        assert_eq!(stored.expires_at, session.expires_at);
    }

    #[tokio::test]
    async fn rejected_refresh_yields_no_session() {
        let server = MockServer::start_async().await;
        mock_reauth_rejected(&server, "p1").await;
        let repo = test_repo().await;
        seed_account(&repo, "browser", "p1", -10).await;
        repo.set_active_puuid("browser", Some("p1")).await.unwrap();

        let provider = provider(&server, &repo).await;
        assert!(provider.get_session_with_refresh("browser").await.is_none());

        let err = provider.session_for("browser", "p1").await.unwrap_err();
        assert!(matches!(err, AppError::AuthRejected));
    }

    #[tokio::test]
    async fn tokens_expiring_within_margin_are_not_handed_out() {
        let server = MockServer::start_async().await;
        mock_reauth_with_lifetime(&server, "p1", 120).await;
        let repo = test_repo().await;
        seed_account(&repo, "browser", "p1", 0).await;
        repo.set_active_puuid("browser", Some("p1")).await.unwrap();

        let provider = provider(&server, &repo).await;
        let err = provider.session_for("browser", "p1").await.unwrap_err();
        assert!(matches!(err, AppError::ShortLivedTokens { .. }));

        // The rotated cookie is still worth keeping.
        let stored = repo.get_account("browser", "p1").await.unwrap().unwrap();
        assert_eq!(stored.ssid, "rotated-ssid");

        assert!(provider.get_session_with_refresh("browser").await.is_none());
    }

    #[tokio::test]
    async fn zero_lifetime_uses_the_default() {
        let server = MockServer::start_async().await;
        mock_reauth_with_lifetime(&server, "p1", 0).await;
        let repo = test_repo().await;
        seed_account(&repo, "browser", "p1", 0).await;
        repo.set_active_puuid("browser", Some("p1")).await.unwrap();

        let session = provider(&server, &repo)
            .await
            .get_session_with_refresh("browser")
            .await
            .unwrap();

        assert!(session.expires_at > now() + 300);
    }

    #[tokio::test]
    async fn no_active_account_yields_no_session() {
        let server = MockServer::start_async().await;
        let repo = test_repo().await;
        seed_account(&repo, "browser", "p1", 3600).await;

        let provider = provider(&server, &repo).await;
        assert!(provider.get_session_with_refresh("browser").await.is_none());
        assert!(provider.get_session_with_refresh("unknown").await.is_none());
        assert!(provider.session_for("browser", "p2").await.unwrap().is_none());
    }
}
