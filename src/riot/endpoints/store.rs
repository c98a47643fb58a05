use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use crate::error::AppError;
use crate::riot::client::RiotClient;
use crate::riot::types::{EntitlementsDto, SKIN_LEVEL_ITEM_TYPE, StorefrontDto, WalletDto};
use crate::session::Session;

impl RiotClient {
    /// Daily offers, featured bundles and the night market when it runs.
    #[instrument(skip_all, fields(puuid = %session.puuid))]
    pub async fn get_storefront(
        &self,
        session: &Session,
        client_version: &str,
    ) -> Result<StorefrontDto, AppError> {
        let path = format!("/store/v3/storefront/{}", session.puuid);
        let request = self
            .pd_request(Method::POST, session, &path, client_version)
            .json(&json!({}));

        self.send_json(request, "Storefront").await
    }

    #[instrument(skip_all, fields(puuid = %session.puuid))]
    pub async fn get_wallet(
        &self,
        session: &Session,
        client_version: &str,
    ) -> Result<WalletDto, AppError> {
        let path = format!("/store/v1/wallet/{}", session.puuid);
        let request = self.pd_request(Method::GET, session, &path, client_version);

        self.send_json(request, "Wallet").await
    }

    /// Skin levels owned by the player.
    #[instrument(skip_all, fields(puuid = %session.puuid))]
    pub async fn get_owned_skin_levels(
        &self,
        session: &Session,
        client_version: &str,
    ) -> Result<EntitlementsDto, AppError> {
        let path = format!(
            "/store/v1/entitlements/{}/{}",
            session.puuid, SKIN_LEVEL_ITEM_TYPE
        );
        let request = self.pd_request(Method::GET, session, &path, client_version);

        self.send_json(request, "Entitlements").await
    }
}
