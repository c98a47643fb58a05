use std::sync::Arc;

use crate::accounts::AccountRegistry;
use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::db::Repository;
use crate::error::AppError;
use crate::henrik::HenrikClient;
use crate::riot::RiotClient;
use crate::session::SessionProvider;

/// Shared by every handler. All members are cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub repo: Repository,
    pub riot: RiotClient,
    pub catalog: CatalogClient,
    pub henrik: HenrikClient,
    pub sessions: SessionProvider,
    pub accounts: AccountRegistry,
}

impl AppState {
    pub fn new(config: Config, repo: Repository) -> Result<Self, AppError> {
        let riot = RiotClient::new(&config)?;
        let catalog = CatalogClient::new(&config)?;
        let henrik = HenrikClient::new(&config)?;
        let sessions = SessionProvider::new(
            repo.clone(),
            riot.clone(),
            config.token_refresh_margin_secs,
        );
        let accounts = AccountRegistry::new(repo.clone(), sessions.clone());

        Ok(Self {
            config: Arc::new(config),
            repo,
            riot,
            catalog,
            henrik,
            sessions,
            accounts,
        })
    }
}
