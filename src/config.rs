use std::env;
use std::num::NonZeroU32;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub riot_auth_url: String,
    pub riot_entitlements_url: String,
    pub riot_geo_url: String,
    /// Replaces the per-shard `https://pd.{shard}.a.pvp.net` base when set.
    pub riot_pd_url: Option<String>,
    pub catalog_url: String,
    pub henrik_url: String,
    pub henrik_api_key: Option<String>,
    pub token_refresh_margin_secs: i64,
    pub riot_rate_limit_per_second: NonZeroU32,
    pub http_timeout: Duration,
    pub cookie_secure: bool,
    pub static_dir: Option<String>,
}

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_DATABASE_URL: &str = "sqlite:valshop.db?mode=rwc";
const DEFAULT_RIOT_AUTH_URL: &str = "https://auth.riotgames.com";
const DEFAULT_RIOT_ENTITLEMENTS_URL: &str = "https://entitlements.auth.riotgames.com";
const DEFAULT_RIOT_GEO_URL: &str = "https://riot-geo.pas.si.riotgames.com";
const DEFAULT_CATALOG_URL: &str = "https://valorant-api.com";
const DEFAULT_HENRIK_URL: &str = "https://api.henrikdev.xyz";
const DEFAULT_TOKEN_REFRESH_MARGIN_SECS: i64 = 300;
const DEFAULT_RIOT_RATE_LIMIT_PER_SECOND: u32 = 20;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            riot_auth_url: DEFAULT_RIOT_AUTH_URL.into(),
            riot_entitlements_url: DEFAULT_RIOT_ENTITLEMENTS_URL.into(),
            riot_geo_url: DEFAULT_RIOT_GEO_URL.into(),
            riot_pd_url: None,
            catalog_url: DEFAULT_CATALOG_URL.into(),
            henrik_url: DEFAULT_HENRIK_URL.into(),
            henrik_api_key: None,
            token_refresh_margin_secs: DEFAULT_TOKEN_REFRESH_MARGIN_SECS,
            riot_rate_limit_per_second: NonZeroU32::new(DEFAULT_RIOT_RATE_LIMIT_PER_SECOND)
                .unwrap_or(NonZeroU32::MIN),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            cookie_secure: false,
            static_dir: None,
        }
    }
}

impl Config {
    /// Reads the environment. `.env` must already be loaded.
    pub fn from_env() -> Result<Self, AppError> {
        let defaults = Self::default();

        let token_refresh_margin_secs = match env::var("TOKEN_REFRESH_MARGIN_SECS") {
            Ok(v) => v.parse().map_err(|_| {
                AppError::Config(format!("TOKEN_REFRESH_MARGIN_SECS is not a number: {v}"))
            })?,
            Err(_) => defaults.token_refresh_margin_secs,
        };

        if token_refresh_margin_secs < 0 {
            return Err(AppError::Config(
                "TOKEN_REFRESH_MARGIN_SECS must not be negative".into(),
            ));
        }

        let riot_rate_limit_per_second = env::var("RIOT_RATE_LIMIT_PER_SECOND")
            .ok()
            .and_then(|v| v.parse().ok())
            .and_then(NonZeroU32::new)
            .unwrap_or(defaults.riot_rate_limit_per_second);

        let http_timeout = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.http_timeout);

        let cookie_secure = env::var("COOKIE_SECURE")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.cookie_secure);

        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            riot_auth_url: env::var("RIOT_AUTH_URL").unwrap_or(defaults.riot_auth_url),
            riot_entitlements_url: env::var("RIOT_ENTITLEMENTS_URL")
                .unwrap_or(defaults.riot_entitlements_url),
            riot_geo_url: env::var("RIOT_GEO_URL").unwrap_or(defaults.riot_geo_url),
            riot_pd_url: non_empty_var("RIOT_PD_URL"),
            catalog_url: env::var("CATALOG_URL").unwrap_or(defaults.catalog_url),
            henrik_url: env::var("HENRIK_URL").unwrap_or(defaults.henrik_url),
            henrik_api_key: non_empty_var("HENRIK_API_KEY"),
            token_refresh_margin_secs,
            riot_rate_limit_per_second,
            http_timeout,
            cookie_secure,
            static_dir: non_empty_var("STATIC_DIR"),
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
