//! Account level and competitive rank from the HenrikDev community API.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::riot::Region;
use crate::riot::client::{trim_base, truncate_utf8};
use crate::validation::{Issue, Validate, parse_bytes_with_log, require_non_negative};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountStats {
    pub account_level: i64,
    pub card: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankStats {
    pub tier: i64,
    pub tier_name: Option<String>,
    /// Rank rating within the current tier.
    pub rr: i64,
    pub elo: Option<i64>,
    pub image: Option<String>,
    pub peak_tier_name: Option<String>,
}

/// Either part is `None` when its lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub account: Option<AccountStats>,
    pub rank: Option<RankStats>,
}

#[derive(Clone)]
pub struct HenrikClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for HenrikClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HenrikClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl HenrikClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: trim_base(&config.henrik_url),
            api_key: config.henrik_api_key.clone(),
        })
    }

    /// Level and rank for a Riot id. Never fails: a part that could not be
    /// fetched is left empty.
    #[instrument(skip(self))]
    pub async fn player_stats(
        &self,
        game_name: &str,
        tag_line: &str,
        region: Region,
    ) -> PlayerStats {
        let (account, rank) = tokio::join!(
            self.account(game_name, tag_line),
            self.rank(game_name, tag_line, region)
        );

        PlayerStats {
            account: account
                .inspect_err(|e| warn!(error = %e, "📊 ⚠️ Account stats unavailable"))
                .ok(),
            rank: rank
                .inspect_err(|e| warn!(error = %e, "📊 ⚠️ Rank unavailable"))
                .ok()
                .flatten(),
        }
    }

    pub async fn account(&self, game_name: &str, tag_line: &str) -> Result<AccountStats, AppError> {
        let path = format!(
            "/valorant/v1/account/{}/{}",
            urlencoding::encode(game_name),
            urlencoding::encode(tag_line)
        );
        let dto: HenrikEnvelope<AccountDto> = self.fetch(&path, "HenrikAccount").await?;

        Ok(AccountStats {
            account_level: dto.data.account_level,
            card: dto.data.card.and_then(|card| card.small),
        })
    }

    /// `None` for unranked players.
    pub async fn rank(
        &self,
        game_name: &str,
        tag_line: &str,
        region: Region,
    ) -> Result<Option<RankStats>, AppError> {
        let path = format!(
            "/valorant/v2/mmr/{}/{}/{}",
            region.as_str(),
            urlencoding::encode(game_name),
            urlencoding::encode(tag_line)
        );
        let dto: HenrikEnvelope<MmrDto> = self.fetch(&path, "HenrikMmr").await?;

        let Some(current) = dto.data.current_data else {
            return Ok(None);
        };
        if current.currenttier == 0 {
            debug!("📊 Player is unranked");
            return Ok(None);
        }

        Ok(Some(RankStats {
            tier: current.currenttier,
            tier_name: current.currenttierpatched,
            rr: current.ranking_in_tier,
            elo: current.elo,
            image: current.images.and_then(|images| images.small),
            peak_tier_name: dto.data.highest_rank.and_then(|peak| peak.patched_tier),
        }))
    }

    async fn fetch<T>(&self, path: &str, schema_name: &str) -> Result<T, AppError>
    where
        T: DeserializeOwned + Validate,
    {
        let mut request = self.http.get(format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            request = request.header(reqwest::header::AUTHORIZATION, key);
        }

        let res = request.send().await?;
        let status = res.status();
        if !status.is_success() {
            let mut message = res.text().await.unwrap_or_default();
            truncate_utf8(&mut message, 200);
            return Err(AppError::Henrik {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = res.bytes().await?;
        Ok(parse_bytes_with_log(&bytes, schema_name)?)
    }
}

#[derive(Debug, Deserialize)]
struct HenrikEnvelope<T> {
    data: T,
}

impl<T: Validate> Validate for HenrikEnvelope<T> {
    fn validate(&self, issues: &mut Vec<Issue>) {
        self.data.validate(issues);
    }
}

#[derive(Debug, Deserialize)]
struct AccountDto {
    account_level: i64,
    #[serde(default)]
    card: Option<CardDto>,
}

impl Validate for AccountDto {
    fn validate(&self, issues: &mut Vec<Issue>) {
        require_non_negative(issues, "$.data.account_level", self.account_level);
    }
}

#[derive(Debug, Deserialize)]
struct CardDto {
    #[serde(default)]
    small: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MmrDto {
    #[serde(default)]
    current_data: Option<CurrentMmrDto>,
    #[serde(default)]
    highest_rank: Option<HighestRankDto>,
}

#[derive(Debug, Deserialize)]
struct CurrentMmrDto {
    #[serde(default)]
    currenttier: i64,
    #[serde(default)]
    currenttierpatched: Option<String>,
    #[serde(default)]
    ranking_in_tier: i64,
    #[serde(default)]
    elo: Option<i64>,
    #[serde(default)]
    images: Option<RankImagesDto>,
}

#[derive(Debug, Deserialize)]
struct RankImagesDto {
    #[serde(default)]
    small: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HighestRankDto {
    #[serde(default)]
    patched_tier: Option<String>,
}

impl Validate for MmrDto {
    fn validate(&self, issues: &mut Vec<Issue>) {
        if let Some(current) = &self.current_data {
            require_non_negative(issues, "$.data.current_data.currenttier", current.currenttier);
            require_non_negative(
                issues,
                "$.data.current_data.ranking_in_tier",
                current.ranking_in_tier,
            );
        }
    }
}
