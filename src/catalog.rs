//! Static cosmetics catalog (valorant-api.com).
//!
//! Riot's store endpoints only hand out UUIDs. The catalog turns them into
//! names, images and editions. Everything fetched here changes once per
//! patch, so results are memoized for a few hours.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::riot::client::{trim_base, truncate_utf8};
use crate::validation::{Issue, Validate, parse_bytes_with_log, require_non_empty};

const SKINS_TTL: Duration = Duration::from_secs(6 * 60 * 60);
const VERSION_TTL: Duration = Duration::from_secs(60 * 60);

/// Display-ready weapon skin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkinRecord {
    pub uuid: String,
    pub level_uuid: String,
    pub name: String,
    pub image: Option<String>,
    /// Content tier (edition) name, e.g. `Premium`.
    pub rarity: Option<String>,
    pub rarity_color: Option<String>,
}

/// Display metadata of a featured bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleInfo {
    pub uuid: String,
    pub name: String,
    pub image: Option<String>,
    pub promo_image: Option<String>,
}

/// Skin records keyed by skin level UUID, the id used by store offers and
/// entitlements.
#[derive(Debug, Default)]
pub struct SkinIndex {
    by_level: HashMap<String, SkinRecord>,
}

impl SkinIndex {
    pub fn from_records(records: impl IntoIterator<Item = SkinRecord>) -> Self {
        Self {
            by_level: records
                .into_iter()
                .map(|record| (record.level_uuid.to_lowercase(), record))
                .collect(),
        }
    }

    fn from_catalog(skins: Vec<SkinDto>, tiers: Vec<ContentTierDto>) -> Self {
        let tiers: HashMap<String, ContentTierDto> = tiers
            .into_iter()
            .map(|tier| (tier.uuid.to_lowercase(), tier))
            .collect();

        let records = skins.into_iter().flat_map(|skin| {
            let tier = skin
                .content_tier_uuid
                .as_deref()
                .and_then(|uuid| tiers.get(&uuid.to_lowercase()));
            let rarity = tier.map(|t| t.dev_name.clone());
            let rarity_color = tier.and_then(|t| t.highlight_color.as_deref().map(css_color));

            skin.levels
                .into_iter()
                .map(|level| SkinRecord {
                    uuid: skin.uuid.clone(),
                    level_uuid: level.uuid,
                    name: skin.display_name.clone(),
                    image: level.display_icon.or_else(|| skin.display_icon.clone()),
                    rarity: rarity.clone(),
                    rarity_color: rarity_color.clone(),
                })
                .collect::<Vec<_>>()
        });

        Self::from_records(records)
    }

    pub fn lookup(&self, level_uuid: &str) -> Option<&SkinRecord> {
        self.by_level.get(&level_uuid.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.by_level.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_level.is_empty()
    }
}

/// `f5955bff` → `#f5955b`
fn css_color(rgba: &str) -> String {
    format!("#{}", rgba.get(..6).unwrap_or(rgba))
}

struct Memo<T> {
    value: Arc<T>,
    fetched_at: Instant,
}

#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    skins: Arc<RwLock<Option<Memo<SkinIndex>>>>,
    version: Arc<RwLock<Option<Memo<String>>>>,
    bundles: Arc<RwLock<HashMap<String, BundleInfo>>>,
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CatalogClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: trim_base(&config.catalog_url),
            skins: Arc::default(),
            version: Arc::default(),
            bundles: Arc::default(),
        })
    }

    /// Client version string expected by the PD endpoints.
    pub async fn client_version(&self) -> Result<String, AppError> {
        if let Some(memo) = self.version.read().await.as_ref() {
            if memo.fetched_at.elapsed() < VERSION_TTL {
                return Ok(memo.value.as_ref().clone());
            }
        }

        let version: VersionDto = self.fetch("/v1/version", "CatalogVersion").await?;
        debug!(version = %version.riot_client_version, "📚 Client version fetched");

        *self.version.write().await = Some(Memo {
            value: Arc::new(version.riot_client_version.clone()),
            fetched_at: Instant::now(),
        });

        Ok(version.riot_client_version)
    }

    pub async fn skin_index(&self) -> Result<Arc<SkinIndex>, AppError> {
        if let Some(memo) = self.skins.read().await.as_ref() {
            if memo.fetched_at.elapsed() < SKINS_TTL {
                return Ok(memo.value.clone());
            }
        }

        let index = Arc::new(self.load_skin_index().await?);

        *self.skins.write().await = Some(Memo {
            value: index.clone(),
            fetched_at: Instant::now(),
        });

        Ok(index)
    }

    #[instrument(skip(self))]
    async fn load_skin_index(&self) -> Result<SkinIndex, AppError> {
        let skins: Vec<SkinDto> = self
            .fetch("/v1/weapons/skins?language=en-US", "CatalogSkins")
            .await?;
        let tiers: Vec<ContentTierDto> = self
            .fetch("/v1/contenttiers?language=en-US", "CatalogContentTiers")
            .await?;

        let index = SkinIndex::from_catalog(skins, tiers);
        if index.is_empty() {
            warn!("📚 ⚠️ Skin catalog has no skin levels");
        } else {
            info!(levels = index.len(), "📚 Skin catalog loaded");
        }

        Ok(index)
    }

    /// Bundle metadata, `None` when the catalog does not know the bundle yet.
    pub async fn bundle(&self, uuid: &str) -> Result<Option<BundleInfo>, AppError> {
        let key = uuid.to_lowercase();
        if let Some(cached) = self.bundles.read().await.get(&key) {
            return Ok(Some(cached.clone()));
        }

        let path = format!("/v1/bundles/{}?language=en-US", urlencoding::encode(uuid));
        let info = match self.fetch::<BundleDto>(&path, "CatalogBundle").await {
            Ok(dto) => BundleInfo {
                uuid: dto.uuid,
                name: dto.display_name,
                image: dto.display_icon,
                promo_image: dto.vertical_promo_image,
            },
            // New bundles appear in the store before the catalog has them.
            Err(AppError::Catalog { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        self.bundles.write().await.insert(key, info.clone());
        Ok(Some(info))
    }

    async fn fetch<T>(&self, path: &str, schema_name: &str) -> Result<T, AppError>
    where
        T: DeserializeOwned + Validate,
    {
        let res = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let mut message = res.text().await.unwrap_or_default();
            truncate_utf8(&mut message, 200);
            return Err(AppError::Catalog {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = res.bytes().await?;
        let envelope: CatalogEnvelope<T> = parse_bytes_with_log(&bytes, schema_name)?;
        Ok(envelope.data)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogEnvelope<T> {
    data: T,
}

impl<T: Validate> Validate for CatalogEnvelope<T> {
    fn validate(&self, issues: &mut Vec<Issue>) {
        self.data.validate(issues);
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionDto {
    riot_client_version: String,
}

impl Validate for VersionDto {
    fn validate(&self, issues: &mut Vec<Issue>) {
        require_non_empty(issues, "$.data.riotClientVersion", &self.riot_client_version);
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkinDto {
    uuid: String,
    display_name: String,
    #[serde(default)]
    content_tier_uuid: Option<String>,
    #[serde(default)]
    display_icon: Option<String>,
    #[serde(default)]
    levels: Vec<SkinLevelDto>,
}

impl Validate for SkinDto {
    fn validate(&self, issues: &mut Vec<Issue>) {
        require_non_empty(issues, "$.data[].uuid", &self.uuid);
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SkinLevelDto {
    uuid: String,
    #[serde(default)]
    display_icon: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentTierDto {
    uuid: String,
    dev_name: String,
    #[serde(default)]
    highlight_color: Option<String>,
}

impl Validate for ContentTierDto {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BundleDto {
    uuid: String,
    display_name: String,
    #[serde(default)]
    display_icon: Option<String>,
    #[serde(default)]
    vertical_promo_image: Option<String>,
}

impl Validate for BundleDto {
    fn validate(&self, issues: &mut Vec<Issue>) {
        require_non_empty(issues, "$.data.uuid", &self.uuid);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    pub(crate) const PREMIUM_TIER: &str = "60bca009-4182-7998-dee7-b8a2558dc369";

    /// Catalog payload with a single Prime Vandal skin and its two levels.
    pub(crate) fn skins_body() -> serde_json::Value {
        json!({
            "status": 200,
            "data": [{
                "uuid": "skin-prime-vandal",
                "displayName": "Prime Vandal",
                "contentTierUuid": PREMIUM_TIER,
                "displayIcon": "https://media/prime-vandal.png",
                "levels": [
                    {"uuid": "LVL-PRIME-1", "displayIcon": "https://media/prime-vandal-1.png"},
                    {"uuid": "lvl-prime-2", "displayIcon": null}
                ]
            }]
        })
    }

    pub(crate) fn tiers_body() -> serde_json::Value {
        json!({
            "status": 200,
            "data": [{
                "uuid": PREMIUM_TIER,
                "devName": "Premium",
                "highlightColor": "d1548dff"
            }]
        })
    }

    pub(crate) async fn mock_catalog(server: &MockServer) {
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/weapons/skins");
                then.status(200).json_body(skins_body());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/contenttiers");
                then.status(200).json_body(tiers_body());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/version");
                then.status(200).json_body(
                    json!({"status": 200, "data": {"riotClientVersion": "release-09.00-shipping-1"}}),
                );
            })
            .await;
    }

    fn client_for(server: &MockServer) -> CatalogClient {
        let config = Config {
            catalog_url: server.base_url(),
            ..Config::default()
        };
        CatalogClient::new(&config).unwrap()
    }

    #[tokio::test]
    async fn skin_index_is_built_and_memoized() {
        let server = MockServer::start_async().await;
        let skins = server
            .mock_async(|when, then| {
                when.path("/v1/weapons/skins");
                then.status(200).json_body(skins_body());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/v1/contenttiers");
                then.status(200).json_body(tiers_body());
            })
            .await;

        let catalog = client_for(&server);
        let index = catalog.skin_index().await.unwrap();
        let _ = catalog.skin_index().await.unwrap();

        skins.assert_hits_async(1).await;
        assert_eq!(index.len(), 2);

        let first = index.lookup("lvl-prime-1").unwrap();
        assert_eq!(first.name, "Prime Vandal");
        assert_eq!(first.image.as_deref(), Some("https://media/prime-vandal-1.png"));
        assert_eq!(first.rarity.as_deref(), Some("Premium"));
        assert_eq!(first.rarity_color.as_deref(), Some("#d1548d"));

        let second = index.lookup("LVL-PRIME-2").unwrap();
        assert_eq!(second.image.as_deref(), Some("https://media/prime-vandal.png"));
    }

    #[tokio::test]
    async fn failed_load_is_not_memoized() {
        let server = MockServer::start_async().await;
        let mut failing = server
            .mock_async(|when, then| {
                when.path("/v1/weapons/skins");
                then.status(500);
            })
            .await;

        let catalog = client_for(&server);
        assert!(matches!(
            catalog.skin_index().await,
            Err(AppError::Catalog { status: 500, .. })
        ));

        failing.delete_async().await;
        mock_catalog(&server).await;

        assert_eq!(catalog.skin_index().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_bundle_is_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.path("/v1/bundles/new-bundle");
                then.status(404).json_body(json!({"status": 404, "error": "not found"}));
            })
            .await;

        let catalog = client_for(&server);
        assert_eq!(catalog.bundle("new-bundle").await.unwrap(), None);
    }

    #[tokio::test]
    async fn client_version_is_read_from_envelope() {
        let server = MockServer::start_async().await;
        mock_catalog(&server).await;

        let version = client_for(&server).client_version().await.unwrap();
        assert_eq!(version, "release-09.00-shipping-1");
    }
}
