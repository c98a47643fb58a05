//! Daily store, featured bundles, night market and wallet, resolved into
//! display-ready records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::catalog::{CatalogClient, SkinIndex, SkinRecord};
use crate::db::Repository;
use crate::error::AppError;
use crate::riot::RiotClient;
use crate::riot::types::{
    BonusStoreDto, BundleDto, KINGDOM_CREDITS, OfferDto, RADIANITE_POINTS, SKIN_LEVEL_ITEM_TYPE,
    StorefrontDto, VALORANT_POINTS, WalletDto,
};
use crate::session::Session;

pub const DEFAULT_HISTORY_LIMIT: u32 = 30;
pub const MAX_HISTORY_LIMIT: u32 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOffer {
    pub offer_id: String,
    pub skin: SkinRecord,
    /// Price in Valorant Points.
    pub cost: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleItemView {
    pub item_id: String,
    pub item_type_id: String,
    pub skin: Option<SkinRecord>,
    pub amount: i64,
    pub base_price: i64,
    pub discounted_price: i64,
    pub discount_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleView {
    pub uuid: String,
    pub name: Option<String>,
    pub image: Option<String>,
    /// Tall artwork used by the store page header.
    pub promo_image: Option<String>,
    pub total_base_cost: Option<i64>,
    pub total_discounted_cost: Option<i64>,
    pub remaining_seconds: i64,
    pub items: Vec<BundleItemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NightMarketOffer {
    pub offer_id: String,
    pub skin: SkinRecord,
    pub base_cost: Option<i64>,
    pub discounted_cost: Option<i64>,
    pub discount_percent: f64,
    pub is_seen: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NightMarketView {
    pub offers: Vec<NightMarketOffer>,
    pub remaining_seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreView {
    pub puuid: String,
    pub daily_offers: Vec<StoreOffer>,
    pub daily_remaining_seconds: i64,
    pub bundles: Vec<BundleView>,
    pub night_market: Option<NightMarketView>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub valorant_points: i64,
    pub radianite: i64,
    pub kingdom_credits: i64,
}

impl From<&WalletDto> for Wallet {
    fn from(dto: &WalletDto) -> Self {
        Self {
            valorant_points: dto.balance(VALORANT_POINTS),
            radianite: dto.balance(RADIANITE_POINTS),
            kingdom_credits: dto.balance(KINGDOM_CREDITS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHistoryEntry {
    pub date: String,
    pub offers: Vec<StoreOffer>,
    pub recorded_at: i64,
}

/// Fetches and hydrates the storefront, then records the daily offers in
/// the store history.
#[instrument(skip_all, fields(puuid = %session.puuid))]
pub async fn load_store(
    repo: &Repository,
    riot: &RiotClient,
    catalog: &CatalogClient,
    session: &Session,
) -> Result<StoreView, AppError> {
    let version = catalog.client_version().await?;
    let storefront = riot.get_storefront(session, &version).await?;
    let index = catalog.skin_index().await?;

    let mut bundles = Vec::with_capacity(storefront.featured_bundle.bundles.len());
    for bundle in &storefront.featured_bundle.bundles {
        bundles.push(hydrate_bundle(catalog, &index, bundle).await);
    }

    let view = StoreView {
        puuid: session.puuid.clone(),
        daily_offers: daily_offers(&storefront, &index),
        daily_remaining_seconds: storefront
            .skins_panel_layout
            .single_item_offers_remaining_duration_in_seconds,
        bundles,
        night_market: storefront
            .bonus_store
            .as_ref()
            .map(|bonus| night_market(bonus, &index)),
    };

    if let Err(e) = record_store_history(repo, &session.puuid, &view.daily_offers).await {
        warn!(error = %e, "🛒 ⚠️ Failed to record store history");
    }

    debug!(
        offers = view.daily_offers.len(),
        bundles = view.bundles.len(),
        night_market = view.night_market.is_some(),
        "🛒 Store loaded"
    );

    Ok(view)
}

#[instrument(skip_all, fields(puuid = %session.puuid))]
pub async fn load_wallet(
    riot: &RiotClient,
    catalog: &CatalogClient,
    session: &Session,
) -> Result<Wallet, AppError> {
    let version = catalog.client_version().await?;
    let wallet = riot.get_wallet(session, &version).await?;
    Ok(Wallet::from(&wallet))
}

/// Daily skin offers with their VP price. Offers whose skin the catalog does
/// not know are dropped.
pub fn daily_offers(storefront: &StorefrontDto, index: &SkinIndex) -> Vec<StoreOffer> {
    let layout = &storefront.skins_panel_layout;

    if layout.single_item_store_offers.is_empty() {
        // Older payloads only list the skin level ids.
        return layout
            .single_item_offers
            .iter()
            .filter_map(|id| {
                index.lookup(id).map(|skin| StoreOffer {
                    offer_id: id.clone(),
                    skin: skin.clone(),
                    cost: None,
                })
            })
            .collect();
    }

    layout
        .single_item_store_offers
        .iter()
        .filter_map(|offer| {
            let skin = offer_skin(offer, index)?;
            Some(StoreOffer {
                offer_id: offer.offer_id.clone(),
                skin,
                cost: offer.vp_cost(),
            })
        })
        .collect()
}

fn offer_skin(offer: &OfferDto, index: &SkinIndex) -> Option<SkinRecord> {
    let item_id = offer
        .rewards
        .iter()
        .find(|reward| reward.item_type_id.eq_ignore_ascii_case(SKIN_LEVEL_ITEM_TYPE))
        .map(|reward| reward.item_id.as_str())
        .unwrap_or(&offer.offer_id);

    let skin = index.lookup(item_id).cloned();
    if skin.is_none() {
        debug!(item_id, "🛒 Unknown skin level in offer skipped");
    }
    skin
}

fn night_market(bonus: &BonusStoreDto, index: &SkinIndex) -> NightMarketView {
    let offers = bonus
        .bonus_store_offers
        .iter()
        .filter_map(|bonus_offer| {
            let skin = offer_skin(&bonus_offer.offer, index)?;
            Some(NightMarketOffer {
                offer_id: bonus_offer.bonus_offer_id.clone(),
                skin,
                base_cost: bonus_offer.offer.vp_cost(),
                discounted_cost: bonus_offer.discount_costs.get(VALORANT_POINTS).copied(),
                discount_percent: bonus_offer.discount_percent,
                is_seen: bonus_offer.is_seen,
            })
        })
        .collect();

    NightMarketView {
        offers,
        remaining_seconds: bonus.bonus_store_remaining_duration_in_seconds,
    }
}

/// Bundle with catalog metadata. A catalog failure only leaves the name and
/// image empty.
async fn hydrate_bundle(
    catalog: &CatalogClient,
    index: &SkinIndex,
    bundle: &BundleDto,
) -> BundleView {
    let info = match catalog.bundle(&bundle.data_asset_id).await {
        Ok(info) => info,
        Err(e) => {
            warn!(bundle = %bundle.data_asset_id, error = %e, "🛒 ⚠️ Bundle metadata unavailable");
            None
        }
    };

    let items = bundle
        .items
        .iter()
        .map(|item| BundleItemView {
            item_id: item.item.item_id.clone(),
            item_type_id: item.item.item_type_id.clone(),
            skin: index.lookup(&item.item.item_id).cloned(),
            amount: item.item.amount,
            base_price: item.base_price,
            discounted_price: item.discounted_price,
            discount_percent: item.discount_percent,
        })
        .collect();

    let cost = |costs: &Option<HashMap<String, i64>>| {
        costs.as_ref().and_then(|c| c.get(VALORANT_POINTS).copied())
    };

    BundleView {
        uuid: bundle.data_asset_id.clone(),
        name: info.as_ref().map(|i| i.name.clone()),
        image: info.as_ref().and_then(|i| i.image.clone()),
        promo_image: info.and_then(|i| i.promo_image),
        total_base_cost: cost(&bundle.total_base_cost),
        total_discounted_cost: cost(&bundle.total_discounted_cost),
        remaining_seconds: bundle.duration_remaining_in_seconds,
        items,
    }
}

/// Upserts today's (UTC) daily offers.
pub async fn record_store_history(
    repo: &Repository,
    puuid: &str,
    offers: &[StoreOffer],
) -> Result<(), AppError> {
    let now = chrono::Utc::now();
    let date = now.format("%Y-%m-%d").to_string();
    let payload = serde_json::to_string(offers)?;

    repo.upsert_store_history(puuid, &date, &payload, now.timestamp())
        .await
}

/// Past daily stores, newest first. Rows that no longer deserialize are
/// skipped.
pub async fn store_history(
    repo: &Repository,
    puuid: &str,
    limit: Option<u32>,
) -> Result<Vec<StoreHistoryEntry>, AppError> {
    let limit = limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let rows = repo.get_store_history(puuid, limit).await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| match serde_json::from_str(&row.offers) {
            Ok(offers) => Some(StoreHistoryEntry {
                date: row.date,
                offers,
                recorded_at: row.recorded_at,
            }),
            Err(e) => {
                warn!(date = %row.date, error = %e, "🛒 ⚠️ Unreadable store history entry");
                None
            }
        })
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::catalog::tests::mock_catalog;
    use crate::riot::Region;
    use crate::testing::{config_for, test_repo};
    use crate::validation::parse_with_log;

    fn session() -> Session {
        Session {
            puuid: "p1".into(),
            region: Region::Eu,
            access_token: "access".into(),
            entitlements_token: "ent".into(),
            expires_at: i64::MAX,
        }
    }

    fn offer(level: &str, cost: i64) -> serde_json::Value {
        json!({
            "OfferID": level,
            "Cost": {VALORANT_POINTS: cost},
            "Rewards": [{"ItemTypeID": SKIN_LEVEL_ITEM_TYPE, "ItemID": level, "Quantity": 1}]
        })
    }

    pub(crate) fn storefront_body() -> serde_json::Value {
        json!({
            "FeaturedBundle": {
                "Bundles": [{
                    "ID": "b1",
                    "DataAssetID": "bundle-prime",
                    "CurrencyID": VALORANT_POINTS,
                    "Items": [{
                        "Item": {"ItemTypeID": SKIN_LEVEL_ITEM_TYPE, "ItemID": "lvl-prime-1", "Amount": 1},
                        "BasePrice": 1775,
                        "CurrencyID": VALORANT_POINTS,
                        "DiscountPercent": 0.33,
                        "DiscountedPrice": 1189,
                        "IsPromoItem": false
                    }],
                    "TotalBaseCost": {VALORANT_POINTS: 7100},
                    "TotalDiscountedCost": {VALORANT_POINTS: 5325},
                    "DurationRemainingInSeconds": 86400
                }],
                "BundleRemainingDurationInSeconds": 86400
            },
            "SkinsPanelLayout": {
                "SingleItemOffers": ["lvl-prime-1", "lvl-unknown"],
                "SingleItemStoreOffers": [offer("lvl-prime-1", 1775), offer("lvl-unknown", 875)],
                "SingleItemOffersRemainingDurationInSeconds": 3600
            },
            "BonusStore": {
                "BonusStoreOffers": [{
                    "BonusOfferID": "bonus-1",
                    "Offer": offer("LVL-PRIME-1", 1775),
                    "DiscountPercent": 42,
                    "DiscountCosts": {VALORANT_POINTS: 1029},
                    "IsSeen": true
                }],
                "BonusStoreRemainingDurationInSeconds": 500
            }
        })
    }

    #[test]
    fn daily_offers_drop_unknown_skins() {
        let storefront: StorefrontDto = parse_with_log(&storefront_body(), "Storefront").unwrap();
        let index = SkinIndex::from_records([SkinRecord {
            uuid: "skin-prime-vandal".into(),
            level_uuid: "lvl-prime-1".into(),
            name: "Prime Vandal".into(),
            image: None,
            rarity: Some("Premium".into()),
            rarity_color: None,
        }]);

        let offers = daily_offers(&storefront, &index);

        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].skin.name, "Prime Vandal");
        assert_eq!(offers[0].cost, Some(1775));
    }

    #[test]
    fn wallet_projects_known_currencies() {
        let dto: WalletDto = parse_with_log(
            &json!({"Balances": {VALORANT_POINTS: 1200, RADIANITE_POINTS: 40}}),
            "Wallet",
        )
        .unwrap();

        assert_eq!(
            Wallet::from(&dto),
            Wallet {
                valorant_points: 1200,
                radianite: 40,
                kingdom_credits: 0
            }
        );
    }

    #[tokio::test]
    async fn store_is_hydrated_and_recorded() {
        let server = MockServer::start_async().await;
        mock_catalog(&server).await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/bundles/bundle-prime");
                then.status(200).json_body(json!({
                    "status": 200,
                    "data": {
                        "uuid": "bundle-prime",
                        "displayName": "Prime",
                        "displayIcon": "https://media/prime.png",
                        "verticalPromoImage": "https://media/prime-tall.png"
                    }
                }));
            })
            .await;
        let storefront = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/store/v3/storefront/p1")
                    .header("x-riot-clientversion", "release-09.00-shipping-1");
                then.status(200).json_body(storefront_body());
            })
            .await;
        let config = config_for(&server);
        let riot = RiotClient::new(&config).unwrap();
        let catalog = CatalogClient::new(&config).unwrap();
        let repo = test_repo().await;

        let view = load_store(&repo, &riot, &catalog, &session()).await.unwrap();

        storefront.assert_async().await;
        assert_eq!(view.daily_offers.len(), 1);
        assert_eq!(view.daily_remaining_seconds, 3600);

        let bundle = &view.bundles[0];
        assert_eq!(bundle.name.as_deref(), Some("Prime"));
        assert_eq!(bundle.promo_image.as_deref(), Some("https://media/prime-tall.png"));
        assert_eq!(bundle.total_discounted_cost, Some(5325));
        assert_eq!(bundle.items[0].skin.as_ref().unwrap().name, "Prime Vandal");

        let night_market = view.night_market.unwrap();
        assert_eq!(night_market.offers[0].discounted_cost, Some(1029));
        assert!(night_market.offers[0].is_seen);

        let history = store_history(&repo, "p1", None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].offers, view.daily_offers);
    }

    #[tokio::test]
    async fn unknown_bundle_keeps_prices_without_metadata() {
        let server = MockServer::start_async().await;
        mock_catalog(&server).await;
        server
            .mock_async(|when, then| {
                when.path("/v1/bundles/bundle-prime");
                then.status(404);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path("/store/v3/storefront/p1");
                then.status(200).json_body(storefront_body());
            })
            .await;
        let config = config_for(&server);
        let riot = RiotClient::new(&config).unwrap();
        let catalog = CatalogClient::new(&config).unwrap();

        let view = load_store(&test_repo().await, &riot, &catalog, &session())
            .await
            .unwrap();

        assert!(view.bundles[0].name.is_none());
        assert!(view.bundles[0].promo_image.is_none());
        assert_eq!(view.bundles[0].total_base_cost, Some(7100));
    }

    #[tokio::test]
    async fn history_limit_is_clamped() {
        let repo = test_repo().await;
        for day in 1..=3 {
            repo.upsert_store_history("p1", &format!("2026-02-0{day}"), "[]", 0)
                .await
                .unwrap();
        }
        repo.upsert_store_history("p1", "2026-02-04", "not json", 0)
            .await
            .unwrap();

        // A limit of 0 becomes 1, which only reaches the unreadable row.
        assert_eq!(store_history(&repo, "p1", Some(0)).await.unwrap().len(), 0);
        let all = store_history(&repo, "p1", Some(10_000)).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].date, "2026-02-03");
    }
}
