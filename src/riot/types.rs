use std::collections::HashMap;

use serde::Deserialize;

use crate::validation::{Issue, Validate, require_non_empty, require_non_negative};

pub const VALORANT_POINTS: &str = "85ad13f7-3d1b-5128-9eb2-7cd8ee0b5741";
pub const RADIANITE_POINTS: &str = "e59aa87c-4cbf-517a-5983-6e81511be9b7";
pub const KINGDOM_CREDITS: &str = "85ca954a-41f2-ce94-9b45-8ca3dd39a00d";

/// Entitlement item type of weapon skin levels.
pub const SKIN_LEVEL_ITEM_TYPE: &str = "e7c63390-eda7-46e0-bb7a-a6abdacd2433";

fn validate_costs(issues: &mut Vec<Issue>, path: &str, costs: &HashMap<String, i64>) {
    for (currency, amount) in costs {
        require_non_negative(issues, &format!("{path}.{currency}"), *amount);
    }
}

// ============================================================================
// Auth
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct EntitlementsTokenDto {
    pub entitlements_token: String,
}

impl Validate for EntitlementsTokenDto {
    fn validate(&self, issues: &mut Vec<Issue>) {
        require_non_empty(issues, "$.entitlements_token", &self.entitlements_token);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoDto {
    /// The player's puuid.
    pub sub: String,
    #[serde(default)]
    pub acct: Option<AcctDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcctDto {
    #[serde(default)]
    pub game_name: String,
    #[serde(default)]
    pub tag_line: String,
}

impl Validate for UserInfoDto {
    fn validate(&self, issues: &mut Vec<Issue>) {
        require_non_empty(issues, "$.sub", &self.sub);
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeoDto {
    pub affinities: AffinitiesDto,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AffinitiesDto {
    pub live: String,
}

impl Validate for GeoDto {
    fn validate(&self, issues: &mut Vec<Issue>) {
        require_non_empty(issues, "$.affinities.live", &self.affinities.live);
    }
}

// ============================================================================
// Storefront
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StorefrontDto {
    pub featured_bundle: FeaturedBundleDto,
    pub skins_panel_layout: SkinsPanelLayoutDto,
    #[serde(default)]
    pub bonus_store: Option<BonusStoreDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FeaturedBundleDto {
    #[serde(default)]
    pub bundles: Vec<BundleDto>,
    #[serde(default)]
    pub bundle_remaining_duration_in_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BundleDto {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "DataAssetID")]
    pub data_asset_id: String,
    #[serde(rename = "CurrencyID")]
    pub currency_id: String,
    pub items: Vec<BundleItemDto>,
    #[serde(default)]
    pub total_base_cost: Option<HashMap<String, i64>>,
    #[serde(default)]
    pub total_discounted_cost: Option<HashMap<String, i64>>,
    #[serde(default)]
    pub total_discount_percent: f64,
    pub duration_remaining_in_seconds: i64,
    #[serde(default)]
    pub wholesale_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BundleItemDto {
    pub item: BundleRewardDto,
    pub base_price: i64,
    #[serde(rename = "CurrencyID")]
    pub currency_id: String,
    #[serde(default)]
    pub discount_percent: f64,
    pub discounted_price: i64,
    #[serde(default)]
    pub is_promo_item: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BundleRewardDto {
    #[serde(rename = "ItemTypeID")]
    pub item_type_id: String,
    #[serde(rename = "ItemID")]
    pub item_id: String,
    #[serde(default = "one")]
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SkinsPanelLayoutDto {
    #[serde(default)]
    pub single_item_offers: Vec<String>,
    #[serde(default)]
    pub single_item_store_offers: Vec<OfferDto>,
    pub single_item_offers_remaining_duration_in_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OfferDto {
    #[serde(rename = "OfferID")]
    pub offer_id: String,
    #[serde(default)]
    pub cost: HashMap<String, i64>,
    #[serde(default)]
    pub rewards: Vec<RewardDto>,
}

impl OfferDto {
    pub fn vp_cost(&self) -> Option<i64> {
        self.cost.get(VALORANT_POINTS).copied()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RewardDto {
    #[serde(rename = "ItemTypeID")]
    pub item_type_id: String,
    #[serde(rename = "ItemID")]
    pub item_id: String,
    #[serde(default = "one")]
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BonusStoreDto {
    #[serde(default)]
    pub bonus_store_offers: Vec<BonusOfferDto>,
    #[serde(default)]
    pub bonus_store_remaining_duration_in_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BonusOfferDto {
    #[serde(rename = "BonusOfferID")]
    pub bonus_offer_id: String,
    pub offer: OfferDto,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub discount_costs: HashMap<String, i64>,
    #[serde(default)]
    pub is_seen: bool,
}

fn one() -> i64 {
    1
}

impl Validate for StorefrontDto {
    fn validate(&self, issues: &mut Vec<Issue>) {
        require_non_negative(
            issues,
            "$.FeaturedBundle.BundleRemainingDurationInSeconds",
            self.featured_bundle.bundle_remaining_duration_in_seconds,
        );

        for (i, bundle) in self.featured_bundle.bundles.iter().enumerate() {
            let path = format!("$.FeaturedBundle.Bundles[{i}]");
            require_non_empty(issues, &format!("{path}.DataAssetID"), &bundle.data_asset_id);
            require_non_negative(
                issues,
                &format!("{path}.DurationRemainingInSeconds"),
                bundle.duration_remaining_in_seconds,
            );
            for (j, item) in bundle.items.iter().enumerate() {
                let item_path = format!("{path}.Items[{j}]");
                require_non_empty(issues, &format!("{item_path}.Item.ItemID"), &item.item.item_id);
                require_non_negative(issues, &format!("{item_path}.BasePrice"), item.base_price);
                require_non_negative(
                    issues,
                    &format!("{item_path}.DiscountedPrice"),
                    item.discounted_price,
                );
            }
        }

        let layout = &self.skins_panel_layout;
        require_non_negative(
            issues,
            "$.SkinsPanelLayout.SingleItemOffersRemainingDurationInSeconds",
            layout.single_item_offers_remaining_duration_in_seconds,
        );
        for (i, id) in layout.single_item_offers.iter().enumerate() {
            require_non_empty(issues, &format!("$.SkinsPanelLayout.SingleItemOffers[{i}]"), id);
        }
        for (i, offer) in layout.single_item_store_offers.iter().enumerate() {
            validate_costs(
                issues,
                &format!("$.SkinsPanelLayout.SingleItemStoreOffers[{i}].Cost"),
                &offer.cost,
            );
        }

        if let Some(bonus) = &self.bonus_store {
            for (i, offer) in bonus.bonus_store_offers.iter().enumerate() {
                validate_costs(
                    issues,
                    &format!("$.BonusStore.BonusStoreOffers[{i}].DiscountCosts"),
                    &offer.discount_costs,
                );
            }
        }
    }
}

// ============================================================================
// Wallet
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WalletDto {
    #[serde(default)]
    pub balances: HashMap<String, i64>,
}

impl WalletDto {
    pub fn balance(&self, currency: &str) -> i64 {
        self.balances.get(currency).copied().unwrap_or(0)
    }
}

impl Validate for WalletDto {
    fn validate(&self, issues: &mut Vec<Issue>) {
        validate_costs(issues, "$.Balances", &self.balances);
    }
}

// ============================================================================
// Entitlements
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntitlementsDto {
    #[serde(rename = "ItemTypeID")]
    pub item_type_id: String,
    #[serde(default)]
    pub entitlements: Vec<EntitlementDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntitlementDto {
    #[serde(rename = "TypeID", default)]
    pub type_id: String,
    #[serde(rename = "ItemID")]
    pub item_id: String,
}

impl Validate for EntitlementsDto {
    fn validate(&self, issues: &mut Vec<Issue>) {
        if self.item_type_id != SKIN_LEVEL_ITEM_TYPE {
            issues.push(Issue::new(
                "$.ItemTypeID",
                format!("expected skin levels, got {}", self.item_type_id),
            ));
        }
        for (i, entitlement) in self.entitlements.iter().enumerate() {
            require_non_empty(issues, &format!("$.Entitlements[{i}].ItemID"), &entitlement.item_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::validation::parse_with_log;

    #[test]
    fn storefront_parses_real_shape() {
        let payload = json!({
            "FeaturedBundle": {
                "Bundles": [{
                    "ID": "b1",
                    "DataAssetID": "bundle-asset",
                    "CurrencyID": VALORANT_POINTS,
                    "Items": [{
                        "Item": {"ItemTypeID": SKIN_LEVEL_ITEM_TYPE, "ItemID": "lvl-1", "Amount": 1},
                        "BasePrice": 1775,
                        "CurrencyID": VALORANT_POINTS,
                        "DiscountPercent": 0.33,
                        "DiscountedPrice": 1189,
                        "IsPromoItem": false
                    }],
                    "DurationRemainingInSeconds": 3600,
                    "WholesaleOnly": false
                }],
                "BundleRemainingDurationInSeconds": 3600
            },
            "SkinsPanelLayout": {
                "SingleItemOffers": ["lvl-1"],
                "SingleItemStoreOffers": [{
                    "OfferID": "lvl-1",
                    "Cost": {VALORANT_POINTS: 1775},
                    "Rewards": [{"ItemTypeID": SKIN_LEVEL_ITEM_TYPE, "ItemID": "lvl-1", "Quantity": 1}]
                }],
                "SingleItemOffersRemainingDurationInSeconds": 7200
            }
        });

        let storefront: StorefrontDto = parse_with_log(&payload, "Storefront").unwrap();

        assert_eq!(storefront.featured_bundle.bundles.len(), 1);
        assert_eq!(
            storefront.skins_panel_layout.single_item_store_offers[0].vp_cost(),
            Some(1775)
        );
        assert!(storefront.bonus_store.is_none());
    }

    #[test]
    fn negative_wallet_balance_is_flagged() {
        let err = parse_with_log::<WalletDto>(
            &json!({"Balances": {VALORANT_POINTS: -1}}),
            "Wallet",
        )
        .unwrap_err();

        assert_eq!(err.issues[0].path, format!("$.Balances.{VALORANT_POINTS}"));
    }

    #[test]
    fn entitlements_of_another_type_are_rejected() {
        let err = parse_with_log::<EntitlementsDto>(
            &json!({"ItemTypeID": "not-skins", "Entitlements": []}),
            "Entitlements",
        )
        .unwrap_err();

        assert_eq!(err.issues[0].path, "$.ItemTypeID");
    }
}
