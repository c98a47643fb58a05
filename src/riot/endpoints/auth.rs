use reqwest::StatusCode;
use reqwest::header::{COOKIE, HeaderMap, LOCATION, SET_COOKIE};
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::error::AppError;
use crate::riot::client::{RiotClient, upstream_error};
use crate::riot::region::Region;
use crate::riot::types::{EntitlementsTokenDto, GeoDto, UserInfoDto};

const CLIENT_ID: &str = "play-valorant-web-prod";
const REDIRECT_URI: &str = "https://playvalorant.com/opt_in";
const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 3600;
const MAX_TOKEN_LIFETIME_SECS: i64 = 24 * 3600;

/// Fresh credentials minted from an `ssid` cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthTokens {
    pub access_token: String,
    pub id_token: Option<String>,
    pub entitlements_token: String,
    /// Unix seconds.
    pub expires_at: i64,
    /// Set when Riot rotated the `ssid` cookie during re-auth.
    pub rotated_ssid: Option<String>,
}

/// Everything learned about an account while logging it in.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub puuid: String,
    pub game_name: String,
    pub tag_line: String,
    pub region: Region,
    pub ssid: String,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TokenGrant {
    access_token: String,
    id_token: Option<String>,
    expires_in: i64,
}

impl RiotClient {
    /// Mint new access and entitlements tokens from the re-auth cookie.
    ///
    /// Returns [`AppError::AuthRejected`] when Riot no longer accepts the
    /// cookie, which means the player has to log in again.
    #[instrument(skip_all)]
    pub async fn refresh_tokens(&self, ssid: &str) -> Result<AuthTokens, AppError> {
        let (grant, rotated_ssid) = self.reauth(ssid).await?;
        let entitlements_token = self.get_entitlements_token(&grant.access_token).await?;

        debug!(expires_in = grant.expires_in, "🔑 Tokens refreshed");

        Ok(AuthTokens {
            access_token: grant.access_token,
            id_token: grant.id_token,
            entitlements_token,
            expires_at: chrono::Utc::now()
                .timestamp()
                .saturating_add(grant.expires_in),
            rotated_ssid,
        })
    }

    /// Link an account from its `ssid` cookie. The region is looked up
    /// through the Riot geo service when the caller does not provide it.
    #[instrument(skip_all, fields(region = ?region))]
    pub async fn login_with_ssid(
        &self,
        ssid: &str,
        region: Option<Region>,
    ) -> Result<LoginOutcome, AppError> {
        let tokens = self.refresh_tokens(ssid).await?;
        let user = self.get_userinfo(&tokens.access_token).await?;

        let region = match (region, tokens.id_token.as_deref()) {
            (Some(region), _) => region,
            (None, Some(id_token)) => self.get_region(&tokens.access_token, id_token).await?,
            (None, None) => {
                return Err(AppError::InvalidRegion(
                    "region not provided and no id token to look it up".into(),
                ));
            }
        };

        let (game_name, tag_line) = user
            .acct
            .map(|acct| (acct.game_name, acct.tag_line))
            .unwrap_or_default();

        Ok(LoginOutcome {
            puuid: user.sub,
            game_name,
            tag_line,
            region,
            ssid: tokens.rotated_ssid.clone().unwrap_or_else(|| ssid.to_string()),
            tokens,
        })
    }

    async fn reauth(&self, ssid: &str) -> Result<(TokenGrant, Option<String>), AppError> {
        let request = self
            .http
            .get(format!("{}/authorize", self.auth_url))
            .query(&[
                ("redirect_uri", REDIRECT_URI),
                ("client_id", CLIENT_ID),
                ("response_type", "token id_token"),
                ("nonce", "1"),
                ("scope", "account openid"),
            ])
            .header(COOKIE, format!("ssid={ssid}"));

        let res = self.send(request).await?;
        let status = res.status();

        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            warn!(status = status.as_u16(), "🔑 ⚠️ Re-auth cookie refused");
            return Err(AppError::AuthRejected);
        }

        // Rate limits and outages say nothing about the cookie itself.
        if !status.is_redirection() {
            return Err(upstream_error(res).await);
        }

        let rotated_ssid = rotated_ssid(res.headers());
        let grant = res
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_token_fragment)
            .ok_or(AppError::AuthRejected)?;

        Ok((grant, rotated_ssid))
    }

    pub async fn get_entitlements_token(&self, access_token: &str) -> Result<String, AppError> {
        let request = self
            .http
            .post(format!("{}/api/token/v1", self.entitlements_url))
            .bearer_auth(access_token)
            .json(&json!({}));

        let dto: EntitlementsTokenDto = self.send_json(request, "EntitlementsToken").await?;
        Ok(dto.entitlements_token)
    }

    pub async fn get_userinfo(&self, access_token: &str) -> Result<UserInfoDto, AppError> {
        let request = self
            .http
            .get(format!("{}/userinfo", self.auth_url))
            .bearer_auth(access_token);

        self.send_json(request, "UserInfo").await
    }

    pub async fn get_region(&self, access_token: &str, id_token: &str) -> Result<Region, AppError> {
        let request = self
            .http
            .put(format!("{}/pas/v1/product/valorant", self.geo_url))
            .bearer_auth(access_token)
            .json(&json!({ "id_token": id_token }));

        let dto: GeoDto = self.send_json(request, "Geo").await?;
        dto.affinities.live.parse()
    }
}

/// Extract the tokens Riot puts in the redirect's URL fragment.
fn parse_token_fragment(location: &str) -> Option<TokenGrant> {
    let (_, fragment) = location.split_once('#')?;

    let mut access_token = None;
    let mut id_token = None;
    let mut expires_in = DEFAULT_TOKEN_LIFETIME_SECS;

    for pair in fragment.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = urlencoding::decode(value).ok()?.into_owned();
        match key {
            "access_token" if !value.is_empty() => access_token = Some(value),
            "id_token" if !value.is_empty() => id_token = Some(value),
            "expires_in" => expires_in = token_lifetime(&value),
            _ => {}
        }
    }

    Some(TokenGrant {
        access_token: access_token?,
        id_token,
        expires_in,
    })
}

/// Riot's `expires_in`, falling back to the default lifetime when it is
/// missing, unparsable or not positive.
fn token_lifetime(value: &str) -> i64 {
    value
        .parse::<i64>()
        .ok()
        .filter(|secs| *secs > 0)
        .map_or(DEFAULT_TOKEN_LIFETIME_SECS, |secs| {
            secs.min(MAX_TOKEN_LIFETIME_SECS)
        })
}

fn rotated_ssid(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.strip_prefix("ssid="))
        .map(|rest| rest.split(';').next().unwrap_or_default().to_string())
        .find(|value| !value.is_empty())
}
