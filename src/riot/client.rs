use std::{fmt, sync::Arc};

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{RequestBuilder, Response, redirect};
use serde::de::DeserializeOwned;

use super::region::Shard;
use crate::config::Config;
use crate::error::AppError;
use crate::session::Session;
use crate::validation::{Validate, parse_bytes_with_log};

/// Base64 JSON describing a Windows PC client, required by the PD endpoints.
const CLIENT_PLATFORM: &str = "ew0KCSJwbGF0Zm9ybVR5cGUiOiAiUEMiLA0KCSJwbGF0Zm9ybU9TIjogIldpbmRvd3MiLA0KCSJwbGF0Zm9ybU9TVmVyc2lvbiI6ICIxMC4wLjE5MDQyLjEuMjU2LjY0Yml0IiwNCgkicGxhdGZvcm1DaGlwc2V0IjogIlVua25vd24iDQp9";

/// Upstream error bodies are kept in errors but never in full.
const MAX_ERROR_BODY: usize = 200;

#[derive(Clone)]
pub struct RiotClient {
    pub(super) http: reqwest::Client,
    limiter: Arc<DefaultDirectRateLimiter>,
    pub(super) auth_url: String,
    pub(super) entitlements_url: String,
    pub(super) geo_url: String,
    pd_url: Option<String>,
}

impl fmt::Debug for RiotClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RiotClient")
            .field("auth_url", &self.auth_url)
            .field("entitlements_url", &self.entitlements_url)
            .field("geo_url", &self.geo_url)
            .field("pd_url", &self.pd_url)
            .finish()
    }
}

impl RiotClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        // Re-auth answers with a redirect whose Location carries the tokens.
        let http = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            http,
            limiter: Arc::new(RateLimiter::direct(Quota::per_second(
                config.riot_rate_limit_per_second,
            ))),
            auth_url: trim_base(&config.riot_auth_url),
            entitlements_url: trim_base(&config.riot_entitlements_url),
            geo_url: trim_base(&config.riot_geo_url),
            pd_url: config.riot_pd_url.as_deref().map(trim_base),
        })
    }

    pub fn pd_base(&self, shard: Shard) -> String {
        self.pd_url.clone().unwrap_or_else(|| shard.pd_url())
    }

    /// Waits for the shared rate limiter then sends the request.
    pub(super) async fn send(&self, request: RequestBuilder) -> Result<Response, AppError> {
        self.limiter.until_ready().await;
        Ok(request.send().await?)
    }

    /// Sends the request and validates a successful JSON body as `T`.
    pub(super) async fn send_json<T>(
        &self,
        request: RequestBuilder,
        schema_name: &str,
    ) -> Result<T, AppError>
    where
        T: DeserializeOwned + Validate,
    {
        let res = self.send(request).await?;
        let res = ensure_success(res).await?;
        let bytes = res.bytes().await?;

        Ok(parse_bytes_with_log(&bytes, schema_name)?)
    }

    /// Request builder for a PD store endpoint of the session's shard.
    pub(super) fn pd_request(
        &self,
        method: reqwest::Method,
        session: &Session,
        path: &str,
        client_version: &str,
    ) -> RequestBuilder {
        let url = format!("{}{}", self.pd_base(session.region.to_shard()), path);

        self.http
            .request(method, url)
            .bearer_auth(&session.access_token)
            .header("X-Riot-Entitlements-JWT", &session.entitlements_token)
            .header("X-Riot-ClientPlatform", CLIENT_PLATFORM)
            .header("X-Riot-ClientVersion", client_version)
    }
}

pub(super) async fn ensure_success(res: Response) -> Result<Response, AppError> {
    if res.status().is_success() {
        Ok(res)
    } else {
        Err(upstream_error(res).await)
    }
}

pub(super) async fn upstream_error(res: Response) -> AppError {
    let status = res.status().as_u16();
    let mut message = res.text().await.unwrap_or_default();
    truncate_utf8(&mut message, MAX_ERROR_BODY);

    AppError::RiotApi { status, message }
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

pub(crate) fn truncate_utf8(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}
