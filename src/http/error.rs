use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::AppError;

pub const BAD_REQUEST: &str = "BAD_REQUEST";
pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
pub const INVALID_CREDENTIALS: &str = "INVALID_CREDENTIALS";
pub const ACCOUNT_NOT_FOUND: &str = "ACCOUNT_NOT_FOUND";
pub const RIOT_API_ERROR: &str = "RIOT_API_ERROR";
pub const UNKNOWN: &str = "UNKNOWN";

/// Error returned by route handlers, rendered as `{error, code}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED, "Not authenticated")
    }

    pub fn invalid_credentials() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            INVALID_CREDENTIALS,
            "Riot rejected the provided cookie",
        )
    }

    pub fn account_not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            ACCOUNT_NOT_FOUND,
            "Account not found or its session expired",
        )
    }

    pub fn riot_api(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, RIOT_API_ERROR, message)
    }

    pub fn unknown() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            UNKNOWN,
            "An unexpected error occurred",
        )
    }
}

impl From<AppError> for ApiError {
    fn from(e: AppError) -> Self {
        if e.is_upstream() {
            warn!(error = %e, "🌐 ⚠️ Upstream request failed");
            ApiError::riot_api("Failed to fetch data from Riot")
        } else {
            error!(error = %e, "🌐 ❌ Request failed");
            ApiError::unknown()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "code": self.code,
        }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_failures_map_to_riot_api_error() {
        let err: ApiError = AppError::RiotApi {
            status: 502,
            message: String::new(),
        }
        .into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, RIOT_API_ERROR);

        let err: ApiError = AppError::Config("x".into()).into();
        assert_eq!(err.code, UNKNOWN);
    }
}
