use thiserror::Error;

use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Riot API error: {status} - {message}")]
    RiotApi { status: u16, message: String },

    #[error("Catalog error: {status} - {message}")]
    Catalog { status: u16, message: String },

    #[error("Stats service error: {status} - {message}")]
    Henrik { status: u16, message: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Riot refused the re-auth cookie; the account must log in again.
    #[error("Riot rejected the stored credentials")]
    AuthRejected,

    #[error("Riot issued tokens that expire too soon (at {expires_at})")]
    ShortLivedTokens { expires_at: i64 },

    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cached payload is unreadable: {0}")]
    CorruptCache(#[from] serde_json::Error),
}

impl AppError {
    /// Whether the failure came from a remote service rather than from us.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::RiotApi { .. }
                | AppError::Catalog { .. }
                | AppError::Henrik { .. }
                | AppError::Http(_)
                | AppError::Validation(_)
                | AppError::AuthRejected
                | AppError::ShortLivedTokens { .. }
        )
    }
}
