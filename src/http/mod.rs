//! HTTP surface: JSON API under `/api`, optional static pages, and the auth
//! gate in front of both.

pub mod cookies;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;


use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

pub use error::ApiError;
pub use state::AppState;

/// Request bodies are tiny JSON documents.
const BODY_LIMIT: usize = 64 * 1024;

pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    let api = Router::new()
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/logout", post(routes::auth::logout))
        .route("/accounts", get(routes::accounts::list))
        .route("/accounts/switch", post(routes::accounts::switch))
        .route("/inventory", get(routes::inventory::get_inventory))
        .route("/store", get(routes::store::get_store))
        .route("/store/history", get(routes::store::get_history))
        .route("/wallet", get(routes::store::get_wallet))
        .route("/stats", get(routes::stats::get_stats))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT));

    let mut router = Router::new()
        .route("/health", get(routes::health))
        .nest("/api", api)
        .with_state(state);

    if let Some(dir) = static_dir {
        router = router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true));
    }

    router
        .layer(axum::middleware::from_fn(middleware::auth_gate))
        .layer(TraceLayer::new_for_http())
}
