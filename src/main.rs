use tokio::net::TcpListener;
use tracing::{error, info};

use valshop::config::Config;
use valshop::db::{self, Repository};
use valshop::error::AppError;
use valshop::http::{AppState, create_router};
use valshop::logging;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init();

    info!("🛒 Starting...");

    if let Err(e) = run().await {
        error!(error = %e, "🛒 ❌ Server stopped");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();

    let pool = db::connect(&config.database_url).await?;
    let state = AppState::new(config, Repository::new(pool))?;
    let app = create_router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "🛒 Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛒 Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "🛒 ❌ Failed to listen for shutdown signal");
    }
}
