use anyhow::Result;
use tracing::info;

use signage_api::{app, config, middleware, services};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load and validate configuration
    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics()?;

    info!("Starting Signage API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&(&config.database).into()).await?;
    persistence::db::run_migrations(&pool).await?;

    let blobs = services::build_blob_store(&config.blob)?;
    info!(provider = %config.blob.provider, "Blob storage ready");

    let addr = config.socket_addr()?;
    let app = app::create_app(config, pool, blobs);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
