//! Food Facts Server - Main entry point

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use foodfacts_common::logging::{init_logging, LogConfig};
use tracing::info;

use foodfacts_server::{
    api,
    config::Config,
    features::FeatureState,
    store::{PgProductStore, ProductStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("foodfacts-server")
        .filter_directives("foodfacts_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Food Facts Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let store = PgProductStore::connect(&config.database)
        .await
        .context("Failed to connect to the product store")?;
    info!("Product store ready");

    let store: Arc<dyn ProductStore> = Arc::new(store);
    let app = api::create_router(FeatureState::new(store.clone()), &config.cors);

    let served = async {
        let addr: SocketAddr = config.bind_address().parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Server listening on {}", addr);

        api::serve(
            listener,
            app,
            Duration::from_secs(config.server.shutdown_timeout_secs),
        )
        .await?;
        anyhow::Ok(())
    }
    .await;

    store.close().await;
    served?;

    info!("Server shut down gracefully");

    Ok(())
}
