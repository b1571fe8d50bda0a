//! Mediref attachment gateway server.
//!
//! Main entry point for the attachment storage service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mediref_api::{AppState, create_router};
use mediref_core::storage::{GatewayConfig, StorageBackend, StorageGateway};
use mediref_db::connect;
use mediref_shared::{AppConfig, StorageSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mediref=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("failed to load configuration")?;

    // Connect to database
    let db = connect(&config.database.url).await?;
    info!("Connected to database");

    // Build the storage gateway
    let gateway = StorageGateway::from_config(gateway_config(&config.storage))?;
    info!(backend = gateway.backend_name(), "Storage gateway ready");

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        storage: Arc::new(gateway),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn gateway_config(settings: &StorageSettings) -> GatewayConfig {
    let backend = if settings.provider == "fs" {
        StorageBackend::local_fs(&settings.fs_root)
    } else {
        StorageBackend::s3(
            &settings.endpoint,
            &settings.bucket,
            &settings.access_key_id,
            &settings.secret_access_key,
            &settings.region,
        )
    };
    GatewayConfig::new(backend).with_presign_ttl(settings.presign_ttl_secs)
}
