use tg_server::{AppState, build_router, logger, sweeper};

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info};
use tg_config::{Config, StoreBackend};
use tg_store::{CredentialStore, MemoryStore, SqliteStore};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Local overrides for development; absent in deployments
    dotenvy::dotenv().ok();

    // Load and validate configuration
    let config = Config::load()?;
    config.validate()?;

    let log_file_path = config.log_file_path()?;
    if let Some(log_dir) = log_file_path.as_ref().and_then(|path| path.parent()) {
        std::fs::create_dir_all(log_dir)?;
    }

    // Initialize logger (before any other logging)
    logger::initialize(config.logging.level, log_file_path, config.logging.colored)?;

    info!("Starting tg-server v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();
    config.warn_insecure_defaults();

    let store: Arc<dyn CredentialStore> = match config.store.backend {
        StoreBackend::Memory => {
            info!("Credential store: in-memory (sessions are lost on restart)");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Sqlite => {
            let store_path = config.store_path()?;
            if let Some(parent) = store_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            Arc::new(SqliteStore::connect(&store_path).await?)
        }
    };

    let app_state = AppState::from_config(&config, store.clone())?;

    let sweeper_handle = config
        .store
        .sweep_interval()
        .map(|interval| {
            info!("Store sweep every {:?}", interval);
            sweeper::spawn(store.clone(), interval, config.store.timeout())
        });

    // Build router
    let app = build_router(app_state);

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;

    // Get actual bound address (important when port is 0 / auto-assigned)
    let actual_addr = listener.local_addr()?;
    info!("Server listening on {}", actual_addr);

    // Peer addresses key the rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(handle) = sweeper_handle {
        handle.abort();
    }
    info!("Graceful shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        Err(e) => error!("Failed to listen for SIGINT: {}", e),
    }
}
