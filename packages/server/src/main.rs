use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use server::config::AppConfig;
use server::state::AppState;
use server::{build_router, database, seed};
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    info!("Configuration loaded");

    let db = database::init_db(&config.database.url).await?;
    seed::ensure_indexes(&db).await?;
    info!("Database ready");

    let blob_store =
        FilesystemBlobStore::new(config.storage.blob_dir.clone(), config.storage.max_blob_size)
            .await?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState {
        db,
        blob_store: Arc::new(blob_store),
        config,
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}
