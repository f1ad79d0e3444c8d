// src/main.rs

use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use amagi::api::{router, AppState};
use amagi::chat::ChatOrchestrator;
use amagi::config::AmagiConfig;
use amagi::knowledge::{
    EmbeddingsClient, InMemoryKnowledgeStore, KnowledgeStore, QdrantKnowledgeStore,
};
use amagi::memory::sqlite::run_migration;
use amagi::memory::SqliteStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AmagiConfig::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!("starting amagi chat backend");
    info!(provider = %config.default_provider, "default llm provider");

    let options = SqliteConnectOptions::from_str(&config.database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(config.sqlite_max_connections)
        .connect_with(options)
        .await?;
    run_migration(&pool).await?;

    let store = Arc::new(SqliteStore::new(pool));

    // Qdrant needs embeddings; without a siliconflow key fall back to the
    // in-process store so the server still runs end to end.
    let knowledge: Arc<dyn KnowledgeStore> = if config.siliconflow_api_key.is_some() {
        let qdrant = QdrantKnowledgeStore::new(&config, EmbeddingsClient::new(&config));
        qdrant.ensure_collection().await?;
        Arc::new(qdrant)
    } else {
        warn!("no embeddings credentials, using in-memory knowledge store");
        Arc::new(InMemoryKnowledgeStore::new())
    };

    let orchestrator = ChatOrchestrator::new(config.clone(), store.clone(), store, knowledge);
    let state = Arc::new(AppState { orchestrator });

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!(%bind_address, "listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
