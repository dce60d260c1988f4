// Feed engine server entry point. Wires the seven components together
// and starts the HTTP surface; mirrors the teacher's startup shape
// (structured logging init, config load, subsystem construction, spawn
// background sweep, serve) without the storage/cluster/replication
// machinery that has no counterpart here.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use daylight_feed::api::{self, AppState};
use daylight_feed::config::EngineConfig;
use daylight_feed::dismissed::DismissedStore;
use daylight_feed::orchestrator::{AdapterRegistry, Orchestrator, OrchestratorConfig};
use daylight_feed::pool::PoolManager;
use daylight_feed::recipe::{QueryStore, RecipeStore};

#[tokio::main]
async fn main() -> daylight_feed::error::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    let config = EngineConfig::from_env();
    let data_dir = std::env::var("FEED_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./data"));

    info!(?data_dir, "starting feed engine");

    // Real source adapters (reddit, rss, youtube, komga, ...) are
    // external collaborators out of scope for this crate (spec §1) — a
    // deployment registers them here before starting the server.
    let registry = Arc::new(AdapterRegistry::new());
    let orchestrator = Arc::new(Orchestrator::new(
        registry,
        OrchestratorConfig {
            max_concurrency: config.max_adapter_concurrency,
            default_timeout: config.default_adapter_timeout,
            per_source_timeout: Default::default(),
        },
    ));

    let queries = Arc::new(QueryStore::new(data_dir.join("queries")));
    let recipes = Arc::new(RecipeStore::new(data_dir.join("recipe.yaml")));
    let dismissed = Arc::new(DismissedStore::new(
        data_dir.join("dismissed.json"),
        config.dismissed_retention,
    ));

    let pool_manager = Arc::new(PoolManager::new(
        orchestrator,
        queries,
        recipes,
        dismissed,
        config.default_batch_size,
        config.session_ttl,
    ));

    let sweep_manager = pool_manager.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5 * 60));
        loop {
            interval.tick().await;
            sweep_manager.sweep_idle_sessions().await;
        }
    });

    let addr = std::env::var("FEED_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let state = Arc::new(AppState { pool_manager });
    if let Err(e) = api::run(&addr, state, Duration::from_secs(30)).await {
        error!("server error: {e}");
        return Err(e);
    }
    Ok(())
}
