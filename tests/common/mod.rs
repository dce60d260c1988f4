// Shared fixtures for the end-to-end scenario tests in spec §8.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use daylight_feed::dismissed::DismissedStore;
use daylight_feed::error::Result;
use daylight_feed::model::{QueryConfig, RawItem};
use daylight_feed::orchestrator::adapter::{Capability, FetchContext, SourceAdapter};
use daylight_feed::orchestrator::{AdapterRegistry, Orchestrator, OrchestratorConfig};
use daylight_feed::pool::{GetBatchRequest, PoolManager, SessionKey};
use daylight_feed::recipe::{QueryStore, RecipeStore};

/// Returns `count` items for a source, one query per call, with strictly
/// decreasing timestamps so newest-first sort order is unambiguous.
pub struct FixedAdapter {
    pub items: Vec<RawItem>,
}

#[async_trait]
impl SourceAdapter for FixedAdapter {
    async fn fetch_items(&self, _ctx: &FetchContext, _config: &QueryConfig) -> Result<Vec<RawItem>> {
        Ok(self.items.clone())
    }
}

pub struct SlowAdapter {
    pub delay: Duration,
}

#[async_trait]
impl SourceAdapter for SlowAdapter {
    async fn fetch_items(&self, _ctx: &FetchContext, _config: &QueryConfig) -> Result<Vec<RawItem>> {
        tokio::time::sleep(self.delay).await;
        Ok(vec![])
    }
}

/// Fixed adapter with upstream read state (a stand-in for FreshRSS),
/// recording every id `mark_read` is called with.
pub struct MarkReadAdapter {
    pub items: Vec<RawItem>,
    pub marked: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl SourceAdapter for MarkReadAdapter {
    async fn fetch_items(&self, _ctx: &FetchContext, _config: &QueryConfig) -> Result<Vec<RawItem>> {
        Ok(self.items.clone())
    }

    fn supports(&self, capability: Capability) -> bool {
        capability == Capability::MarkRead
    }

    async fn mark_read(&self, local_ids: &[String]) -> Result<()> {
        self.marked.lock().unwrap().extend(local_ids.iter().cloned());
        Ok(())
    }
}

pub fn wire_items(source_prefix: &str, count: usize, base_epoch: i64) -> Vec<RawItem> {
    (0..count)
        .map(|i| RawItem {
            id: Some(format!("{source_prefix}-{i}")),
            title: Some(format!("{source_prefix} headline {i}")),
            timestamp: Some((base_epoch - i as i64 * 60).to_string()),
            ..RawItem::default()
        })
        .collect()
}

pub fn compass_items(source_prefix: &str, count: usize, priority: i64) -> Vec<RawItem> {
    (0..count)
        .map(|i| RawItem {
            id: Some(format!("{source_prefix}-{i}")),
            title: Some(format!("{source_prefix} card {i}")),
            priority: Some(priority),
            ..RawItem::default()
        })
        .collect()
}

pub fn write_file(path: &std::path::Path, body: &str) {
    std::fs::write(path, body).unwrap();
}

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub manager: PoolManager,
}

pub fn build_harness(registry: AdapterRegistry, recipe_yaml: Option<&str>) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("queries")).unwrap();
    if let Some(yaml) = recipe_yaml {
        write_file(&dir.path().join("recipe.yaml"), yaml);
    }

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(registry),
        OrchestratorConfig {
            max_concurrency: 16,
            default_timeout: Duration::from_millis(200),
            per_source_timeout: HashMap::new(),
        },
    ));
    let queries = Arc::new(QueryStore::new(dir.path().join("queries")));
    let recipes = Arc::new(RecipeStore::new(dir.path().join("recipe.yaml")));
    let dismissed = Arc::new(DismissedStore::new(
        dir.path().join("dismissed.json"),
        Duration::from_secs(30 * 86_400),
    ));
    let manager = PoolManager::new(orchestrator, queries, recipes, dismissed, 25, Duration::from_secs(7200));
    Harness { dir, manager }
}

impl Harness {
    pub fn write_query(&self, filename: &str, body: &str) {
        write_file(&self.dir.path().join("queries").join(filename), body);
    }

    pub async fn get_batch(&self, session: &str, limit: Option<usize>, cursor: Option<usize>, filter: Option<&str>) -> daylight_feed::pool::Batch {
        self.manager
            .get_batch(
                GetBatchRequest {
                    session: SessionKey::new("default", session),
                    limit,
                    cursor,
                    filter: filter.map(str::to_string),
                },
                CancellationToken::new(),
            )
            .await
            .unwrap()
    }
}
