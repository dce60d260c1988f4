// Source Orchestrator (spec §4.3) — concurrent, per-source fan-out with
// timeouts, error isolation, and result normalization.
//
// Re-architected per spec §9: a bounded worker pool (one `tokio::spawn`
// per selected config inside a `JoinSet`, gated by a `Semaphore`) rather
// than an unbounded async gather-with-allSettled.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::filter::ResolvedFilter;
use crate::model::{FeedItem, QueryConfig};
use crate::normalizer;

use super::adapter::FetchContext;
use super::registry::AdapterRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    AdapterFailure,
    AdapterTimeout,
    Cancelled,
    UnknownSourceType,
}

#[derive(Debug, Clone)]
pub struct Warning {
    pub query_name: String,
    pub source_type: String,
    pub kind: WarningKind,
    pub message: String,
}

pub struct OrchestratorConfig {
    pub max_concurrency: usize,
    pub default_timeout: Duration,
    pub per_source_timeout: HashMap<String, Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 16,
            default_timeout: Duration::from_secs(5),
            per_source_timeout: HashMap::new(),
        }
    }
}

pub struct Orchestrator {
    registry: Arc<AdapterRegistry>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(registry: Arc<AdapterRegistry>, config: OrchestratorConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    fn timeout_for(&self, source_type: &str) -> Duration {
        self.config
            .per_source_timeout
            .get(source_type)
            .copied()
            .unwrap_or(self.config.default_timeout)
    }

    /// Fan out to every config that passes `filter` (when narrowing is
    /// active), normalize results, and return them alongside any
    /// per-source warnings. Never fails the whole request because a
    /// single adapter misbehaved.
    pub async fn fetch(
        &self,
        configs: &[QueryConfig],
        filter: Option<&ResolvedFilter>,
        cancellation: CancellationToken,
    ) -> (Vec<FeedItem>, Vec<Warning>) {
        let selected: Vec<&QueryConfig> = configs
            .iter()
            .filter(|c| filter.map(|f| f.matches_config(c)).unwrap_or(true))
            .collect();

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut join_set = JoinSet::new();

        for config in &selected {
            let config = (*config).clone();
            let Some(adapter) = self.registry.get(&config.type_) else {
                // No adapter registered for this type: surfaced as a
                // warning, not a hard failure (spec §7 AdapterFailure).
                continue;
            };
            let semaphore = semaphore.clone();
            let cancellation = cancellation.clone();
            let per_source_timeout = self.timeout_for(&config.type_);
            let subsource_filter = filter
                .filter(|f| f.matches_config(&config))
                .map(|f| f.subsources().to_vec())
                .unwrap_or_default();

            join_set.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                let ctx = FetchContext::new(cancellation.clone());
                let fetch_fut = adapter.fetch_items(&ctx, &config);

                let outcome = tokio::select! {
                    biased;
                    _ = cancellation.cancelled() => FetchOutcome::Cancelled,
                    result = timeout(per_source_timeout, fetch_fut) => match result {
                        Ok(Ok(raw_items)) => FetchOutcome::Items(raw_items),
                        Ok(Err(err)) => FetchOutcome::Failure(err.to_string()),
                        Err(_) => FetchOutcome::Timeout,
                    },
                };

                (config, subsource_filter, outcome)
            });
        }

        // Configs whose type has no registered adapter at all never get
        // spawned above; surface them as warnings up front.
        let mut warnings = Vec::new();
        for config in &selected {
            if !self.registry.contains(&config.type_) {
                warnings.push(Warning {
                    query_name: config.name.clone(),
                    source_type: config.type_.clone(),
                    kind: WarningKind::UnknownSourceType,
                    message: format!("no adapter registered for type '{}'", config.type_),
                });
            }
        }

        let mut items = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((config, subsource_filter, outcome)) => match outcome {
                    FetchOutcome::Items(raw_items) => {
                        let mut normalized: Vec<FeedItem> = raw_items
                            .into_iter()
                            .filter_map(|raw| normalizer::normalize(raw, &config))
                            .collect();
                        if !subsource_filter.is_empty()
                            && !self
                                .registry
                                .get(&config.type_)
                                .map(|a| a.supports(super::adapter::Capability::SubsourceFilter))
                                .unwrap_or(false)
                        {
                            normalized = normalizer::filter_by_subsource(normalized, &subsource_filter);
                        }
                        debug!(query = %config.name, count = normalized.len(), "source fetch completed");
                        items.extend(normalized);
                    }
                    FetchOutcome::Failure(message) => {
                        warn!(query = %config.name, %message, "adapter failure");
                        warnings.push(Warning {
                            query_name: config.name.clone(),
                            source_type: config.type_.clone(),
                            kind: WarningKind::AdapterFailure,
                            message,
                        });
                    }
                    FetchOutcome::Timeout => {
                        let elapsed = self.timeout_for(&config.type_);
                        warn!(query = %config.name, timeout_ms = elapsed.as_millis() as u64, "adapter timeout");
                        warnings.push(Warning {
                            query_name: config.name.clone(),
                            source_type: config.type_.clone(),
                            kind: WarningKind::AdapterTimeout,
                            message: format!("timed out after {}ms", elapsed.as_millis()),
                        });
                    }
                    FetchOutcome::Cancelled => {
                        warnings.push(Warning {
                            query_name: config.name.clone(),
                            source_type: config.type_.clone(),
                            kind: WarningKind::Cancelled,
                            message: "request cancelled".to_string(),
                        });
                    }
                },
                Err(join_err) => {
                    // Worker panicked; isolate it like any other failure.
                    warn!(%join_err, "adapter worker panicked");
                    warnings.push(Warning {
                        query_name: "unknown".to_string(),
                        source_type: "unknown".to_string(),
                        kind: WarningKind::AdapterFailure,
                        message: join_err.to_string(),
                    });
                }
            }
        }

        (items, warnings)
    }
}

enum FetchOutcome {
    Items(Vec<crate::model::RawItem>),
    Failure(String),
    Timeout,
    Cancelled,
}
