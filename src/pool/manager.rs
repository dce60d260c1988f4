// Pool Manager (spec §4.6) — owns per-session pool state and orchestrates
// refill, dismissal-filtering, filter-narrowing bypass, and full tier
// assembly. Grounded on `rusty-db`'s use of `dashmap::DashMap` for its
// concurrent connection/session maps.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::assembly::{self, AssemblyInput};
use crate::dismissed::DismissedStore;
use crate::error::Result;
use crate::filter::{self, ResolvedFilter};
use crate::model::QueryConfig;
use crate::orchestrator::{Capability, Orchestrator};
use crate::recipe::{QueryStore, RecipeStore};

use super::session::{PoolState, SessionKey};

pub struct GetBatchRequest {
    pub session: SessionKey,
    pub limit: Option<usize>,
    pub cursor: Option<usize>,
    pub filter: Option<String>,
}

pub struct Batch {
    pub items: Vec<crate::model::FeedItem>,
    pub next_cursor: usize,
    pub has_more: bool,
}

pub struct DismissOutcome {
    pub dismissed: usize,
}

pub struct PoolManager {
    sessions: DashMap<SessionKey, Arc<Mutex<PoolState>>>,
    orchestrator: Arc<Orchestrator>,
    queries: Arc<QueryStore>,
    recipes: Arc<RecipeStore>,
    dismissed: Arc<DismissedStore>,
    default_batch_size: usize,
    session_ttl: Duration,
}

impl PoolManager {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        queries: Arc<QueryStore>,
        recipes: Arc<RecipeStore>,
        dismissed: Arc<DismissedStore>,
        default_batch_size: usize,
        session_ttl: Duration,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            orchestrator,
            queries,
            recipes,
            dismissed,
            default_batch_size,
            session_ttl,
        }
    }

    /// Periodic idle-session sweep; run from a `tokio::time::interval`
    /// loop in `main`, not on every request, so `get_batch` stays O(1)
    /// amortized.
    pub async fn sweep_idle_sessions(&self) {
        let ttl = self.session_ttl;
        let mut stale = Vec::new();
        for entry in self.sessions.iter() {
            if entry.value().lock().await.is_idle(ttl) {
                stale.push(entry.key().clone());
            }
        }
        for key in &stale {
            self.sessions.remove(key);
        }
        if !stale.is_empty() {
            info!(count = stale.len(), "swept idle feed sessions");
        }
    }

    /// Spec §4.6 "Dismiss": partition `item_ids` by their `source:local_id`
    /// prefix. Ids whose adapter has upstream read state (FreshRSS and
    /// similar) are routed to `SourceAdapter::mark_read`; everything else
    /// falls through to the Dismissed-Items Store.
    pub async fn dismiss(&self, item_ids: Vec<String>) -> Result<DismissOutcome> {
        let total = item_ids.len();

        let mut by_source: HashMap<&str, Vec<&str>> = HashMap::new();
        for id in &item_ids {
            if let Some((source_type, local_id)) = id.split_once(':') {
                by_source.entry(source_type).or_default().push(local_id);
            }
        }

        let mut routed: HashSet<String> = HashSet::new();
        for (source_type, local_ids) in by_source {
            let Some(adapter) = self.orchestrator.registry().get(source_type) else {
                continue;
            };
            if !adapter.supports(Capability::MarkRead) {
                continue;
            }
            let local_ids: Vec<String> = local_ids.into_iter().map(str::to_string).collect();
            adapter.mark_read(&local_ids).await?;
            routed.extend(local_ids.into_iter().map(|local_id| format!("{source_type}:{local_id}")));
        }

        let to_store: Vec<String> = item_ids.into_iter().filter(|id| !routed.contains(id)).collect();
        self.dismissed.add(&to_store)?;
        Ok(DismissOutcome { dismissed: total })
    }

    pub async fn get_batch(&self, req: GetBatchRequest, cancellation: CancellationToken) -> Result<Batch> {
        let queries = self.queries.load()?;
        let recipe = Arc::new(self.recipes.load()?);
        let recipe_mtime = self.recipes.mtime();
        let batch_size = req.limit.unwrap_or_else(|| recipe.batch_size.unwrap_or(self.default_batch_size));

        // Clone the `Arc` out and drop the `DashMap` shard guard immediately —
        // holding it across the `.await`s below would block unrelated
        // sessions hashed to the same shard.
        let session_lock = self
            .sessions
            .entry(req.session.clone())
            .or_insert_with(|| Arc::new(Mutex::new(PoolState::new(session_seed(&req.session), batch_size))))
            .clone();

        let mut state = session_lock.lock().await;
        state.touch();

        if state.recipe_is_stale(recipe_mtime) {
            state.pool.clear();
            state.cursor = 0;
            state.recipe_mtime = recipe_mtime;
        }

        let resolved_filter = req
            .filter
            .as_deref()
            .and_then(|expr| filter::resolve(expr, self.orchestrator.registry(), &queries, &recipe.aliases));

        let need_refill = state.pool.is_empty() || req.cursor.is_none();
        if need_refill {
            self.refill(&mut state, &queries, resolved_filter.as_ref(), cancellation.clone()).await?;
        }

        // Spec §4.3 cancellation contract: a cancelled request returns
        // whatever partial items were fetched without advancing the
        // cursor or touching `recently_shown` — the next request re-fetches
        // rather than resuming from a half-written pool.
        if cancellation.is_cancelled() {
            let partial: Vec<_> = state.pool.iter().take(batch_size).cloned().collect();
            return Ok(Batch { items: partial, next_cursor: state.cursor, has_more: false });
        }

        let dismissed_ids = self.dismissed.load()?;
        state.pool.retain(|item| !dismissed_ids.contains(&item.id));

        if let Some(filter) = &resolved_filter {
            return Ok(self.bypass_assembly(&mut state, filter, batch_size));
        }

        // Assemble against a snapshot rather than draining `state.pool`:
        // `assemble` only returns the items it picked for this batch, so
        // taking the pool outright would silently discard every item it
        // passed over. The unpicked surplus is retained in `state.pool`
        // (spec §4.6 consumed-set semantics) so the next page serves
        // strictly-after-cursor items instead of re-assembling the same
        // top-N from a freshly refetched pool.
        let assembled = assembly::assemble(AssemblyInput {
            pool: state.pool.clone(),
            recipe: &recipe,
            batch_size,
            session_seed: state.seed,
            session_minutes: state.session_minutes(),
            recently_shown: &state.recently_shown.clone(),
            now: chrono::Utc::now(),
        });

        let consumed: HashSet<&str> = assembled.items.iter().map(|item| item.id.as_str()).collect();
        state.pool.retain(|item| !consumed.contains(item.id.as_str()));

        state.record_shown(&assembled.items);
        state.cursor += assembled.items.len();

        Ok(Batch { items: assembled.items, next_cursor: state.cursor, has_more: assembled.has_more })
    }

    async fn refill(
        &self,
        state: &mut PoolState,
        queries: &[QueryConfig],
        filter: Option<&ResolvedFilter>,
        cancellation: CancellationToken,
    ) -> Result<()> {
        let (items, warnings) = self.orchestrator.fetch(queries, filter, cancellation).await;
        for warning in &warnings {
            tracing::warn!(source = %warning.source_type, kind = ?warning.kind, "{}", warning.message);
        }
        state.pool = items;
        Ok(())
    }

    /// Spec §4.6 step 3: when narrowing by filter, skip the Tier Assembly
    /// Engine entirely — sort wire items by timestamp desc, leave others
    /// in adapter order, skip past what this session already consumed,
    /// and slice by `batch_size`.
    fn bypass_assembly(&self, state: &mut PoolState, filter: &ResolvedFilter, batch_size: usize) -> Batch {
        let mut matching: Vec<crate::model::FeedItem> = state
            .pool
            .iter()
            .filter(|item| filter_matches_item(filter, item))
            .cloned()
            .collect();

        let is_wire_only = matches!(filter, ResolvedFilter::Tier { tier } if *tier == crate::model::Tier::Wire);
        if is_wire_only {
            matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        }

        let remaining = matching.len().saturating_sub(state.cursor);
        let taken: Vec<_> = matching.into_iter().skip(state.cursor).take(batch_size).collect();
        let has_more = remaining > taken.len();
        state.record_shown(&taken);
        state.cursor += taken.len();
        Batch { items: taken, next_cursor: state.cursor, has_more }
    }
}

fn filter_matches_item(filter: &ResolvedFilter, item: &crate::model::FeedItem) -> bool {
    match filter {
        ResolvedFilter::Tier { tier } => item.tier == *tier,
        ResolvedFilter::Source { source_type, subsources } => {
            item.source == *source_type
                && (subsources.is_empty() || item.subsource.as_deref().map(|s| subsources.iter().any(|w| w == s)).unwrap_or(false))
        }
        ResolvedFilter::Query { query_name } => item.query_name == *query_name,
    }
}

fn session_seed(key: &SessionKey) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
}
