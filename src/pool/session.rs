// Per-session pool state (spec §4.6).

use std::collections::VecDeque;
use std::time::{Instant, SystemTime};

use serde::{Deserialize, Serialize};

use crate::model::FeedItem;

/// `(user, session)` — the `DashMap` key. `session` is caller-supplied
/// (spec §6.1's `session=<iso>` query param, typically the client's
/// session-start timestamp) so pagination and recipe-reload invalidation
/// stay scoped to one browsing session rather than one user globally.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub user: String,
    pub session: String,
}

impl SessionKey {
    pub fn new(user: impl Into<String>, session: impl Into<String>) -> Self {
        Self { user: user.into(), session: session.into() }
    }
}

/// Size of the scrapbook recently-shown dedup window, expressed as a
/// multiple of `batchSize` (spec §4.7.2 default of 3).
const RECENTLY_SHOWN_BATCHES: usize = 3;

/// Everything the Pool Manager tracks for one active session.
pub struct PoolState {
    pub pool: Vec<FeedItem>,
    /// Monotonically increasing count of items served so far this
    /// session; `cursor` in the wire protocol is this value.
    pub cursor: usize,
    pub last_activity: Instant,
    /// The `RecipeStore` mtime this pool was assembled against — compared
    /// on each request to invalidate immediately on a recipe edit (spec
    /// §9 resolved open question).
    pub recipe_mtime: Option<SystemTime>,
    pub recently_shown: VecDeque<String>,
    pub recently_shown_capacity: usize,
    /// Per-session random seed for Library/Scrapbook stable ordering.
    pub seed: u64,
    pub session_started: Instant,
}

impl PoolState {
    pub fn new(seed: u64, batch_size: usize) -> Self {
        let now = Instant::now();
        Self {
            pool: Vec::new(),
            cursor: 0,
            last_activity: now,
            recipe_mtime: None,
            recently_shown: VecDeque::new(),
            recently_shown_capacity: batch_size.max(1) * RECENTLY_SHOWN_BATCHES,
            seed,
            session_started: now,
        }
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn is_idle(&self, ttl: std::time::Duration) -> bool {
        self.last_activity.elapsed() >= ttl
    }

    pub fn session_minutes(&self) -> f64 {
        self.session_started.elapsed().as_secs_f64() / 60.0
    }

    pub fn record_shown(&mut self, items: &[FeedItem]) {
        for item in items {
            self.recently_shown.push_back(item.id.clone());
        }
        while self.recently_shown.len() > self.recently_shown_capacity {
            self.recently_shown.pop_front();
        }
    }

    /// `true` when `recipe_mtime` no longer matches the store's current
    /// mtime, meaning this pool was assembled against a stale recipe and
    /// must be rebuilt from scratch.
    pub fn recipe_is_stale(&self, current_mtime: Option<SystemTime>) -> bool {
        self.recipe_mtime != current_mtime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn recently_shown_buffer_respects_capacity() {
        let mut state = PoolState::new(1, 2);
        assert_eq!(state.recently_shown_capacity, 6);
        for i in 0..10 {
            state.record_shown(&[crate::model::FeedItem {
                id: format!("id-{i}"),
                tier: crate::model::Tier::Scrapbook,
                source: "photos".into(),
                subsource: None,
                title: "t".into(),
                body: None,
                image_url: None,
                link: None,
                timestamp: None,
                priority: 0,
                query_name: "q".into(),
                meta: serde_json::Map::new(),
            }]);
        }
        assert_eq!(state.recently_shown.len(), 6);
        assert_eq!(state.recently_shown.front().unwrap(), "id-4");
    }

    #[test]
    fn is_idle_reflects_ttl() {
        let state = PoolState::new(1, 10);
        assert!(!state.is_idle(Duration::from_secs(3600)));
    }

    #[test]
    fn recipe_is_stale_when_mtime_differs() {
        let mut state = PoolState::new(1, 10);
        assert!(!state.recipe_is_stale(None));
        state.recipe_mtime = Some(SystemTime::now());
        assert!(state.recipe_is_stale(None));
    }
}
