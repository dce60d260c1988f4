// Explicit adapter registry (spec §9 "session/context singletons" redesign
// — no module-level cache; this is constructed once and passed through
// the per-request dependency bundle).

use std::collections::HashMap;
use std::sync::Arc;

use super::adapter::SourceAdapter;

/// Maps a `QueryConfig.type` to the adapter registered for it.
#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, source_type: impl Into<String>, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(source_type.into(), adapter);
    }

    pub fn get(&self, source_type: &str) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(source_type).cloned()
    }

    pub fn source_types(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    pub fn contains(&self, source_type: &str) -> bool {
        self.adapters.contains_key(source_type)
    }
}
