// Query/Recipe Loader (spec §4.4) — explicit services rather than
// module-level caches (spec §9 "session/context singletons" redesign).
// Each store is constructed once and held behind `Arc` in the per-request
// dependency bundle.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::RwLock;
use tracing::warn;

use crate::error::{FeedError, Result};
use crate::model::{QueryConfig, ScrollRecipe};

struct Cached<T> {
    value: T,
    loaded_mtime: Option<SystemTime>,
}

/// Scans a query directory (one config per file) and validates it,
/// memoizing the result until any file's mtime changes.
pub struct QueryStore {
    dir: PathBuf,
    cache: RwLock<Option<Cached<Vec<QueryConfig>>>>,
}

impl QueryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: RwLock::new(None),
        }
    }

    /// Load (or return the memoized) set of query configs. `name` is
    /// filename-derived and must be unique; `tier` must be one of the
    /// four tiers; `limit` must be positive. Malformed individual files
    /// are skipped with a warning rather than failing the whole load —
    /// only a directory read failure is a catastrophic
    /// (`ConfigInvalid`-surfaced) error.
    pub fn load(&self) -> Result<Vec<QueryConfig>> {
        let latest_mtime = self.latest_mtime()?;
        {
            let cache = self.cache.read();
            if let Some(cached) = cache.as_ref() {
                if cached.loaded_mtime == latest_mtime {
                    return Ok(cached.value.clone());
                }
            }
        }

        let mut configs = Vec::new();
        let mut seen_names = HashMap::new();
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| FeedError::ConfigInvalid(format!("cannot read query dir {:?}: {e}", self.dir)))?;

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("skipping unreadable query dir entry: {e}");
                    continue;
                }
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };

            let contents = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(e) => {
                    warn!(query = %name, "skipping query file that could not be read: {e}");
                    continue;
                }
            };
            let mut config: QueryConfig = match serde_yaml::from_str(&contents) {
                Ok(c) => c,
                Err(e) => {
                    warn!(query = %name, "skipping malformed query config: {e}");
                    continue;
                }
            };
            config.name = name.clone();

            if let Err(reason) = config.validate() {
                warn!(query = %name, %reason, "skipping invalid query config");
                continue;
            }

            if seen_names.insert(name.clone(), ()).is_some() {
                warn!(query = %name, "skipping duplicate query name");
                continue;
            }

            configs.push(config);
        }

        *self.cache.write() = Some(Cached { value: configs.clone(), loaded_mtime: latest_mtime });
        Ok(configs)
    }

    fn latest_mtime(&self) -> Result<Option<SystemTime>> {
        let mut latest: Option<SystemTime> = None;
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(_) => return Ok(None),
        };
        for entry in entries.flatten() {
            if let Ok(meta) = entry.metadata() {
                if let Ok(mtime) = meta.modified() {
                    latest = Some(latest.map_or(mtime, |l| l.max(mtime)));
                }
            }
        }
        Ok(latest)
    }
}

/// Baked-in defaults merged under whatever a user's recipe file supplies.
/// Sources not listed under any tier in the merged recipe are disabled
/// (not fetched) — handled by the caller via `ScrollRecipe::tiers`
/// presence checks, not by this loader.
fn default_recipe() -> ScrollRecipe {
    ScrollRecipe::default()
}

/// Loads a single user's `ScrollRecipe`, merging it atop
/// [`default_recipe`]. Memoized until the recipe file's mtime changes —
/// per spec §9's resolved open question, a recipe edit invalidates
/// immediately rather than waiting for session expiry, which the Pool
/// Manager implements by comparing `PoolState::recipe_mtime` against this
/// store's `mtime()`.
pub struct RecipeStore {
    path: PathBuf,
    cache: RwLock<Option<Cached<ScrollRecipe>>>,
}

impl RecipeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: RwLock::new(None),
        }
    }

    pub fn mtime(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok().and_then(|m| m.modified().ok())
    }

    pub fn load(&self) -> Result<ScrollRecipe> {
        let mtime = self.mtime();
        {
            let cache = self.cache.read();
            if let Some(cached) = cache.as_ref() {
                if cached.loaded_mtime == mtime {
                    return Ok(cached.value.clone());
                }
            }
        }

        let recipe: ScrollRecipe = match fs::read_to_string(&self.path) {
            Ok(contents) => serde_yaml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => default_recipe(),
            Err(e) => {
                return Err(FeedError::ConfigInvalid(format!(
                    "cannot read recipe file {:?}: {e}",
                    self.path
                )))
            }
        };

        let dupes = find_duplicate_source_assignments(&recipe);
        if !dupes.is_empty() {
            return Err(FeedError::ConfigInvalid(format!(
                "source(s) {dupes:?} assigned to more than one tier in recipe {:?}",
                self.path
            )));
        }

        *self.cache.write() = Some(Cached { value: clone_recipe(&recipe), loaded_mtime: mtime });
        Ok(recipe)
    }
}

fn clone_recipe(recipe: &ScrollRecipe) -> ScrollRecipe {
    recipe.clone()
}

/// Detect the misconfiguration spec §9 calls out: the same source name
/// appearing under more than one tier in the recipe. Returns the names
/// that are duplicated.
pub fn find_duplicate_source_assignments(recipe: &ScrollRecipe) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for tier_recipe in recipe.tiers.values() {
        for source_name in tier_recipe.sources.keys() {
            *seen.entry(source_name.clone()).or_insert(0) += 1;
        }
    }
    seen.into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_query(dir: &Path, filename: &str, body: &str) {
        let mut f = fs::File::create(dir.join(filename)).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn loads_valid_queries_and_derives_name_from_filename() {
        let dir = tempdir().unwrap();
        write_query(dir.path(), "worldnews.yaml", "type: reddit\ntier: wire\nlimit: 10\n");
        let store = QueryStore::new(dir.path());
        let configs = store.load().unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].name, "worldnews");
    }

    #[test]
    fn skips_config_with_zero_limit() {
        let dir = tempdir().unwrap();
        write_query(dir.path(), "bad.yaml", "type: reddit\ntier: wire\nlimit: 0\n");
        let store = QueryStore::new(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn skips_malformed_yaml() {
        let dir = tempdir().unwrap();
        write_query(dir.path(), "bad.yaml", "not: [valid yaml structure for query\n");
        let store = QueryStore::new(dir.path());
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn recipe_load_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let store = RecipeStore::new(dir.path().join("nonexistent.yaml"));
        let recipe = store.load().unwrap();
        assert!(recipe.batch_size.is_none());
    }

    #[test]
    fn detects_duplicate_source_assignments_across_tiers() {
        use crate::model::{SourceRecipe, Tier, TierRecipe};
        let mut recipe = ScrollRecipe::default();
        let mut wire = TierRecipe::default();
        wire.sources.insert("reddit".into(), SourceRecipe::default());
        let mut compass = TierRecipe::default();
        compass.sources.insert("reddit".into(), SourceRecipe::default());
        recipe.tiers.insert(Tier::Wire, wire);
        recipe.tiers.insert(Tier::Compass, compass);
        let dupes = find_duplicate_source_assignments(&recipe);
        assert_eq!(dupes, vec!["reddit".to_string()]);
    }
}
