// Dismissed-Items Store (spec §4.2) — persistent set with time-based
// auto-expiry, pruned on load.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use tracing::warn;

use crate::error::Result;

/// `{itemId -> dismissedAtEpochSeconds}`, the on-disk shape.
type DismissedMap = HashMap<String, i64>;

/// File-backed store of dismissed item ids. Concurrent `add` calls from
/// the same process serialize through `write_lock`; concurrent writers
/// from different processes may race, and last-writer-wins is accepted
/// per spec §4.2.
pub struct DismissedStore {
    path: PathBuf,
    retention: Duration,
    write_lock: Mutex<()>,
    warned_once: AtomicBool,
}

impl DismissedStore {
    pub fn new(path: impl Into<PathBuf>, retention: Duration) -> Self {
        Self {
            path: path.into(),
            retention,
            write_lock: Mutex::new(()),
            warned_once: AtomicBool::new(false),
        }
    }

    /// Read the persisted map, drop entries older than the retention
    /// window, write the pruned form back if anything was removed, and
    /// return the surviving set of item ids.
    pub fn load(&self) -> Result<HashSet<String>> {
        let _guard = self.write_lock.lock();
        let map = self.read_raw();
        let (pruned, removed) = prune(map, self.retention);
        if removed {
            self.write_raw(&pruned)?;
        }
        Ok(pruned.into_keys().collect())
    }

    /// Merge `ids` into the store with `now` as the dismissal timestamp
    /// and write back atomically. Dismissing the same id twice is
    /// idempotent — the stored value is simply overwritten with the
    /// latest timestamp.
    pub fn add(&self, ids: &[String]) -> Result<()> {
        let _guard = self.write_lock.lock();
        let mut map = self.read_raw();
        let now = now_epoch();
        for id in ids {
            map.insert(id.clone(), now);
        }
        self.write_raw(&map)
    }

    fn read_raw(&self) -> DismissedMap {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
                self.warn_once(&format!("dismissed file at {:?} is corrupt: {err}", self.path));
                DismissedMap::new()
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => DismissedMap::new(),
            Err(err) => {
                self.warn_once(&format!("failed to read dismissed file at {:?}: {err}", self.path));
                DismissedMap::new()
            }
        }
    }

    fn write_raw(&self, map: &DismissedMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = tmp_path_for(&self.path);
        let body = serde_json::to_vec_pretty(map)?;
        std::fs::write(&tmp_path, body)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn warn_once(&self, message: &str) {
        if !self.warned_once.swap(true, Ordering::SeqCst) {
            warn!("{message}");
        }
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("dismissed");
    tmp.set_file_name(format!("{file_name}.tmp"));
    tmp
}

fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Drop entries older than `retention`. Returns the pruned map and
/// whether anything was removed. Idempotent: `prune(prune(s)) == prune(s)`.
fn prune(map: DismissedMap, retention: Duration) -> (DismissedMap, bool) {
    let cutoff = now_epoch() - retention.as_secs() as i64;
    let before = map.len();
    let pruned: DismissedMap = map.into_iter().filter(|(_, ts)| *ts >= cutoff).collect();
    let removed = pruned.len() != before;
    (pruned, removed)
}
