// Per-tier selection strategy (spec §4.7.2): filter -> sort -> pick.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::model::{FeedItem, TierRecipe};

/// Greedy pick honoring per-source and per-subsource `maxPerBatch` caps,
/// which also gives wire its "no source may exceed maxPerBatch" source
/// diversity guarantee (spec §4.7.2). Shared by every tier's pick step;
/// a tier with no configured caps is effectively unconstrained here (the
/// global spacing pass in `assembly::spacing` still applies afterward).
pub fn pick_with_caps(items: Vec<FeedItem>, limit: usize, tier_recipe: &TierRecipe) -> Vec<FeedItem> {
    let mut picked = Vec::with_capacity(limit.min(items.len()));
    let mut source_counts: HashMap<String, u32> = HashMap::new();
    let mut subsource_counts: HashMap<(String, String), u32> = HashMap::new();

    for item in items {
        if picked.len() >= limit {
            break;
        }

        if let Some(source_recipe) = tier_recipe.sources.get(&item.source) {
            if let Some(cap) = source_recipe.max_per_batch {
                if source_counts.get(&item.source).copied().unwrap_or(0) >= cap {
                    continue;
                }
            }
            if let Some(sub) = &item.subsource {
                if let Some(sub_recipe) = source_recipe.subsources.get(sub) {
                    if let Some(cap) = sub_recipe.max_per_batch {
                        let key = (item.source.clone(), sub.clone());
                        if subsource_counts.get(&key).copied().unwrap_or(0) >= cap {
                            continue;
                        }
                    }
                }
            }
        }

        *source_counts.entry(item.source.clone()).or_insert(0) += 1;
        if let Some(sub) = &item.subsource {
            *subsource_counts.entry((item.source.clone(), sub.clone())).or_insert(0) += 1;
        }
        picked.push(item);
    }

    picked
}

/// Wire: sort by timestamp descending, then pick with caps. Items already
/// had dismissed/read filtering applied upstream by the Pool Manager.
pub fn select_wire(mut items: Vec<FeedItem>, tier_recipe: &TierRecipe, limit: usize) -> Vec<FeedItem> {
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    pick_with_caps(items, limit, tier_recipe)
}

/// Library: stable random order seeded per session so pagination stays
/// consistent across requests within the same session.
pub fn select_library(items: Vec<FeedItem>, tier_recipe: &TierRecipe, limit: usize, session_seed: u64) -> Vec<FeedItem> {
    let mut rng = StdRng::seed_from_u64(session_seed ^ LIBRARY_SALT);
    let mut scored: Vec<(f64, FeedItem)> = items.into_iter().map(|item| (rng.random::<f64>(), item)).collect();
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let ordered = scored.into_iter().map(|(_, item)| item).collect();
    pick_with_caps(ordered, limit, tier_recipe)
}

const LIBRARY_SALT: u64 = 0x4C49_4252_4152_5900; // "LIBRARY\0"
const SCRAPBOOK_SALT: u64 = 0x5343_5241_5042_4B00; // "SCRAPBK\0"
const ANNIVERSARY_WINDOW: usize = 5;

/// Scrapbook: drop items already surfaced in the session's recently-shown
/// buffer, then randomize with a deterministic anniversary tiebreak —
/// items carrying `meta.yearsAgo` are pulled to the front of each small
/// window rather than globally sorted first, per spec §4.7.2.
pub fn select_scrapbook(
    items: Vec<FeedItem>,
    tier_recipe: &TierRecipe,
    limit: usize,
    session_seed: u64,
    recently_shown: &VecDeque<String>,
) -> Vec<FeedItem> {
    let shown: HashSet<&str> = recently_shown.iter().map(String::as_str).collect();
    let items: Vec<FeedItem> = items.into_iter().filter(|i| !shown.contains(i.id.as_str())).collect();

    let mut rng = StdRng::seed_from_u64(session_seed ^ SCRAPBOOK_SALT);
    let mut scored: Vec<(f64, FeedItem)> = items.into_iter().map(|item| (rng.random::<f64>(), item)).collect();
    scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    let mut ordered: Vec<FeedItem> = scored.into_iter().map(|(_, item)| item).collect();

    for chunk in ordered.chunks_mut(ANNIVERSARY_WINDOW) {
        chunk.sort_by_key(|item| if item.years_ago().is_some() { 0 } else { 1 });
    }

    pick_with_caps(ordered, limit, tier_recipe)
}

/// Compass: drop stale items per-source (`selection.freshness`), sort by
/// priority descending with a stable source-name tiebreak, then pick.
pub fn select_compass(
    items: Vec<FeedItem>,
    tier_recipe: &TierRecipe,
    limit: usize,
    freshness: &HashMap<String, u64>,
    now: DateTime<Utc>,
) -> Vec<FeedItem> {
    let fresh: Vec<FeedItem> = items
        .into_iter()
        .filter(|item| match (freshness.get(&item.source), item.timestamp) {
            (Some(window_secs), Some(ts)) => (now - ts).num_seconds() <= *window_secs as i64,
            _ => true,
        })
        .collect();

    let mut sorted = fresh;
    sorted.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.source.cmp(&b.source)));
    pick_with_caps(sorted, limit, tier_recipe)
}

/// Legacy decay mode (spec §4.7.5) has no fixed slot plan, so grounding
/// candidates are selected unbounded (capped only by `batch_size`, which
/// is always a safe upper bound) and combined in the same canonical
/// order as `interleave::flatten_grounding`.
#[allow(clippy::too_many_arguments)]
pub fn flatten_library_scrapbook_compass(
    library_pool: Vec<FeedItem>,
    scrapbook_pool: Vec<FeedItem>,
    compass_pool: Vec<FeedItem>,
    library_recipe: &TierRecipe,
    scrapbook_recipe: &TierRecipe,
    compass_recipe: &TierRecipe,
    batch_size: usize,
    session_seed: u64,
    recently_shown: &VecDeque<String>,
    freshness: &HashMap<String, u64>,
    now: DateTime<Utc>,
) -> Vec<FeedItem> {
    let compass = select_compass(compass_pool, compass_recipe, batch_size, freshness, now);
    let scrapbook = select_scrapbook(scrapbook_pool, scrapbook_recipe, batch_size, session_seed, recently_shown);
    let library = select_library(library_pool, library_recipe, batch_size, session_seed);

    let mut out = compass;
    out.extend(scrapbook);
    out.extend(library);
    out
}
