// Spacing enforcement (spec §4.7.4) — four deterministic passes run in
// order. All are O(batchSize^2) worst case, acceptable because
// `batchSize <= 100` per spec.

use std::collections::{HashMap, HashSet};

use crate::model::{FeedItem, ScrollRecipe};

/// How far ahead a pass is willing to look for a swap candidate before
/// giving up and dropping the offending item.
const SWAP_WINDOW: usize = 5;

/// Run all four spacing passes in the order spec §4.7.4 specifies.
pub fn enforce(batch: Vec<FeedItem>, recipe: &ScrollRecipe) -> Vec<FeedItem> {
    let batch = enforce_max_consecutive(batch, recipe.spacing.max_consecutive, |item| item.source.clone());
    let batch = enforce_max_per_batch(batch, |item| source_cap(recipe, item), |item| item.source.clone());
    let batch = enforce_min_spacing(batch, |item| source_min_spacing(recipe, item), |item| Some(item.source.clone()));
    let batch = enforce_max_per_batch(batch, |item| subsource_cap(recipe, item), subsource_key);
    enforce_min_spacing(batch, |item| subsource_min_spacing(recipe, item), |item| subsource_key_opt(item))
}

fn source_cap(recipe: &ScrollRecipe, item: &FeedItem) -> Option<u32> {
    recipe.tiers.get(&item.tier)?.sources.get(&item.source)?.max_per_batch
}

fn source_min_spacing(recipe: &ScrollRecipe, item: &FeedItem) -> Option<u32> {
    recipe.tiers.get(&item.tier)?.sources.get(&item.source)?.min_spacing
}

fn subsource_cap(recipe: &ScrollRecipe, item: &FeedItem) -> Option<u32> {
    let sub = item.subsource.as_ref()?;
    recipe.tiers.get(&item.tier)?.sources.get(&item.source)?.subsources.get(sub)?.max_per_batch
}

fn subsource_min_spacing(recipe: &ScrollRecipe, item: &FeedItem) -> Option<u32> {
    let sub = item.subsource.as_ref()?;
    recipe.tiers.get(&item.tier)?.sources.get(&item.source)?.subsources.get(sub)?.min_spacing
}

fn subsource_key(item: &FeedItem) -> String {
    format!("{}/{}", item.source, item.subsource.as_deref().unwrap_or(""))
}

fn subsource_key_opt(item: &FeedItem) -> Option<String> {
    item.subsource.as_ref().map(|_| subsource_key(item))
}

/// Scan left to right; whenever a run of identical `key` exceeds
/// `max_consecutive`, try to swap the first excess item with a later one
/// (within `SWAP_WINDOW`) that breaks the run, or drop it if no such item
/// exists.
pub fn enforce_max_consecutive(
    mut batch: Vec<FeedItem>,
    max_consecutive: u32,
    key_of: impl Fn(&FeedItem) -> String,
) -> Vec<FeedItem> {
    let max_consecutive = max_consecutive.max(1) as usize;
    let mut i = 0;
    while i < batch.len() {
        let run_key = key_of(&batch[i]);
        let mut run_end = i + 1;
        while run_end < batch.len() && key_of(&batch[run_end]) == run_key {
            run_end += 1;
        }
        let run_len = run_end - i;
        if run_len > max_consecutive {
            let excess_idx = i + max_consecutive;
            let window_end = (excess_idx + SWAP_WINDOW).min(batch.len() - 1);
            let swap_target = ((excess_idx + 1)..=window_end).find(|&cand| key_of(&batch[cand]) != run_key);
            match swap_target {
                Some(cand) => {
                    batch.swap(excess_idx, cand);
                }
                None => {
                    batch.remove(excess_idx);
                    continue;
                }
            }
        }
        i += 1;
    }
    batch
}

/// Scan left to right tracking the last index each key was seen at;
/// whenever two same-key items are closer than their configured
/// `min_spacing`, swap the later one further out (within `SWAP_WINDOW`)
/// or drop it if no swap breaks the violation.
pub fn enforce_min_spacing(
    mut batch: Vec<FeedItem>,
    min_spacing_of: impl Fn(&FeedItem) -> Option<u32>,
    key_of: impl Fn(&FeedItem) -> Option<String>,
) -> Vec<FeedItem> {
    let mut last_seen: HashMap<String, usize> = HashMap::new();
    let mut i = 0;
    while i < batch.len() {
        let Some(key) = key_of(&batch[i]) else {
            i += 1;
            continue;
        };
        let Some(min_spacing) = min_spacing_of(&batch[i]) else {
            last_seen.insert(key, i);
            i += 1;
            continue;
        };
        let min_spacing = min_spacing as usize;
        if let Some(&prev_idx) = last_seen.get(&key) {
            if i - prev_idx < min_spacing {
                let window_end = (i + SWAP_WINDOW).min(batch.len() - 1);
                let swap_target = ((i + 1)..=window_end).find(|&cand| key_of(&batch[cand]).as_ref() != Some(&key));
                match swap_target {
                    Some(cand) => {
                        batch.swap(i, cand);
                        continue;
                    }
                    None => {
                        batch.remove(i);
                        continue;
                    }
                }
            }
        }
        last_seen.insert(key, i);
        i += 1;
    }
    batch
}

/// Whenever a keyed group exceeds its cap, drop the lowest-priority /
/// oldest items from that group until it fits.
pub fn enforce_max_per_batch(
    batch: Vec<FeedItem>,
    cap_of: impl Fn(&FeedItem) -> Option<u32>,
    key_of: impl Fn(&FeedItem) -> String,
) -> Vec<FeedItem> {
    let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
    for (idx, item) in batch.iter().enumerate() {
        groups.entry(key_of(item)).or_default().push(idx);
    }

    let mut drop: HashSet<usize> = HashSet::new();
    for idxs in groups.values() {
        let Some(cap) = cap_of(&batch[idxs[0]]) else { continue };
        let cap = cap as usize;
        if idxs.len() <= cap {
            continue;
        }
        let mut sorted = idxs.clone();
        sorted.sort_by(|&a, &b| {
            batch[a]
                .priority
                .cmp(&batch[b].priority)
                .then_with(|| batch[a].timestamp.cmp(&batch[b].timestamp))
        });
        for &idx in sorted.iter().take(idxs.len() - cap) {
            drop.insert(idx);
        }
    }

    batch
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| !drop.contains(idx))
        .map(|(_, item)| item)
        .collect()
}
