// Interleaving (spec §4.7.3) — spread grounding items evenly across the
// wire-dominated stream.

use crate::model::FeedItem;

use super::slots::SlotPlan;

/// Canonical order grounding items are drawn from when multiple
/// non-wire tiers are allocated slots in the same batch. Compass (the
/// most time-sensitive grounding content) claims the earliest ideal
/// positions, then scrapbook, then library.
pub fn flatten_grounding(compass: Vec<FeedItem>, scrapbook: Vec<FeedItem>, library: Vec<FeedItem>) -> Vec<FeedItem> {
    let mut out = compass;
    out.extend(scrapbook);
    out.extend(library);
    out
}

/// Compute the ideal position for grounding item `k` of `grounding_slots`
/// in a batch of `batch_size`: `floor((k + 0.5) * batchSize /
/// (groundingSlots + 1))`.
pub fn ideal_position(k: usize, grounding_slots: usize, batch_size: usize) -> usize {
    let pos = (k as f64 + 0.5) * batch_size as f64 / (grounding_slots as f64 + 1.0);
    (pos.floor() as usize).min(batch_size.saturating_sub(1))
}

/// Assign `grounding` items to their ideal positions and fill the rest of
/// a `batchSize`-length sequence with `wire` items in order. Never
/// fabricates items: if either queue runs dry, the corresponding slots
/// are simply left empty and dropped from the final (possibly shorter)
/// output — spec §4.7.3 step 4 and §4.7.6 under-delivery semantics.
pub fn interleave(wire: Vec<FeedItem>, grounding: Vec<FeedItem>, slot_plan: SlotPlan) -> Vec<FeedItem> {
    let batch_size = slot_plan.batch_size;
    let grounding_slots = slot_plan.grounding_slots;

    let mut output: Vec<Option<FeedItem>> = (0..batch_size).map(|_| None).collect();
    let mut grounding_iter = grounding.into_iter();

    for k in 0..grounding_slots {
        let Some(item) = grounding_iter.next() else { break };
        let ideal = ideal_position(k, grounding_slots, batch_size);
        if let Some(idx) = nearest_empty(&output, ideal) {
            output[idx] = Some(item);
        }
    }

    let mut wire_iter = wire.into_iter();
    for slot in output.iter_mut() {
        if slot.is_none() {
            *slot = wire_iter.next();
        }
    }

    output.into_iter().flatten().collect()
}

fn nearest_empty(output: &[Option<FeedItem>], start: usize) -> Option<usize> {
    if output.is_empty() {
        return None;
    }
    let len = output.len() as isize;
    let start = start as isize;
    for offset in 0..len {
        for candidate in [start + offset, start - offset] {
            if candidate >= 0 && candidate < len && output[candidate as usize].is_none() {
                return Some(candidate as usize);
            }
        }
    }
    None
}
