// Legacy decay mode (spec §4.7.5) — an alternative to fixed tier
// allocations for recipes that only specify `algorithm.{groundingRatio,
// decayRate, minRatio}`. Instead of planning slots up front, a grounding
// item is inserted after every `ratio` wire items, where `ratio` decays
// over the session's lifetime.

use crate::model::{DecayAlgorithm, FeedItem};

/// `ratio = max(minRatio, floor(groundingRatio * decayRate^(sessionMinutes/5)))`,
/// floored to at least 1 so the insertion loop in `interleave_by_ratio`
/// always terminates.
pub fn ratio(algorithm: &DecayAlgorithm, session_minutes: f64) -> u64 {
    let exponent = session_minutes / 5.0;
    let decayed = algorithm.grounding_ratio * algorithm.decay_rate.powf(exponent);
    let floored = decayed.floor().max(algorithm.min_ratio);
    (floored as u64).max(1)
}

/// Insert one grounding item after every `ratio` wire items. Stops once
/// either queue is exhausted; never fabricates items (spec §4.7.6).
pub fn interleave_by_ratio(wire: Vec<FeedItem>, grounding: Vec<FeedItem>, ratio: u64) -> Vec<FeedItem> {
    let mut wire_iter = wire.into_iter();
    let mut grounding_iter = grounding.into_iter();
    let mut out = Vec::new();

    'outer: loop {
        for _ in 0..ratio {
            match wire_iter.next() {
                Some(item) => out.push(item),
                None => break 'outer,
            }
        }
        match grounding_iter.next() {
            Some(item) => out.push(item),
            None => break,
        }
    }

    out
}
