// Tier Assembly Engine (spec §4.7) — turns a flat pool of normalized
// items plus a `ScrollRecipe` into a single spaced, interleaved batch.

pub mod decay;
pub mod interleave;
pub mod slots;
pub mod spacing;
pub mod strategy;

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use crate::model::{FeedItem, ScrollRecipe, Tier, TierRecipe};

/// Everything the assembler needs about the pool and session that isn't
/// carried on `ScrollRecipe` itself.
pub struct AssemblyInput<'a> {
    pub pool: Vec<FeedItem>,
    pub recipe: &'a ScrollRecipe,
    pub batch_size: usize,
    pub session_seed: u64,
    pub session_minutes: f64,
    pub recently_shown: &'a VecDeque<String>,
    pub now: DateTime<Utc>,
}

/// `items` is the assembled batch (possibly shorter than `batch_size`,
/// spec §4.7.6 under-delivery); `has_more` is `false` whenever the pool
/// could not fill the batch.
pub struct AssemblyOutput {
    pub items: Vec<FeedItem>,
    pub has_more: bool,
}

fn empty_tier_recipe() -> TierRecipe {
    TierRecipe { allocation: None, selection: Default::default(), sources: HashMap::new() }
}

/// Run the full pipeline: split pool by tier, apply each tier's
/// filter/sort/pick strategy, then either interleave against fixed slot
/// allocations or fall back to legacy decay-ratio interleaving, then run
/// the deterministic spacing passes.
pub fn assemble(input: AssemblyInput<'_>) -> AssemblyOutput {
    let AssemblyInput { pool, recipe, batch_size, session_seed, session_minutes, recently_shown, now } = input;

    if batch_size == 0 {
        return AssemblyOutput { items: Vec::new(), has_more: !pool.is_empty() };
    }

    let mut by_tier: HashMap<Tier, Vec<FeedItem>> = HashMap::new();
    for item in pool {
        by_tier.entry(item.tier).or_default().push(item);
    }
    let pool_total: usize = by_tier.values().map(Vec::len).sum();

    let default_tier_recipe = empty_tier_recipe();
    let wire_recipe = recipe.tiers.get(&Tier::Wire).unwrap_or(&default_tier_recipe);
    let library_recipe = recipe.tiers.get(&Tier::Library).unwrap_or(&default_tier_recipe);
    let scrapbook_recipe = recipe.tiers.get(&Tier::Scrapbook).unwrap_or(&default_tier_recipe);
    let compass_recipe = recipe.tiers.get(&Tier::Compass).unwrap_or(&default_tier_recipe);

    let wire_pool = by_tier.remove(&Tier::Wire).unwrap_or_default();
    let library_pool = by_tier.remove(&Tier::Library).unwrap_or_default();
    let scrapbook_pool = by_tier.remove(&Tier::Scrapbook).unwrap_or_default();
    let compass_pool = by_tier.remove(&Tier::Compass).unwrap_or_default();

    let freshness = compass_recipe.selection.freshness.clone().unwrap_or_default();

    let assembled = if recipe.uses_legacy_decay() {
        let wire = strategy::select_wire(wire_pool, wire_recipe, batch_size);
        let grounding = strategy::flatten_library_scrapbook_compass(
            library_pool,
            scrapbook_pool,
            compass_pool,
            library_recipe,
            scrapbook_recipe,
            compass_recipe,
            batch_size,
            session_seed,
            recently_shown,
            &freshness,
            now,
        );
        let algorithm = recipe.algorithm.as_ref().expect("uses_legacy_decay implies algorithm is set");
        let ratio = decay::ratio(algorithm, session_minutes);
        decay::interleave_by_ratio(wire, grounding, ratio)
    } else {
        let plan = slots::plan(recipe, batch_size);

        let library = strategy::select_library(
            library_pool,
            library_recipe,
            library_recipe.allocation.unwrap_or(0) as usize,
            session_seed,
        );
        let scrapbook = strategy::select_scrapbook(
            scrapbook_pool,
            scrapbook_recipe,
            scrapbook_recipe.allocation.unwrap_or(0) as usize,
            session_seed,
            recently_shown,
        );
        let compass = strategy::select_compass(
            compass_pool,
            compass_recipe,
            compass_recipe.allocation.unwrap_or(0) as usize,
            &freshness,
            now,
        );
        let grounding = interleave::flatten_grounding(compass, scrapbook, library);
        let grounding = grounding.into_iter().take(plan.grounding_slots).collect();

        let wire = strategy::select_wire(wire_pool, wire_recipe, plan.wire_slots);

        interleave::interleave(wire, grounding, plan)
    };

    let spaced = spacing::enforce(assembled, recipe);
    let has_more = pool_total > spaced.len();

    AssemblyOutput { items: spaced, has_more }
}
