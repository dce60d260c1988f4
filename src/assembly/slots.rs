// Slot allocation (spec §4.7.1).

use crate::model::ScrollRecipe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPlan {
    pub batch_size: usize,
    pub grounding_slots: usize,
    pub wire_slots: usize,
}

/// `groundingSlots = sum of tiers.{library, scrapbook, compass}.allocation`,
/// clamped so it never exceeds `batchSize`; `wireSlots = batchSize -
/// groundingSlots`. At `groundingSlots == batchSize` wire gets nothing
/// (spec's `batchSize=1, groundingAllocation=1` boundary case).
pub fn plan(recipe: &ScrollRecipe, batch_size: usize) -> SlotPlan {
    let raw_grounding = recipe.grounding_allocation() as usize;
    let grounding_slots = raw_grounding.min(batch_size);
    let wire_slots = batch_size - grounding_slots;
    SlotPlan { batch_size, grounding_slots, wire_slots }
}
