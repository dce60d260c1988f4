// Canonical data model shared across every component (spec §3).

pub mod item;
pub mod query;
pub mod recipe;

pub use item::{FeedItem, RawItem, Tier};
pub use query::QueryConfig;
pub use recipe::{
    DecayAlgorithm, ScrollRecipe, SelectionConfig, SortMode, SourceRecipe, SpacingConfig,
    SubsourceRecipe, TierRecipe,
};
