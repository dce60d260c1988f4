use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::item::Tier;

/// Sort strategy for a tier's selection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    TimestampDesc,
    Random,
    Priority,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubsourceRecipe {
    #[serde(default)]
    pub max_per_batch: Option<u32>,
    #[serde(default)]
    pub min_spacing: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceRecipe {
    #[serde(default)]
    pub max_per_batch: Option<u32>,
    #[serde(default)]
    pub min_spacing: Option<u32>,
    #[serde(default)]
    pub subsources: HashMap<String, SubsourceRecipe>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub sort: SortMode,
    #[serde(default)]
    pub filters: Vec<String>,
    /// Scrapbook-only: size of the recently-shown dedup window, expressed
    /// as a multiple of `batchSize`. Defaults to 3 per spec §4.7.2.
    #[serde(default)]
    pub diversity: Option<bool>,
    /// Compass-only: per-source freshness window in seconds.
    #[serde(default)]
    pub freshness: Option<HashMap<String, u64>>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            sort: SortMode::TimestampDesc,
            filters: Vec::new(),
            diversity: None,
            freshness: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierRecipe {
    /// Fixed slot count for non-wire tiers; absent means "no explicit
    /// allocation", which matters for the legacy decay-mode fallback.
    #[serde(default)]
    pub allocation: Option<u32>,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub sources: HashMap<String, SourceRecipe>,
}

impl Default for TierRecipe {
    fn default() -> Self {
        Self {
            allocation: None,
            selection: SelectionConfig::default(),
            sources: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacingConfig {
    #[serde(default = "default_max_consecutive")]
    pub max_consecutive: u32,
}

fn default_max_consecutive() -> u32 {
    1
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            max_consecutive: default_max_consecutive(),
        }
    }
}

/// Legacy decay-mode knobs (spec §4.7.5), used only when no tier defines
/// an explicit `allocation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecayAlgorithm {
    pub grounding_ratio: f64,
    pub decay_rate: f64,
    pub min_ratio: f64,
}

/// Per-user algorithm knobs. Defaults are filled in by
/// `recipe::loader::RecipeStore` atop baked-in defaults, not by this
/// struct's own `Default` impl (which is intentionally minimal — a recipe
/// loaded from an empty file should still merge sane tier/spacing
/// defaults, which requires knowledge the loader has and this type
/// shouldn't need to duplicate).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollRecipe {
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub tiers: HashMap<Tier, TierRecipe>,
    #[serde(default)]
    pub spacing: SpacingConfig,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    #[serde(default)]
    pub algorithm: Option<DecayAlgorithm>,
}

impl Default for ScrollRecipe {
    fn default() -> Self {
        Self {
            batch_size: None,
            tiers: HashMap::new(),
            spacing: SpacingConfig::default(),
            aliases: HashMap::new(),
            algorithm: None,
        }
    }
}

impl ScrollRecipe {
    /// Sum of non-wire tier allocations, used to compute `wireSlots`
    /// (spec §4.7.1). Tiers with no explicit allocation contribute 0.
    pub fn grounding_allocation(&self) -> u32 {
        [Tier::Library, Tier::Scrapbook, Tier::Compass]
            .iter()
            .filter_map(|t| self.tiers.get(t))
            .filter_map(|r| r.allocation)
            .sum()
    }

    /// `true` when no tier has an explicit allocation but legacy decay
    /// knobs are present — the trigger for spec §4.7.5's fallback mode.
    pub fn uses_legacy_decay(&self) -> bool {
        self.grounding_allocation() == 0 && self.algorithm.is_some()
    }
}
