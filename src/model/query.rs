use serde::{Deserialize, Serialize};
use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;

use super::item::Tier;

/// One household source definition, one per file under the query
/// directory. `name` is derived from the filename by the loader, not
/// stored redundantly in the file itself (though a file may repeat it;
/// the loader's filename-derived value wins, see `recipe::loader`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub tier: Tier,
    #[serde(default)]
    pub priority: i64,
    pub limit: u32,
    #[serde(default)]
    pub params: JsonMap<String, JsonValue>,
}

impl QueryConfig {
    /// Field-level validation the core is responsible for. Adapters
    /// validate their own `params` — the core treats that map as opaque.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("query name must not be empty".into());
        }
        if self.type_.trim().is_empty() {
            return Err(format!("query '{}' is missing a type", self.name));
        }
        if self.limit == 0 {
            return Err(format!("query '{}' must have limit > 0", self.name));
        }
        Ok(())
    }

    /// `true` when the request wants this source's subresults restricted
    /// (spec §6.2 — "if `config.params.subsourceFilter` is present").
    pub fn subsource_filter(&self) -> Option<Vec<String>> {
        self.params.get("subsourceFilter").and_then(|v| {
            v.as_array().map(|arr| {
                arr.iter()
                    .filter_map(|e| e.as_str().map(str::to_string))
                    .collect()
            })
        })
    }
}
