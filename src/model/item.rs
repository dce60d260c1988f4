use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Map as JsonMap;
use serde_json::Value as JsonValue;

/// Classification used for interleaving. Order here is meaningful only in
/// that it matches the spec's enumeration; sort order within a tier is
/// decided by the assembly strategies, not by this enum's declaration
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Wire,
    Library,
    Scrapbook,
    Compass,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Wire, Tier::Library, Tier::Scrapbook, Tier::Compass];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Wire => "wire",
            Tier::Library => "library",
            Tier::Scrapbook => "scrapbook",
            Tier::Compass => "compass",
        }
    }

    pub fn parse(s: &str) -> Option<Tier> {
        match s {
            "wire" => Some(Tier::Wire),
            "library" => Some(Tier::Library),
            "scrapbook" => Some(Tier::Scrapbook),
            "compass" => Some(Tier::Compass),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The canonical unit crossing all tier and source boundaries.
///
/// # Invariants
///
/// - `id` is unique within a single pool batch.
/// - `tier == Tier::Wire` implies `timestamp.is_some()`.
/// - `tier == Tier::Compass` implies `priority >= 0`.
/// - `source` is non-empty.
///
/// These invariants are established by the normalizer (`crate::normalizer`)
/// on construction, not re-checked on every read — callers downstream of
/// the normalizer may rely on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedItem {
    pub id: String,
    pub tier: Tier,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsource: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "imageURL")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: i64,
    #[serde(rename = "queryName")]
    pub query_name: String,
    #[serde(default)]
    pub meta: JsonMap<String, JsonValue>,
}

impl FeedItem {
    /// Read a string field out of `meta`, used by subsource post-filtering
    /// (spec §4.3) when an adapter cannot honor a subsource filter itself.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(|v| v.as_str())
    }

    /// `meta["yearsAgo"]`, used by the scrapbook anniversary tiebreak.
    pub fn years_ago(&self) -> Option<i64> {
        self.meta.get("yearsAgo").and_then(|v| v.as_i64())
    }
}

/// Raw, semi-shaped output from an adapter, before normalization. Adapters
/// populate whatever fields they can; the normalizer fills in the rest
/// from the producing `QueryConfig` and drops anything unsalvageable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawItem {
    pub id: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub subsource: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, rename = "imageURL")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    /// Raw timestamp string; coercion to UTC happens in the normalizer.
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub meta: JsonMap<String, JsonValue>,
}
