// Item Normalizer (spec §4.1) — maps raw adapter output to the canonical
// FeedItem shape. Pure, synchronous, no I/O.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::model::{FeedItem, QueryConfig, RawItem, Tier};

/// Produce a `FeedItem` from an adapter's raw output and its originating
/// `QueryConfig`, or `None` if the item is unsalvageable.
///
/// Rejects items lacking `id` or `title`. Defaults `priority` to
/// `config.priority` when the adapter didn't set one. Timestamps are
/// coerced to UTC via RFC3339 parsing; an unparseable timestamp becomes
/// `None`, and if the tier is `wire` the item is dropped entirely (wire
/// items must have a timestamp per the data model invariant).
pub fn normalize(raw: RawItem, config: &QueryConfig) -> Option<FeedItem> {
    let id = raw.id.filter(|s| !s.trim().is_empty())?;
    let title = raw.title.filter(|s| !s.trim().is_empty())?;

    let timestamp = raw.timestamp.as_deref().and_then(parse_timestamp);
    if config.tier == Tier::Wire && timestamp.is_none() {
        warn!(
            query = %config.name,
            item_id = %id,
            "dropping wire item with missing or unparseable timestamp"
        );
        return None;
    }

    let priority = raw.priority.unwrap_or(config.priority);
    if config.tier == Tier::Compass && priority < 0 {
        warn!(
            query = %config.name,
            item_id = %id,
            priority,
            "dropping compass item with negative priority"
        );
        return None;
    }

    Some(FeedItem {
        id: format!("{}:{}", config.type_, id),
        tier: config.tier,
        source: config.type_.clone(),
        subsource: raw.subsource.filter(|s| !s.is_empty()),
        title,
        body: raw.body,
        image_url: raw.image_url,
        link: raw.link,
        timestamp,
        priority,
        query_name: config.name.clone(),
        meta: raw.meta,
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(secs) = raw.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    None
}

/// Apply post-hoc subsource filtering for adapters that cannot honor
/// `config.params.subsourceFilter` themselves (spec §4.3 "subsource
/// filter pass-through"). Matches against the fields an adapter is known
/// to populate in `meta` (`subreddit`, `sourceId`, `feedTitle`,
/// `channelId`), matched verbatim per spec §9's resolved open question on
/// subsource identity normalization.
pub fn filter_by_subsource(items: Vec<FeedItem>, wanted: &[String]) -> Vec<FeedItem> {
    if wanted.is_empty() {
        return items;
    }
    const META_KEYS: [&str; 4] = ["subreddit", "sourceId", "feedTitle", "channelId"];
    items
        .into_iter()
        .filter(|item| {
            if let Some(sub) = &item.subsource {
                if wanted.iter().any(|w| w == sub) {
                    return true;
                }
            }
            META_KEYS
                .iter()
                .filter_map(|k| item.meta_str(k))
                .any(|v| wanted.iter().any(|w| w == v))
        })
        .collect()
}
