// End-to-end scenarios from spec §8, driven through the public
// `PoolManager` API rather than any single component in isolation.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{build_harness, compass_items, wire_items, FixedAdapter, MarkReadAdapter, SlowAdapter};
use daylight_feed::orchestrator::AdapterRegistry;

#[tokio::test]
async fn plain_mixed_batch_is_all_wire_when_no_allocation_is_set() {
    let mut registry = AdapterRegistry::new();
    registry.register("reddit", Arc::new(FixedAdapter { items: wire_items("reddit", 10, 1_770_000_000) }));
    registry.register("rss", Arc::new(FixedAdapter { items: wire_items("rss", 10, 1_770_000_000) }));
    registry.register("youtube", Arc::new(FixedAdapter { items: wire_items("youtube", 10, 1_770_000_000) }));
    registry.register("photos", Arc::new(FixedAdapter { items: compass_items("photos", 2, 1) }));

    let harness = build_harness(registry, None);
    harness.write_query("reddit_news.yaml", "type: reddit\ntier: wire\nlimit: 10\n");
    harness.write_query("rss_news.yaml", "type: rss\ntier: wire\nlimit: 10\n");
    harness.write_query("yt_news.yaml", "type: youtube\ntier: wire\nlimit: 10\n");
    harness.write_query("photos.yaml", "type: photos\ntier: compass\nlimit: 2\n");

    let batch = harness.get_batch("2026-07-28T00:00:00Z", Some(10), None, None).await;
    assert_eq!(batch.items.len(), 10);
    assert!(batch.items.iter().all(|i| i.tier == daylight_feed::model::Tier::Wire));
}

#[tokio::test]
async fn tier_allocation_splits_batch_across_wire_and_grounding() {
    let mut registry = AdapterRegistry::new();
    registry.register("reddit", Arc::new(FixedAdapter { items: wire_items("reddit", 10, 1_770_000_000) }));
    registry.register("rss", Arc::new(FixedAdapter { items: wire_items("rss", 10, 1_770_000_000) }));
    registry.register("youtube", Arc::new(FixedAdapter { items: wire_items("youtube", 10, 1_770_000_000) }));
    registry.register("photos", Arc::new(FixedAdapter { items: compass_items("photos", 5, 1) }));
    registry.register("gratitude", Arc::new(FixedAdapter { items: compass_items("gratitude", 5, 0) }));

    let recipe = r#"
tiers:
  compass:
    allocation: 2
    selection:
      sort: priority
    sources:
      photos: {}
  scrapbook:
    allocation: 1
    selection:
      sort: random
    sources:
      gratitude: {}
"#;
    let harness = build_harness(registry, Some(recipe));
    harness.write_query("reddit_news.yaml", "type: reddit\ntier: wire\nlimit: 10\n");
    harness.write_query("rss_news.yaml", "type: rss\ntier: wire\nlimit: 10\n");
    harness.write_query("yt_news.yaml", "type: youtube\ntier: wire\nlimit: 10\n");
    harness.write_query("photos.yaml", "type: photos\ntier: compass\nlimit: 5\n");
    harness.write_query("gratitude.yaml", "type: gratitude\ntier: scrapbook\nlimit: 5\n");

    let batch = harness.get_batch("2026-07-28T00:00:00Z", Some(10), None, None).await;
    assert_eq!(batch.items.len(), 10);

    let wire_count = batch.items.iter().filter(|i| i.tier == daylight_feed::model::Tier::Wire).count();
    let compass_count = batch.items.iter().filter(|i| i.tier == daylight_feed::model::Tier::Compass).count();
    let scrapbook_count = batch.items.iter().filter(|i| i.tier == daylight_feed::model::Tier::Scrapbook).count();
    assert_eq!(wire_count, 7);
    assert_eq!(compass_count, 2);
    assert_eq!(scrapbook_count, 1);
}

#[tokio::test]
async fn filter_by_tier_bypasses_assembly_and_orders_by_priority() {
    let mut registry = AdapterRegistry::new();
    registry.register("photos", Arc::new(FixedAdapter { items: compass_items("photos", 3, 1) }));
    registry.register("reddit", Arc::new(FixedAdapter { items: wire_items("reddit", 10, 1_770_000_000) }));

    let harness = build_harness(registry, None);
    harness.write_query("photos.yaml", "type: photos\ntier: compass\npriority: 5\nlimit: 3\n");
    harness.write_query("reddit_news.yaml", "type: reddit\ntier: wire\nlimit: 10\n");

    let batch = harness.get_batch("2026-07-28T00:00:00Z", Some(5), None, Some("compass")).await;
    assert!(batch.items.iter().all(|i| i.tier == daylight_feed::model::Tier::Compass));
    assert_eq!(batch.items.len(), 3);
}

#[tokio::test]
async fn filter_by_source_with_subsources_bypasses_assembly_and_sorts_wire_desc() {
    let mut registry = AdapterRegistry::new();
    let mut items = wire_items("reddit", 4, 1_770_000_000);
    items[0].subsource = Some("worldnews".to_string());
    items[1].subsource = Some("usnews".to_string());
    items[2].subsource = Some("funny".to_string());
    items[3].subsource = Some("worldnews".to_string());
    registry.register("reddit", Arc::new(FixedAdapter { items }));

    let harness = build_harness(registry, None);
    harness.write_query("reddit_news.yaml", "type: reddit\ntier: wire\nlimit: 10\n");

    let batch = harness
        .get_batch("2026-07-28T00:00:00Z", Some(5), None, Some("reddit:worldnews,usnews"))
        .await;
    assert_eq!(batch.items.len(), 3);
    assert!(batch
        .items
        .iter()
        .all(|i| i.subsource.as_deref() == Some("worldnews") || i.subsource.as_deref() == Some("usnews")));
    for pair in batch.items.windows(2) {
        assert!(pair[0].timestamp >= pair[1].timestamp);
    }
}

#[tokio::test]
async fn adapter_timeout_isolates_failed_source() {
    let mut registry = AdapterRegistry::new();
    registry.register("reddit", Arc::new(FixedAdapter { items: wire_items("reddit", 3, 1_770_000_000) }));
    registry.register("rss", Arc::new(FixedAdapter { items: wire_items("rss", 3, 1_770_000_000) }));
    registry.register("slow", Arc::new(SlowAdapter { delay: Duration::from_secs(10) }));

    let harness = build_harness(registry, None);
    harness.write_query("reddit_news.yaml", "type: reddit\ntier: wire\nlimit: 3\n");
    harness.write_query("rss_news.yaml", "type: rss\ntier: wire\nlimit: 3\n");
    harness.write_query("slow_source.yaml", "type: slow\ntier: wire\nlimit: 3\n");

    let batch = harness.get_batch("2026-07-28T00:00:00Z", Some(10), None, None).await;
    assert_eq!(batch.items.len(), 6);
    assert!(batch.items.iter().all(|i| i.source == "reddit" || i.source == "rss"));
}

#[tokio::test]
async fn under_delivery_returns_shorter_batch_with_has_more_false() {
    let mut registry = AdapterRegistry::new();
    registry.register("reddit", Arc::new(FixedAdapter { items: wire_items("reddit", 4, 1_770_000_000) }));

    let harness = build_harness(registry, None);
    harness.write_query("reddit_news.yaml", "type: reddit\ntier: wire\nlimit: 4\n");

    let batch = harness.get_batch("2026-07-28T00:00:00Z", Some(10), None, None).await;
    assert_eq!(batch.items.len(), 4);
    assert!(!batch.has_more);
}

#[tokio::test]
async fn dismissal_survives_pagination() {
    let mut registry = AdapterRegistry::new();
    registry.register("reddit", Arc::new(FixedAdapter { items: wire_items("reddit", 5, 1_770_000_000) }));

    let harness = build_harness(registry, None);
    harness.write_query("reddit_news.yaml", "type: reddit\ntier: wire\nlimit: 5\n");

    let first = harness.get_batch("2026-07-28T00:00:00Z", Some(5), None, None).await;
    assert_eq!(first.items.len(), 5);
    harness.manager.dismiss(vec!["reddit:reddit-0".to_string()]).await.unwrap();

    let second = harness.get_batch("2026-07-28T00:00:00Z", Some(5), Some(first.next_cursor), None).await;
    assert!(second.items.iter().all(|i| i.id != "reddit:reddit-0"));
}

#[tokio::test]
async fn decay_mode_interleaves_wire_and_grounding_at_the_configured_ratio() {
    let mut registry = AdapterRegistry::new();
    registry.register("reddit", Arc::new(FixedAdapter { items: wire_items("reddit", 20, 1_770_000_000) }));
    registry.register("rss", Arc::new(FixedAdapter { items: wire_items("rss", 20, 1_770_000_000) }));
    registry.register("photos", Arc::new(FixedAdapter { items: compass_items("photos", 10, 1) }));

    let recipe = r#"
algorithm:
  grounding_ratio: 5.0
  decay_rate: 0.85
  min_ratio: 2.0
"#;
    let harness = build_harness(registry, Some(recipe));
    harness.write_query("reddit_news.yaml", "type: reddit\ntier: wire\nlimit: 20\n");
    harness.write_query("rss_news.yaml", "type: rss\ntier: wire\nlimit: 20\n");
    harness.write_query("photos.yaml", "type: photos\ntier: compass\nlimit: 10\n");

    let batch = harness.get_batch("2026-07-28T00:00:00Z", Some(15), None, None).await;
    assert!(!batch.items.is_empty());
    let grounding_present = batch.items.iter().any(|i| i.tier == daylight_feed::model::Tier::Compass);
    assert!(grounding_present, "decay mode should interleave at least one grounding item into a 15-item batch");
}

#[tokio::test]
async fn pagination_never_repeats_an_already_served_item() {
    let mut registry = AdapterRegistry::new();
    registry.register("reddit", Arc::new(FixedAdapter { items: wire_items("reddit", 10, 1_770_000_000) }));
    registry.register("rss", Arc::new(FixedAdapter { items: wire_items("rss", 10, 1_770_000_000) }));
    registry.register("youtube", Arc::new(FixedAdapter { items: wire_items("youtube", 10, 1_770_000_000) }));

    let harness = build_harness(registry, None);
    harness.write_query("reddit_news.yaml", "type: reddit\ntier: wire\nlimit: 10\n");
    harness.write_query("rss_news.yaml", "type: rss\ntier: wire\nlimit: 10\n");
    harness.write_query("yt_news.yaml", "type: youtube\ntier: wire\nlimit: 10\n");

    let first = harness.get_batch("2026-07-28T00:00:00Z", Some(10), None, None).await;
    assert_eq!(first.items.len(), 10);
    assert!(first.has_more);

    let second = harness.get_batch("2026-07-28T00:00:00Z", Some(10), Some(first.next_cursor), None).await;
    assert_eq!(second.items.len(), 10);

    let first_ids: std::collections::HashSet<_> = first.items.iter().map(|i| i.id.clone()).collect();
    assert!(second.items.iter().all(|i| !first_ids.contains(&i.id)), "page 2 repeated an item already served on page 1");
}

#[tokio::test]
async fn filtered_pagination_never_repeats_an_already_served_item() {
    let mut registry = AdapterRegistry::new();
    registry.register("photos", Arc::new(FixedAdapter { items: compass_items("photos", 6, 1) }));
    registry.register("reddit", Arc::new(FixedAdapter { items: wire_items("reddit", 10, 1_770_000_000) }));

    let harness = build_harness(registry, None);
    harness.write_query("photos.yaml", "type: photos\ntier: compass\nlimit: 6\n");
    harness.write_query("reddit_news.yaml", "type: reddit\ntier: wire\nlimit: 10\n");

    let first = harness.get_batch("2026-07-28T00:00:00Z", Some(4), None, Some("compass")).await;
    assert_eq!(first.items.len(), 4);
    assert!(first.has_more);

    let second = harness.get_batch("2026-07-28T00:00:00Z", Some(4), Some(first.next_cursor), Some("compass")).await;
    assert_eq!(second.items.len(), 2);
    assert!(!second.has_more);

    let first_ids: std::collections::HashSet<_> = first.items.iter().map(|i| i.id.clone()).collect();
    assert!(second.items.iter().all(|i| !first_ids.contains(&i.id)));
}

#[tokio::test]
async fn dismiss_routes_ids_to_mark_read_adapter_instead_of_the_dismissed_store() {
    let marked = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut registry = AdapterRegistry::new();
    registry.register("freshrss", Arc::new(MarkReadAdapter { items: wire_items("freshrss", 3, 1_770_000_000), marked: marked.clone() }));

    let harness = build_harness(registry, None);
    harness.write_query("freshrss_news.yaml", "type: freshrss\ntier: wire\nlimit: 3\n");

    // Filtered by source so this goes through `bypass_assembly` rather
    // than the Tier Assembly Engine's spacing passes, which would
    // otherwise thin out a batch built from a single source.
    let first = harness.get_batch("2026-07-28T00:00:00Z", Some(3), None, Some("freshrss")).await;
    assert_eq!(first.items.len(), 3);

    let outcome = harness.manager.dismiss(vec!["freshrss:freshrss-0".to_string(), "freshrss:freshrss-1".to_string()]).await.unwrap();
    assert_eq!(outcome.dismissed, 2);
    assert_eq!(*marked.lock().unwrap(), vec!["freshrss-0".to_string(), "freshrss-1".to_string()]);

    let dismissed_path = harness.dir.path().join("dismissed.json");
    let stored: serde_json::Map<String, serde_json::Value> = match std::fs::read_to_string(&dismissed_path) {
        Ok(body) => serde_json::from_str(&body).unwrap(),
        Err(_) => serde_json::Map::new(),
    };
    assert!(stored.is_empty(), "mark_read-routed ids must not be written to the Dismissed-Items Store");
}
