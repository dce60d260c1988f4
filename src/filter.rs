// Filter Resolver (spec §4.5) — parses a compound filter expression and
// resolves it through a layered chain to a structured filter value.

use crate::model::{QueryConfig, Tier};
use crate::orchestrator::AdapterRegistry;

/// The outcome of resolving a filter expression. `None` means "no
/// filter; full mixed assembly" — the Filter Resolver never returns an
/// error, per spec §7 (`FilterUnresolved` is explicitly "not an error").
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedFilter {
    Tier { tier: Tier },
    Source { source_type: String, subsources: Vec<String> },
    Query { query_name: String },
}

impl ResolvedFilter {
    /// Whether a given `QueryConfig` should be fetched at all when this
    /// filter is active (spec §4.3: "fetch only matching configs").
    pub fn matches_config(&self, config: &QueryConfig) -> bool {
        match self {
            ResolvedFilter::Tier { tier } => config.tier == *tier,
            ResolvedFilter::Source { source_type, .. } => &config.type_ == source_type,
            ResolvedFilter::Query { query_name } => &config.name == query_name,
        }
    }

    /// Subsource restriction to pass through to the adapter / post-filter
    /// (spec §4.3), empty unless this is a `Source` filter with an
    /// explicit subsource list.
    pub fn subsources(&self) -> &[String] {
        match self {
            ResolvedFilter::Source { subsources, .. } => subsources,
            _ => &[],
        }
    }
}

/// Resolve a single expression string `prefix` or `prefix:rest` (comma
/// separated `rest`) through the ordered chain in spec §4.5:
///
/// 1. tier name
/// 2. adapter source type (with optional subsources)
/// 3. query config filename
/// 4. alias map, then restart from step 2
/// 5. otherwise `None`
pub fn resolve(
    expr: &str,
    registry: &AdapterRegistry,
    queries: &[QueryConfig],
    aliases: &std::collections::HashMap<String, String>,
) -> Option<ResolvedFilter> {
    resolve_inner(expr, registry, queries, aliases, true, false)
}

fn resolve_inner(
    expr: &str,
    registry: &AdapterRegistry,
    queries: &[QueryConfig],
    aliases: &std::collections::HashMap<String, String>,
    allow_alias: bool,
    skip_tier: bool,
) -> Option<ResolvedFilter> {
    let (prefix, rest) = match expr.split_once(':') {
        Some((p, r)) => (p, Some(r)),
        None => (expr, None),
    };

    // 1. tier name — skipped when re-entering after an alias substitution,
    // since an alias restarts resolution from step 2 onward.
    if !skip_tier {
        if let Some(tier) = Tier::parse(prefix) {
            return Some(ResolvedFilter::Tier { tier });
        }
    }

    // 2. adapter source type
    if registry.contains(prefix) {
        let subsources = rest
            .map(|r| r.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect())
            .unwrap_or_default();
        return Some(ResolvedFilter::Source {
            source_type: prefix.to_string(),
            subsources,
        });
    }

    // 3. query config filename
    if queries.iter().any(|q| q.name == prefix) {
        return Some(ResolvedFilter::Query {
            query_name: prefix.to_string(),
        });
    }

    // 4. alias map, restart from step 2 (not step 1 — a tier name is not
    // re-checked for the alias target).
    if allow_alias {
        if let Some(target) = aliases.get(prefix) {
            let rebuilt = match rest {
                Some(r) => format!("{target}:{r}"),
                None => target.clone(),
            };
            return resolve_inner(&rebuilt, registry, queries, aliases, false, true);
        }
    }

    // 5. unresolved — treated as "no filter", not an error.
    None
}
