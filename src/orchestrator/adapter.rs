// Adapter interface (spec §6.2, §9 "duck-typed adapter lookup" redesign).
//
// Every source adapter implements one method, plus an explicit,
// flag-based capability check replacing the original's
// `typeof adapter.resolveSiblings === 'function'` duck typing.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::model::{QueryConfig, RawItem};

/// Explicit adapter capabilities, checked with `Adapter::supports` instead
/// of probing for method presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Can restrict its own result set to `config.params.subsourceFilter`
    /// without the Normalizer having to post-filter.
    SubsourceFilter,
    /// Has upstream read/dismissal state (e.g. FreshRSS) and implements
    /// `mark_read`.
    MarkRead,
}

/// Per-fetch context handed to every adapter: cancellation plus whatever
/// ambient data the worker needs to log usefully.
pub struct FetchContext {
    pub cancellation: CancellationToken,
}

impl FetchContext {
    pub fn new(cancellation: CancellationToken) -> Self {
        Self { cancellation }
    }

    pub fn child() -> (Self, CancellationToken) {
        let token = CancellationToken::new();
        (Self::new(token.clone()), token)
    }
}

/// The pluggable adapter interface. Real network clients (reddit,
/// youtube, komga, ...) are out of scope for this crate — they are
/// external collaborators behind this trait.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch_items(&self, ctx: &FetchContext, config: &QueryConfig) -> Result<Vec<RawItem>>;

    /// Default: supports nothing extra. Adapters opt in explicitly.
    fn supports(&self, _capability: Capability) -> bool {
        false
    }

    /// For sources with upstream read state, mark ids as read instead of
    /// routing them through the Dismissed-Items Store (spec §4.6
    /// "Dismiss" partitioning).
    async fn mark_read(&self, _local_ids: &[String]) -> Result<()> {
        Ok(())
    }
}
