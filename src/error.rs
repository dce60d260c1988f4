use thiserror::Error;

/// Unified error type for the feed engine.
///
/// Most of these are absorbed before they ever reach a caller — see
/// `FeedError::is_surfaced()` and the propagation policy described in the
/// orchestrator and pool manager modules. Only a handful of variants ever
/// become a non-2xx HTTP response.
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    #[error("config invalid: {0}")]
    ConfigInvalid(String),

    #[error("adapter failure in source {source_type}: {message}")]
    AdapterFailure { source_type: String, message: String },

    #[error("adapter timeout in source {source_type} after {elapsed_ms}ms")]
    AdapterTimeout { source_type: String, elapsed_ms: u64 },

    #[error("filter expression unresolved: {0}")]
    FilterUnresolved(String),

    #[error("pool exhausted")]
    PoolExhausted,

    #[error("persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl FeedError {
    /// Whether this error kind should ever be turned into a non-2xx HTTP
    /// response. Everything else degrades to partial results + warnings,
    /// per the propagation policy in spec §7.
    pub fn is_surfaced(&self) -> bool {
        matches!(
            self,
            FeedError::ConfigInvalid(_)
                | FeedError::InvalidRequest(_)
                | FeedError::Cancelled
                | FeedError::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
