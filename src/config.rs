// Environment-driven knobs for the engine. See spec §6.4.

use std::time::Duration;

/// Tunables that apply across all sessions and requests. Loaded once at
/// startup and shared behind an `Arc` in `AppState`.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Used when a recipe omits `batchSize`.
    pub default_batch_size: usize,
    /// Idle TTL for a `PoolState` before it is dropped.
    pub session_ttl: Duration,
    /// Cap on parallel source workers per request.
    pub max_adapter_concurrency: usize,
    /// Per-adapter fallback timeout when a source type has no override.
    pub default_adapter_timeout: Duration,
    /// Dismissed-record retention window.
    pub dismissed_retention: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_batch_size: 25,
            session_ttl: Duration::from_secs(2 * 60 * 60),
            max_adapter_concurrency: 16,
            default_adapter_timeout: Duration::from_secs(5),
            dismissed_retention: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

impl EngineConfig {
    /// Build a config from environment variables, falling back to
    /// `Default` for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_batch_size: env_usize("DEFAULT_BATCH_SIZE", defaults.default_batch_size),
            session_ttl: Duration::from_secs(env_u64(
                "SESSION_TTL_SECONDS",
                defaults.session_ttl.as_secs(),
            )),
            max_adapter_concurrency: env_usize(
                "MAX_ADAPTER_CONCURRENCY",
                defaults.max_adapter_concurrency,
            ),
            default_adapter_timeout: Duration::from_millis(env_u64(
                "DEFAULT_ADAPTER_TIMEOUT_MS",
                defaults.default_adapter_timeout.as_millis() as u64,
            )),
            dismissed_retention: Duration::from_secs(
                env_u64("DISMISSED_RETENTION_DAYS", defaults.dismissed_retention.as_secs() / 86_400)
                    * 86_400,
            ),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
