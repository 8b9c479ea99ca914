//! Engine configuration
//!
//! All knobs can be overridden through environment variables:
//!
//! | Environment variable | Default | Description |
//! |----------------------|---------|-------------|
//! | DEFAULT_MULTIPLIER | 70.0 | Payout multiplier when no record configures one |
//! | MAX_SALE_RETRIES | 3 | Retry budget for transient transaction failures |
//! | RETRY_BACKOFF_MIN_MS | 150 | Lower bound for conflict backoff |
//! | RETRY_BACKOFF_MAX_MS | 2000 | Upper bound for conflict backoff |
//! | CONN_BACKOFF_STEP_MS | 500 | Linear step for connection-family backoff |
//! | CONN_BACKOFF_MAX_MS | 1500 | Cap for connection-family backoff |
//! | TXN_SLOT_TIMEOUT_MS | 10000 | Wait for a transaction slot |
//! | TXN_TIMEOUT_MS | 20000 | Total time budget for one sale attempt |
//! | MAX_CONCURRENT_SALES | 64 | Transaction slots |
//! | DEFAULT_CUTOFF_MINUTES | 5 | Cutoff when no entity configures one |
//! | CUTOFF_GRACE_SECS | 30 | Grace period added to the cutoff check |
//! | RULE_CACHE_TTL_MS | 5000 | TTL for cached rule/policy documents (0 disables) |

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Process-wide fallback payout multiplier (last step of the chain)
    pub default_multiplier: f64,
    /// Retry budget for transient transaction failures
    pub max_retries: u32,
    /// Lower bound for conflict-family exponential backoff (ms)
    pub backoff_min_ms: u64,
    /// Upper bound for conflict-family exponential backoff (ms)
    pub backoff_max_ms: u64,
    /// Linear step for connection-family backoff (ms)
    pub conn_backoff_step_ms: u64,
    /// Cap for connection-family backoff (ms)
    pub conn_backoff_max_ms: u64,
    /// Wait for a transaction slot before the attempt counts as busy (ms)
    pub txn_slot_timeout_ms: u64,
    /// Total time budget for one sale attempt (ms)
    pub txn_timeout_ms: u64,
    /// Concurrent sale transactions allowed through the engine
    pub max_concurrent_sales: usize,
    /// Cutoff minutes before draw close when no entity configures one
    pub default_cutoff_minutes: u32,
    /// Grace period added on top of the cutoff check (seconds)
    pub cutoff_grace_secs: u32,
    /// TTL for cached restriction rules and commission policies (0 disables)
    pub rule_cache_ttl_ms: u64,
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            default_multiplier: env_parse("DEFAULT_MULTIPLIER", 70.0),
            max_retries: env_parse("MAX_SALE_RETRIES", 3),
            backoff_min_ms: env_parse("RETRY_BACKOFF_MIN_MS", 150),
            backoff_max_ms: env_parse("RETRY_BACKOFF_MAX_MS", 2000),
            conn_backoff_step_ms: env_parse("CONN_BACKOFF_STEP_MS", 500),
            conn_backoff_max_ms: env_parse("CONN_BACKOFF_MAX_MS", 1500),
            txn_slot_timeout_ms: env_parse("TXN_SLOT_TIMEOUT_MS", 10_000),
            txn_timeout_ms: env_parse("TXN_TIMEOUT_MS", 20_000),
            max_concurrent_sales: env_parse("MAX_CONCURRENT_SALES", 64),
            default_cutoff_minutes: env_parse("DEFAULT_CUTOFF_MINUTES", 5),
            cutoff_grace_secs: env_parse("CUTOFF_GRACE_SECS", 30),
            rule_cache_ttl_ms: env_parse("RULE_CACHE_TTL_MS", 5000),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_multiplier: 70.0,
            max_retries: 3,
            backoff_min_ms: 150,
            backoff_max_ms: 2000,
            conn_backoff_step_ms: 500,
            conn_backoff_max_ms: 1500,
            txn_slot_timeout_ms: 10_000,
            txn_timeout_ms: 20_000,
            max_concurrent_sales: 64,
            default_cutoff_minutes: 5,
            cutoff_grace_secs: 30,
            rule_cache_ttl_ms: 5000,
        }
    }
}
