//! Transaction retry wrapper
//!
//! Generic harness around one sale attempt. Failures are classified into two
//! families with distinct backoff strategies:
//!
//! - **Connection**: slot/pool waits and timeouts. Linear backoff,
//!   `min(attempt * step, cap)`.
//! - **Conflict**: serialization conflicts, deadlocks, closed transactions
//!   and unique-index collisions. Bounded exponential backoff with jitter,
//!   `delay in [min, min(max, min * 2^(attempt-1))]`.
//!
//! Domain errors propagate immediately without retry. Each attempt runs the
//! full unit of work from scratch; nothing externally visible survives a
//! failed attempt, so retries are safe even though the sequence counter was
//! touched (its increment rolls back with the transaction).

use crate::config::EngineConfig;
use crate::error::SaleError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry family of a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFamily {
    /// Unreachable server, pool/slot wait, operation timeout
    Connection,
    /// Serialization conflict, deadlock, closed transaction, unique collision
    Conflict,
}

/// Backoff knobs, lifted out of [`EngineConfig`] so the wrapper can be
/// exercised in isolation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_min: Duration,
    pub backoff_max: Duration,
    pub conn_step: Duration,
    pub conn_max: Duration,
}

impl From<&EngineConfig> for RetryPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_min: Duration::from_millis(config.backoff_min_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
            conn_step: Duration::from_millis(config.conn_backoff_step_ms),
            conn_max: Duration::from_millis(config.conn_backoff_max_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt. `attempt` is 1-based (the attempt that
    /// just failed).
    pub fn delay(&self, family: ErrorFamily, attempt: u32) -> Duration {
        match family {
            ErrorFamily::Connection => (self.conn_step * attempt).min(self.conn_max),
            ErrorFamily::Conflict => {
                let exp = self
                    .backoff_min
                    .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)));
                let cap = exp.min(self.backoff_max).max(self.backoff_min);
                let min_ms = self.backoff_min.as_millis() as u64;
                let cap_ms = cap.as_millis() as u64;
                let jittered = if cap_ms > min_ms {
                    rand::thread_rng().gen_range(min_ms..=cap_ms)
                } else {
                    min_ms
                };
                Duration::from_millis(jittered)
            }
        }
    }
}

/// Run `op` up to `max_retries` times, backing off between attempts.
///
/// `op` receives the 1-based attempt number and must rebuild its unit of
/// work from scratch on every call.
pub async fn run<T, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, SaleError>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T, SaleError>>,
{
    let attempts = policy.max_retries.max(1);
    let mut last_msg = String::new();

    for attempt in 1..=attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => match err.family() {
                Some(family) => {
                    last_msg = err.to_string();
                    if attempt == attempts {
                        break;
                    }
                    let delay = policy.delay(family, attempt);
                    warn!(
                        attempt,
                        family = ?family,
                        delay_ms = delay.as_millis() as u64,
                        error = %last_msg,
                        "sale attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                None => return Err(err),
            },
        }
    }

    Err(SaleError::RetriesExhausted {
        attempts,
        last: last_msg,
    })
}
