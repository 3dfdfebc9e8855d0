//! Retry-with-backoff wrapper for outbound provider calls.
//!
//! Both the embedding and completion providers go through
//! [`call_with_retry`], so the retry discipline lives in one place.
//! Transient failure classes wait before the next attempt — rate
//! limits back off linearly, timeouts and connection failures use a
//! small fixed delay — while non-transient failures propagate
//! immediately. After the final attempt the error is surfaced with its
//! class intact so callers can report it specifically.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::{Error, Result};

/// Backoff policy for one remote call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first. A value of 3 means at most
    /// 2 waits: the final attempt fails without waiting.
    pub max_retries: u32,
    /// Linear step for rate-limit backoff: attempt `n` waits `n`
    /// steps before attempt `n + 1`.
    pub rate_limit_backoff: Duration,
    /// Fixed delay after a timeout or connection failure.
    pub transient_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            rate_limit_backoff: Duration::from_secs(2),
            transient_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            rate_limit_backoff: Duration::from_secs(config.rate_limit_backoff_secs),
            transient_delay: Duration::from_secs(config.transient_delay_secs),
        }
    }

    /// Wait duration before the attempt after `attempt` (1-based), or
    /// `None` when the error class is not retryable.
    pub fn delay_for(&self, error: &Error, attempt: u32) -> Option<Duration> {
        match error {
            Error::RateLimited(_) => Some(self.rate_limit_backoff * attempt),
            Error::Timeout(_) | Error::ConnectionFailed(_) => Some(self.transient_delay),
            _ => None,
        }
    }
}

/// Run `operation` up to `policy.max_retries` times.
///
/// `what` names the call in retry warnings (e.g. "embedding request").
/// There is no cancellation primitive here; a caller wanting to abandon
/// a long retry sequence must wrap the whole call in a deadline.
pub async fn call_with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    what: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = policy
                    .delay_for(&e, attempt)
                    .unwrap_or(policy.transient_delay);
                eprintln!(
                    "Warning: {} attempt {}/{} failed ({}); retrying in {:.1}s",
                    what,
                    attempt,
                    policy.max_retries,
                    e,
                    delay.as_secs_f64()
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
