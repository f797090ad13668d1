//! Exponential backoff for transient backend failures.

use std::future::Future;
use std::time::Duration;

use crate::error::BackendError;

/// How often and how patiently to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
///
/// The delay doubles after every failed attempt, capped at `max_delay`.
pub async fn retry<F, Fut, T>(policy: &RetryPolicy, operation: &str, mut op: F) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let mut delay = policy.base_delay;
    let mut attempt = 0u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_permanent() || attempt >= policy.max_retries => return Err(e),
            Err(e) => {
                attempt += 1;
                let wait = match &e {
                    BackendError::RateLimited { retry_after_ms } => {
                        Duration::from_millis(*retry_after_ms).min(policy.max_delay)
                    }
                    _ => delay,
                };
                tracing::warn!(
                    operation,
                    attempt,
                    max_retries = policy.max_retries,
                    "transient backend error: {e}; retrying in {wait:?}"
                );
                tokio::time::sleep(wait).await;
                delay = (delay * 2).min(policy.max_delay);
            }
        }
    }
}
