//! Bounded retry with a fixed delay and a per-attempt timeout.
//!
//! Navigation is the only retried operation. Every failure is treated as
//! transient: a page that failed to load may load on the next try, and the
//! attempt cap bounds the cost when it never does.

use std::future::Future;
use std::time::Duration;

use bizscrape_core::AppConfig;

use crate::error::ScraperError;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_DELAY_MS: u64 = 2_000;
const DEFAULT_ATTEMPT_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Always at least 1.
    pub max_attempts: u32,
    /// Fixed sleep between a failed attempt and the next one.
    pub delay: Duration,
    /// Upper bound on a single attempt. Expiry counts as a failed attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            attempt_timeout: Duration::from_millis(DEFAULT_ATTEMPT_TIMEOUT_MS),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_attempts: config.nav_max_attempts.max(1),
            delay: Duration::from_millis(config.nav_retry_delay_ms),
            attempt_timeout: Duration::from_millis(config.nav_timeout_ms),
        }
    }

    /// Longest a call under this policy can take when every attempt times
    /// out: all attempt timeouts plus the delays between them.
    #[must_use]
    pub fn worst_case(&self) -> Duration {
        let attempts = self.max_attempts.max(1);
        self.attempt_timeout
            .saturating_mul(attempts)
            .saturating_add(self.delay.saturating_mul(attempts - 1))
    }

    fn attempt_timeout_ms(&self) -> u64 {
        u64::try_from(self.attempt_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Runs `operation` until it succeeds or `policy.max_attempts` attempts have
/// failed, sleeping `policy.delay` between attempts.
///
/// Each attempt is bounded by `policy.attempt_timeout`; an attempt that does
/// not finish in time yields [`ScraperError::NavigationTimeout`] for `label`
/// and counts as a failure. After the last attempt the most recent error is
/// returned.
///
/// # Errors
///
/// Returns the last attempt's error once all attempts are exhausted.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        let err = match tokio::time::timeout(policy.attempt_timeout, operation()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) => err,
            Err(_elapsed) => ScraperError::NavigationTimeout {
                url: label.to_string(),
                timeout_ms: policy.attempt_timeout_ms(),
            },
        };

        if attempt >= max_attempts {
            tracing::warn!(
                target_label = label,
                attempt,
                max_attempts,
                error = %err,
                "giving up after final attempt"
            );
            return Err(err);
        }

        tracing::warn!(
            target_label = label,
            attempt,
            max_attempts,
            delay_ms = u64::try_from(policy.delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "attempt failed; retrying after delay"
        );
        tokio::time::sleep(policy.delay).await;
        attempt += 1;
    }
}
