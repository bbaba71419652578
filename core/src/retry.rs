//! Backoff policy for transient failures.
//!
//! Used by the liveboard subscriber between reconnect attempts and by the
//! match clock when a publish fails. The gate validator deliberately does
//! **not** auto-retry: a system error there is surfaced to the operator,
//! who decides whether to re-present the ticket.
//!
//! # Example
//!
//! ```rust
//! use matchday_core::retry::{BackoffPolicy, retry_transient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), String> {
//! let policy = BackoffPolicy::builder()
//!     .max_attempts(4)
//!     .base_delay(Duration::from_millis(200))
//!     .cap(Duration::from_secs(5))
//!     .build();
//!
//! let value = retry_transient(&policy, || async { Ok::<_, String>(7) }, |_| true).await?;
//! assert_eq!(value, 7);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Exponential backoff configuration.
///
/// Delay for attempt `n` is `base_delay * 2^n`, capped at `cap`.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Total attempts before giving up (the first attempt counts)
    pub max_attempts: usize,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Upper bound on any single delay
    pub cap: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(250),
            cap: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Start building a policy from the defaults.
    #[must_use]
    pub fn builder() -> BackoffPolicyBuilder {
        BackoffPolicyBuilder(Self::default())
    }

    /// The delay to sleep after failed attempt number `attempt` (0-based).
    #[must_use]
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let exp = u32::try_from(attempt).unwrap_or(u32::MAX);
        let delay = self
            .base_delay
            .checked_mul(2_u32.saturating_pow(exp))
            .unwrap_or(self.cap);
        delay.min(self.cap)
    }
}

/// Builder for [`BackoffPolicy`].
#[derive(Debug, Clone)]
pub struct BackoffPolicyBuilder(BackoffPolicy);

impl BackoffPolicyBuilder {
    /// Set the total number of attempts.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: usize) -> Self {
        self.0.max_attempts = attempts;
        self
    }

    /// Set the delay before the first retry.
    #[must_use]
    pub const fn base_delay(mut self, delay: Duration) -> Self {
        self.0.base_delay = delay;
        self
    }

    /// Set the upper bound on any single delay.
    #[must_use]
    pub const fn cap(mut self, cap: Duration) -> Self {
        self.0.cap = cap;
        self
    }

    /// Finish the policy.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // destructuring self is not const
    pub fn build(self) -> BackoffPolicy {
        self.0
    }
}

/// Retry an async operation, backing off between attempts.
///
/// `is_transient` decides whether a given error is worth retrying; a
/// non-transient error is returned immediately.
///
/// # Errors
///
/// Returns the last error once attempts are exhausted, or the first
/// non-transient error encountered.
pub async fn retry_transient<F, Fut, T, E, P>(
    policy: &BackoffPolicy,
    mut operation: F,
    is_transient: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    tracing::info!(attempt, "operation recovered after retry");
                }
                return Ok(value);
            }
            Err(err) if !is_transient(&err) => {
                tracing::warn!(error = %err, "non-transient error, not retrying");
                return Err(err);
            }
            Err(err) => {
                attempt += 1;
                if attempt >= policy.max_attempts {
                    tracing::error!(attempt, error = %err, "retries exhausted");
                    return Err(err);
                }
                let delay = policy.delay_after(attempt - 1);
                tracing::warn!(
                    attempt,
                    delay_ms = delay.as_millis(),
                    error = %err,
                    "transient failure, backing off"
                );
                sleep(delay).await;
            }
        }
    }
}
