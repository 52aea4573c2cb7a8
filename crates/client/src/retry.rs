//! Retry operations with exponential backoff.
//!
//! Provides a generic retry mechanism for transient failures in network
//! operations:
//!
//! - [`compute_delay`] - pure jittered exponential backoff calculation
//! - [`RetryPolicy`] - an explicit, shareable retry-eligibility predicate
//! - [`RetryOptions`] - attempt cap, delays, jitter toggle, error hook
//! - [`with_retry`] - the async retry executor
//!
//! The executor itself is policy-free by default (every error retried);
//! HTTP-aware eligibility lives in [`crate::error::ApiError::is_transient`]
//! and is layered on via `RetryPolicy::transient()`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

/// Upper bound on any single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Default number of total attempts (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Compute the backoff delay before the retry following `attempt`
/// (1-based: `attempt = 1` after the first failure).
///
/// `min(base_delay * 2^(attempt-1) * jitter, max_delay)`, with jitter drawn
/// uniformly from `[0.5, 1.0)`. The jitter desynchronizes concurrent callers
/// so they don't hammer a recovering server in lockstep.
#[must_use]
pub fn compute_delay(attempt: u32, base_delay: Duration, max_delay: Duration) -> Duration {
    let jitter = rand::random::<f64>().mul_add(0.5, 0.5);
    Duration::from_secs_f64(scaled_delay(attempt, base_delay, max_delay, jitter))
}

/// Plain doubling without jitter, same clamping.
fn flat_delay(attempt: u32, base_delay: Duration, max_delay: Duration) -> Duration {
    Duration::from_secs_f64(scaled_delay(attempt, base_delay, max_delay, 1.0))
}

fn scaled_delay(attempt: u32, base_delay: Duration, max_delay: Duration, jitter: f64) -> f64 {
    let exponent = i32::try_from(attempt.saturating_sub(1).min(63)).unwrap_or(63);
    let scaled = base_delay.as_secs_f64() * 2_f64.powi(exponent) * jitter;
    scaled.min(max_delay.as_secs_f64())
}

/// Retry-eligibility predicate: decides from the error alone whether another
/// attempt is worthwhile.
///
/// Kept as an explicit value (rather than status checks hand-coded per call
/// site) so the same classification is shared by every retry-wrapped verb.
pub struct RetryPolicy<E>(Arc<dyn Fn(&E) -> bool + Send + Sync>);

impl<E> Clone for RetryPolicy<E> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<E> std::fmt::Debug for RetryPolicy<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RetryPolicy(..)")
    }
}

impl<E> RetryPolicy<E> {
    /// Build a policy from a predicate.
    pub fn new(is_retryable: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(is_retryable))
    }

    /// The policy-free default: every error is retried.
    #[must_use]
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// Whether `error` should trigger another attempt.
    #[must_use]
    pub fn is_retryable(&self, error: &E) -> bool {
        (self.0)(error)
    }
}

/// Configuration for a [`with_retry`] call.
pub struct RetryOptions<E> {
    /// Total attempts, first try included. Clamped to at least 1.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt.
    pub base_delay: Duration,
    /// Cap on any single delay.
    pub max_delay: Duration,
    /// Whether to jitter delays. Cache fetch cycles turn this off to keep
    /// their retry cadence predictable; everything else leaves it on.
    pub jitter: bool,
    /// Which errors are worth retrying.
    pub policy: RetryPolicy<E>,
    /// Invoked on every failed attempt, including the final one.
    pub on_error: Option<Arc<dyn Fn(&E) + Send + Sync>>,
}

impl<E> Clone for RetryOptions<E> {
    fn clone(&self) -> Self {
        Self {
            max_attempts: self.max_attempts,
            base_delay: self.base_delay,
            max_delay: self.max_delay,
            jitter: self.jitter,
            policy: self.policy.clone(),
            on_error: self.on_error.clone(),
        }
    }
}

impl<E> std::fmt::Debug for RetryOptions<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryOptions")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("jitter", &self.jitter)
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

impl<E> Default for RetryOptions<E> {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            jitter: true,
            policy: RetryPolicy::always(),
            on_error: None,
        }
    }
}

impl<E> RetryOptions<E> {
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy<E>) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn without_jitter(mut self) -> Self {
        self.jitter = false;
        self
    }

    #[must_use]
    pub fn with_on_error(mut self, on_error: impl Fn(&E) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(on_error));
        self
    }
}

/// Run `operation` until it succeeds, the policy rules the error out, or the
/// attempt cap is reached.
///
/// Attempts are strictly sequential; only one operation is in flight per
/// call. On success the result is returned immediately. Every failure
/// invokes `on_error`; a failure that is final (last attempt) or
/// non-retryable under the policy is returned to the caller, otherwise the
/// executor sleeps for the computed backoff and tries again.
///
/// # Errors
///
/// Returns the last observed error once attempts are exhausted, or the first
/// error the policy classifies as non-retryable.
pub async fn with_retry<F, Fut, T, E>(operation: F, options: &RetryOptions<E>) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = options.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if let Some(on_error) = &options.on_error {
                    on_error(&error);
                }
                if attempt >= max_attempts || !options.policy.is_retryable(&error) {
                    return Err(error);
                }

                let delay = if options.jitter {
                    compute_delay(attempt, options.base_delay, options.max_delay)
                } else {
                    flat_delay(attempt, options.base_delay, options.max_delay)
                };
                debug!(
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "retrying after failure"
                );
                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
