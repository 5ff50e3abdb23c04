use crate::http::error::FetchError;
use bon::Builder;
use std::time::Duration;

/// Pacing and retry parameters of [`crate::RateLimitAwareClient`].
///
/// The defaults follow AEMET OpenData's limits: one request per second, a
/// fixed 60 second rate-limit window (cooled down for 61 seconds) and up to
/// five attempts per request.
///
/// # Examples
///
/// ```
/// use aemet_ingest::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_attempts(3)
///     .rate_limit_cooldown(Duration::from_secs(30))
///     .build();
/// assert_eq!(policy.transient_backoff(1), Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first one.
    #[builder(default = 5)]
    pub max_attempts: u32,
    /// Minimum time between two requests issued by the same client.
    #[builder(default = Duration::from_secs(1))]
    pub min_request_interval: Duration,
    /// Base of the exponential backoff: `base * 2^(attempt - 1)`.
    #[builder(default = Duration::from_secs(1))]
    pub backoff_base: Duration,
    #[builder(default = Duration::from_secs(5))]
    pub backoff_min: Duration,
    #[builder(default = Duration::from_secs(120))]
    pub backoff_max: Duration,
    /// Fixed wait after a rate-limited attempt.
    #[builder(default = Duration::from_secs(61))]
    pub rate_limit_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RetryPolicy {
    /// Wait after the `attempt`-th (1-based) transient failure.
    pub fn transient_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.backoff_base
            .saturating_mul(1u32 << exponent)
            .max(self.backoff_min)
            .min(self.backoff_max)
    }

    /// Wait before retrying after `error` ended the `attempt`-th attempt.
    pub(crate) fn wait_after(&self, error: &FetchError, attempt: u32) -> Duration {
        match error {
            FetchError::RateLimited { .. } => self.rate_limit_cooldown,
            _ => self.transient_backoff(attempt),
        }
    }
}
