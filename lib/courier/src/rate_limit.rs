//! Token-bucket rate limiting using governor.
//!
//! A client owns at most one [`RateLimiter`]. Every call waits for a token
//! before its lifecycle hooks run, racing the wait against the call context so
//! a cancelled call never reaches the transport.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::{Quota, clock::DefaultClock, state::InMemoryState};

use crate::{CallContext, Result};

/// Type alias for the governor rate limiter.
type GovernorLimiter = governor::RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>;

/// Shared token bucket gating outgoing calls.
///
/// Clones share the same bucket.
///
/// # Example
///
/// ```
/// use courier::RateLimiter;
///
/// // 10 calls per second, bursts of 10
/// let limiter = RateLimiter::per_second(10).expect("non-zero");
///
/// // Zero means unlimited
/// assert!(RateLimiter::per_minute(0).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RateLimiter {
    limiter: Arc<GovernorLimiter>,
    quota: Quota,
}

impl RateLimiter {
    /// Allows `count` calls per second with a burst of `count`.
    ///
    /// Returns `None` for zero, meaning no limit.
    #[must_use]
    pub fn per_second(count: u32) -> Option<Self> {
        NonZeroU32::new(count).map(|count| Self::with_quota(Quota::per_second(count)))
    }

    /// Allows `count` calls per minute with a burst of `count`.
    ///
    /// Returns `None` for zero, meaning no limit.
    #[must_use]
    pub fn per_minute(count: u32) -> Option<Self> {
        NonZeroU32::new(count).map(|count| Self::with_quota(Quota::per_minute(count)))
    }

    /// Rate limiter with a custom quota.
    #[must_use]
    pub fn with_quota(quota: Quota) -> Self {
        Self {
            limiter: Arc::new(governor::RateLimiter::direct(quota)),
            quota,
        }
    }

    /// The configured quota.
    #[must_use]
    pub const fn quota(&self) -> Quota {
        self.quota
    }

    /// Takes a token if one is available right now.
    #[must_use]
    pub fn try_acquire(&self) -> bool {
        self.limiter.check().is_ok()
    }

    /// Waits for a token, or fails with [`Error::Cancelled`] /
    /// [`Error::DeadlineExceeded`] if the context ends first.
    ///
    /// [`Error::Cancelled`]: crate::Error::Cancelled
    /// [`Error::DeadlineExceeded`]: crate::Error::DeadlineExceeded
    pub async fn until_ready(&self, cx: &CallContext) -> Result<()> {
        cx.run(self.limiter.until_ready()).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::*;
    use crate::Error;

    #[test]
    fn zero_means_no_limiter() {
        assert!(RateLimiter::per_second(0).is_none());
        assert!(RateLimiter::per_minute(0).is_none());
    }

    #[test]
    fn per_second_burst_matches_rate() {
        let limiter = RateLimiter::per_second(3).expect("non-zero");
        assert_eq!(limiter.quota().burst_size().get(), 3);

        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(limiter.try_acquire());
        assert!(!limiter.try_acquire());
    }

    #[test]
    fn per_minute_spreads_tokens_over_a_minute() {
        let limiter = RateLimiter::per_minute(60).expect("non-zero");
        assert_eq!(limiter.quota().burst_size().get(), 60);
        assert_eq!(limiter.quota().replenish_interval(), Duration::from_secs(1));
    }

    #[test]
    fn clones_share_the_bucket() {
        let limiter = RateLimiter::per_minute(1).expect("non-zero");
        let clone = limiter.clone();

        assert!(limiter.try_acquire());
        assert!(!clone.try_acquire());
    }

    #[tokio::test]
    async fn until_ready_waits_for_replenishment() {
        let limiter = RateLimiter::per_second(1).expect("non-zero");
        let cx = CallContext::new();

        let start = Instant::now();
        limiter.until_ready(&cx).await.expect("first token");
        limiter.until_ready(&cx).await.expect("second token");

        let elapsed = start.elapsed();
        assert!(
            elapsed >= Duration::from_millis(900),
            "rate limiter should have delayed second call, elapsed: {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn until_ready_aborts_on_cancellation() {
        let limiter = RateLimiter::per_minute(1).expect("non-zero");
        let cx = CallContext::new();
        limiter.until_ready(&cx).await.expect("first token");

        let canceller = cx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let result = limiter.until_ready(&cx).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn until_ready_aborts_on_deadline() {
        let limiter = RateLimiter::per_minute(1).expect("non-zero");
        limiter
            .until_ready(&CallContext::new())
            .await
            .expect("first token");

        let cx = CallContext::with_timeout(Duration::from_millis(20));
        let result = limiter.until_ready(&cx).await;
        assert!(matches!(result, Err(Error::DeadlineExceeded)));
    }
}
