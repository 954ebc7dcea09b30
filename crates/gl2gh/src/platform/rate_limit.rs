use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default request pacing per platform (requests per second).
pub mod rate_limits {
    /// GitHub: 5000 requests/hour for authenticated users; repository
    /// creation also trips secondary limits, so stay well below that.
    pub const GITHUB_DEFAULT_RPS: u32 = 5;
    /// GitLab: 2000 requests/minute on gitlab.com, we use 5/sec for safety.
    pub const GITLAB_DEFAULT_RPS: u32 = 5;
}

/// A standalone API rate limiter using the governor crate.
///
/// Clients hold an optional limiter and call [`ApiRateLimiter::wait`] before
/// every request.
///
/// # Example
///
/// ```ignore
/// use gl2gh::platform::{ApiRateLimiter, rate_limits};
///
/// let limiter = ApiRateLimiter::new(rate_limits::GITLAB_DEFAULT_RPS);
/// let client = GitLabClient::new("gitlab.com", &token, Some(limiter))?;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter with the specified requests per second.
    ///
    /// A value of zero is treated as one request per second.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
        }
    }

    /// Wait until a request is allowed by the rate limiter.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter").finish_non_exhaustive()
    }
}
