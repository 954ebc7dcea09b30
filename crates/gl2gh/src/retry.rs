//! Backoff and retry for rate-limited platform calls.
//!
//! Provisioning, branch protection and archival all go through
//! [`with_retry`]; every other error is returned on the first attempt.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};

use crate::migrate::{
    INITIAL_BACKOFF_MS, MAX_BACKOFF_MS, MAX_RETRIES, MigrationProgress, ProgressCallback, emit,
};

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_RETRIES as usize,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

/// Default backoff: 1 s initial delay, 60 s cap, 5 retries, jitter.
#[must_use]
pub fn default_backoff() -> ExponentialBuilder {
    RetryConfig::default().into_backoff()
}

/// Run `operation`, retrying with [`default_backoff`] while `is_rate_limit`
/// says the error is a rate limit.
///
/// Each backoff is logged at debug level and reported as
/// [`MigrationProgress::RateLimitBackoff`] for `target` (e.g. `owner/repo`).
///
/// # Example
///
/// ```ignore
/// let handle = with_retry(
///     || destination.create_repository(Some("BAR"), &request),
///     |e: &PlatformError| e.is_rate_limited(),
///     |e: &PlatformError| short_error_message(e),
///     "BAR/bar",
///     on_progress,
/// )
/// .await?;
/// ```
pub async fn with_retry<T, E, F, Fut, IsRateLimit, ShortMsg>(
    mut operation: F,
    is_rate_limit: IsRateLimit,
    short_message: ShortMsg,
    target: &str,
    on_progress: Option<&ProgressCallback>,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
    IsRateLimit: Fn(&E) -> bool + Send + Sync + 'static,
    ShortMsg: Fn(&E) -> String + Send + Sync + 'static,
{
    let attempt = AtomicU32::new(0);

    let retry_op = || {
        attempt.fetch_add(1, Ordering::SeqCst);
        operation()
    };

    retry_op
        .retry(default_backoff())
        .notify(|err, dur| {
            let current_attempt = attempt.load(Ordering::SeqCst);
            emit(
                on_progress,
                MigrationProgress::RateLimitBackoff {
                    target: target.to_string(),
                    retry_after_ms: u64::try_from(dur.as_millis()).unwrap_or(u64::MAX),
                    attempt: current_attempt,
                },
            );
            tracing::debug!(
                "Rate limited on {}, retrying in {:?} (attempt {}): {}",
                target,
                dur,
                current_attempt,
                short_message(err)
            );
        })
        .when(is_rate_limit)
        .await
}
