// media-providers/src/retry.rs
// ============================================================================
// Module: Retry Policy
// Description: Exponential backoff with jitter for provider HTTP calls.
// Purpose: Implement the §4.2 retry contract (3 attempts, 400*2^(n-1) ms
//          backoff + up to 250ms jitter, 20s per-attempt timeout).
// Dependencies: rand, tokio
// ============================================================================

use rand::Rng;

use media_core::ProviderError;

/// Maximum fetch attempts per provider call.
pub const MAX_ATTEMPTS: u32 = 3;
/// Base backoff in milliseconds; doubled per retry.
pub const BASE_BACKOFF_MS: u64 = 400;
/// Upper bound, in milliseconds, of the jitter added to each backoff.
pub const MAX_JITTER_MS: u64 = 250;
/// Per-attempt deadline.
pub const PER_ATTEMPT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

/// Exponential backoff with jitter, matching the §4.2 retry contract.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy;

impl RetryPolicy {
    /// Backoff duration before retry attempt number `attempt` (1-indexed, i.e.
    /// the delay before the *second* attempt is `backoff_for(1)`).
    #[must_use]
    pub fn backoff_for(attempt: u32) -> std::time::Duration {
        let exponential = BASE_BACKOFF_MS.saturating_mul(1u64 << attempt.saturating_sub(1));
        let jitter = rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
        std::time::Duration::from_millis(exponential + jitter)
    }

    /// Returns true when `error` is retryable under the §4.2 classification.
    #[must_use]
    pub fn is_retryable(error: &ProviderError) -> bool {
        matches!(
            error,
            ProviderError::RateLimit(_) | ProviderError::Upstream5xx(_) | ProviderError::Timeout(_)
        )
    }

    /// Runs `attempt_fn` up to [`MAX_ATTEMPTS`] times, retrying only on
    /// [`Self::is_retryable`] errors, sleeping [`Self::backoff_for`] between
    /// attempts.
    pub async fn run<F, Fut>(mut attempt_fn: F) -> Result<media_core::ProviderFetchResult, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<media_core::ProviderFetchResult, ProviderError>>,
    {
        let mut last_err = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match attempt_fn().await {
                Ok(result) => return Ok(result),
                Err(err) if Self::is_retryable(&err) && attempt < MAX_ATTEMPTS => {
                    tokio::time::sleep(Self::backoff_for(attempt)).await;
                    last_err = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_err.unwrap_or_else(|| ProviderError::Unknown("retry loop exited without an attempt".to_string())))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    reason = "Test-only assertions."
)]
mod tests {
    use super::RetryPolicy;
    use media_core::ProviderError;

    #[test]
    fn backoff_grows_exponentially_before_jitter() {
        let first = RetryPolicy::backoff_for(1).as_millis();
        let second = RetryPolicy::backoff_for(2).as_millis();
        assert!(first >= 400 && first <= 650);
        assert!(second >= 800 && second <= 1050);
    }

    #[test]
    fn classifies_retryable_errors() {
        assert!(RetryPolicy::is_retryable(&ProviderError::RateLimit("429".to_string())));
        assert!(RetryPolicy::is_retryable(&ProviderError::Upstream5xx("503".to_string())));
        assert!(!RetryPolicy::is_retryable(&ProviderError::Auth("401".to_string())));
        assert!(!RetryPolicy::is_retryable(&ProviderError::Schema("bad json".to_string())));
    }

    #[tokio::test]
    async fn run_retries_transient_errors_then_succeeds() {
        let attempts = std::sync::atomic::AtomicU32::new(0);
        let result = RetryPolicy::run(|| {
            let count = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async move {
                if count < 2 {
                    Err(ProviderError::Timeout("slow".to_string()))
                } else {
                    Ok(media_core::ProviderFetchResult {
                        provider: "reuters".to_string(),
                        term: "claro".to_string(),
                        items: vec![],
                        request_url: "https://example.com".to_string(),
                        raw_count: 0,
                        duration_ms: 1,
                        error: None,
                    })
                }
            }
        })
        .await;
        assert!(result.is_ok());
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn run_does_not_retry_non_retryable_errors() {
        let attempts = std::sync::atomic::AtomicU32::new(0);
        let result = RetryPolicy::run(|| {
            attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            async { Err(ProviderError::Auth("bad key".to_string())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
