//! Retry with exponential backoff and jitter.

use std::future::Future;
use std::time::Duration;

use crate::error::SwarmError;

/// Retry policy for transport-class failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Run `operation`, retrying while it fails with a retryable error.
    pub async fn execute<F, Fut, T>(&self, mut operation: F) -> Result<T, SwarmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SwarmError>>,
    {
        let mut backoff = self.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_retryable() || attempt >= self.max_attempts.max(1) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "retrying after error"
                    );

                    // 75%..125% of the nominal backoff
                    let jitter_factor = 0.75 + (rand_factor() * 0.5);
                    tokio::time::sleep(Duration::from_secs_f64(
                        backoff.as_secs_f64() * jitter_factor,
                    ))
                    .await;

                    backoff = Duration::from_secs_f64(
                        (backoff.as_secs_f64() * self.multiplier)
                            .min(self.max_backoff.as_secs_f64()),
                    );
                }
            }
        }
    }
}

/// Pseudo-random factor in [0, 1) from the clock and thread id.
fn rand_factor() -> f64 {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .hash(&mut hasher);
    std::thread::current().id().hash(&mut hasher);

    (hasher.finish() % 10000) as f64 / 10000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn retries_transport_errors_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let value = fast()
            .execute(move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(SwarmError::transport("agent", "peer", "refused"))
                } else {
                    Ok(7)
                }
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn decoding_errors_fail_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = fast()
            .execute(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(SwarmError::decoding("plan", "bad"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SwarmError::Decoding { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
