//! Bounded retry with exponential backoff.
//!
//! The delay is awaited through a [`Sleeper`] so tests can observe the
//! schedule without real timers.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::defaults;

/// Something that can wait for a duration.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry policy: `max_attempts` total attempts, waiting `base_delay * 2^attempt`
/// after each failed attempt except the last.
#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .finish()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            defaults::SEARCH_MAX_ATTEMPTS,
            Duration::from_millis(defaults::SEARCH_BASE_DELAY_MS),
        )
    }
}

impl RetryPolicy {
    /// Create a policy using the tokio timer. At least one attempt is always made.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Replace the sleeper (virtual clock in tests).
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Delay awaited after the given zero-indexed failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `op` until it succeeds or the attempts are exhausted.
    ///
    /// `op` receives the zero-indexed attempt number. On exhaustion the number
    /// of attempts made and the last error are returned.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> std::result::Result<T, (u32, E)>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(attempt = attempt + 1, error = %e, "Attempt failed");
                    if attempt + 1 >= self.max_attempts {
                        return Err((attempt + 1, e));
                    }
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after backoff"
                    );
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSleeper {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.delays.lock().unwrap().push(duration);
        }
    }

    fn policy(sleeper: Arc<RecordingSleeper>) -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(1)).with_sleeper(sleeper)
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_success_on_first_attempt_never_sleeps() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let result: std::result::Result<u32, (u32, String)> =
            policy(sleeper.clone()).run(|_| async { Ok(7) }).await;

        assert_eq!(result.unwrap(), 7);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_exhaustion_sleeps_only_between_attempts() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let result: std::result::Result<(), (u32, String)> = policy(sleeper.clone())
            .run(|attempt| async move { Err(format!("boom {}", attempt)) })
            .await;

        let (attempts, last) = result.unwrap_err();
        assert_eq!(attempts, 3);
        assert_eq!(last, "boom 2");
        assert_eq!(
            *sleeper.delays.lock().unwrap(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let sleeper = Arc::new(RecordingSleeper::default());
        let result: std::result::Result<&str, (u32, String)> = policy(sleeper.clone())
            .run(|attempt| async move {
                if attempt == 0 {
                    Err("transient".to_string())
                } else {
                    Ok("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(*sleeper.delays.lock().unwrap(), vec![Duration::from_secs(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_advances_paused_clock() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_secs(4)).await;
        assert!(start.elapsed() >= Duration::from_secs(4));
    }
}
