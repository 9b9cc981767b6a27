use cinemarec_config::TimingConfig;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const BACKOFF_FACTOR: u32 = 2;

/// Bounded exponential backoff for polling a resource until it changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub factor: u32,
    pub max_attempts: u32,
}

/// Result of [`Backoff::poll_until`]
#[derive(Debug, Clone, PartialEq)]
pub struct Polled<T> {
    pub value: T,
    pub attempts: u32,
    /// Whether the predicate accepted `value` before attempts ran out
    pub satisfied: bool,
}

impl Backoff {
    pub fn new(initial: Duration, max_attempts: u32) -> Self {
        Self {
            initial,
            factor: BACKOFF_FACTOR,
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(timing.refresh_initial_backoff(), timing.refresh_max_attempts)
    }

    /// Delay before attempt `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial;
        }
        self.initial
            .saturating_mul(self.factor.saturating_pow(attempt))
    }

    /// Wait, fetch, and repeat until `done` accepts the value or attempts run out.
    /// A fetch error ends polling immediately.
    pub async fn poll_until<T, E, F, Fut, P>(&self, mut fetch: F, mut done: P) -> Result<Polled<T>, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnMut(&T) -> bool,
    {
        let mut attempt = 0;
        loop {
            let delay = self.delay_for(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let value = fetch().await?;
            attempt += 1;

            if done(&value) {
                return Ok(Polled {
                    value,
                    attempts: attempt,
                    satisfied: true,
                });
            }
            if attempt >= self.max_attempts {
                debug!("Gave up polling after {} attempts", attempt);
                return Ok(Polled {
                    value,
                    attempts: attempt,
                    satisfied: false,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delays_grow() {
        let backoff = Backoff::new(Duration::from_millis(100), 4);
        assert_eq!(backoff.delay_for(0), Duration::from_millis(100));
        assert_eq!(backoff.delay_for(1), Duration::from_millis(200));
        assert_eq!(backoff.delay_for(3), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_stops_when_satisfied() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let backoff = Backoff::new(Duration::ZERO, 5);
        let polled = backoff
            .poll_until(
                move || async move { Ok::<_, ()>(calls.fetch_add(1, Ordering::SeqCst) + 1) },
                |n| *n >= 3,
            )
            .await
            .unwrap();
        assert_eq!(polled.value, 3);
        assert_eq!(polled.attempts, 3);
        assert!(polled.satisfied);
    }

    #[tokio::test]
    async fn test_bounded_attempts() {
        let backoff = Backoff::new(Duration::ZERO, 2);
        let polled = backoff
            .poll_until(|| async { Ok::<_, ()>(0) }, |_| false)
            .await
            .unwrap();
        assert_eq!(polled.attempts, 2);
        assert!(!polled.satisfied);
    }

    #[tokio::test]
    async fn test_error_ends_polling() {
        let backoff = Backoff::new(Duration::ZERO, 5);
        let result: Result<Polled<u32>, &str> = backoff.poll_until(|| async { Err("down") }, |_| true).await;
        assert_eq!(result.unwrap_err(), "down");
    }
}
