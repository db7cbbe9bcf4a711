//! Backoff policy for transient API failures.

use std::time::Duration;

use async_trait::async_trait;

/// Default attempt budget for read calls.
pub const DEFAULT_MAX_RETRIES: usize = 10;

/// Backoff counter starting value, in seconds.
const INITIAL_DELAY_SECS: u64 = 1;

/// Rate limiting (429) and every 5xx status are transient; everything else is final.
pub fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

/// Waits between attempts. Injected so backoff can be observed in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry bookkeeping for a single in-flight call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    remaining_attempts: usize,
    delay_secs: u64,
}

impl RetryState {
    /// At least one attempt is always made, even with a zero budget.
    pub fn new(max_retries: usize) -> Self {
        Self {
            remaining_attempts: max_retries.max(1),
            delay_secs: INITIAL_DELAY_SECS,
        }
    }

    pub fn remaining_attempts(&self) -> usize {
        self.remaining_attempts
    }

    /// Records a transient failure and returns how long to wait before the
    /// next attempt, or `None` once the budget is spent.
    ///
    /// The wait is the server's `Retry-After` when given, else the linear
    /// backoff counter, plus one second either way.
    pub fn next_wait(&mut self, retry_after: Option<u64>) -> Option<Duration> {
        self.remaining_attempts = self.remaining_attempts.saturating_sub(1);
        if self.remaining_attempts == 0 {
            return None;
        }

        let wait = retry_after.unwrap_or(self.delay_secs);
        self.delay_secs = self.delay_secs.saturating_add(1);
        Some(Duration::from_secs(wait.saturating_add(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_transient_status() {
        assert!(is_transient_status(429));
        assert!(is_transient_status(500));
        assert!(is_transient_status(502));
        assert!(is_transient_status(599));

        assert!(!is_transient_status(200));
        assert!(!is_transient_status(400));
        assert!(!is_transient_status(401));
        assert!(!is_transient_status(403));
        assert!(!is_transient_status(404));
        assert!(!is_transient_status(428));
        assert!(!is_transient_status(600));
    }

    #[test]
    fn test_retry_state_linear_backoff() {
        let mut state = RetryState::new(DEFAULT_MAX_RETRIES);

        assert_eq!(state.next_wait(None), Some(Duration::from_secs(2)));
        assert_eq!(state.next_wait(None), Some(Duration::from_secs(3)));
        assert_eq!(state.next_wait(None), Some(Duration::from_secs(4)));
        assert_eq!(state.remaining_attempts(), DEFAULT_MAX_RETRIES - 3);
    }

    #[test]
    fn test_retry_state_prefers_retry_after() {
        let mut state = RetryState::new(3);
        assert_eq!(state.next_wait(Some(5)), Some(Duration::from_secs(6)));
        // The backoff counter still advances
        assert_eq!(state.next_wait(None), Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_retry_state_huge_retry_after_saturates() {
        let mut state = RetryState::new(10);
        assert_eq!(
            state.next_wait(Some(u64::MAX)),
            Some(Duration::from_secs(u64::MAX))
        );
    }

    #[test]
    fn test_retry_state_exhausts_budget() {
        let mut state = RetryState::new(3);
        assert!(state.next_wait(None).is_some());
        assert!(state.next_wait(None).is_some());
        assert_eq!(state.next_wait(None), None);
        assert_eq!(state.remaining_attempts(), 0);
    }

    #[test]
    fn test_retry_state_zero_budget_allows_one_attempt() {
        let mut state = RetryState::new(0);
        assert_eq!(state.remaining_attempts(), 1);
        assert_eq!(state.next_wait(None), None);
    }

    #[tokio::test]
    async fn test_tokio_sleeper_waits() {
        let start = std::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(10)).await;
        assert!(start.elapsed() >= Duration::from_millis(10));
    }
}
