//! Exponential backoff with jitter for transient provider errors.
//!
//! Generalizes the registry's plain retry count into the specific backoff
//! shape the runner needs: base delay, a hard cap, and jitter so concurrent
//! retries against the same provider don't thunder-herd in lockstep.

/// Backoff policy: exponential with a cap, ±25% jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub base_ms: u64,
    pub cap_ms: u64,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { base_ms: 1000, cap_ms: 60_000, max_retries: 3 }
    }
}

impl RetryPolicy {
    pub fn new(base_ms: u64, cap_ms: u64, max_retries: u32) -> Self {
        Self { base_ms, cap_ms, max_retries }
    }

    /// Delay before retry attempt `attempt` (0-indexed: the first retry is
    /// attempt 0). Jitter is ±25% of the unjittered exponential delay.
    pub fn delay_for(&self, attempt: u32) -> std::time::Duration {
        let unjittered = self.base_ms.saturating_mul(1u64 << attempt.min(20)).min(self.cap_ms);
        let jitter_range = unjittered / 4;
        let jitter = if jitter_range == 0 {
            0
        } else {
            rand::random::<u64>() % (2 * jitter_range + 1)
        };
        let delayed = unjittered.saturating_sub(jitter_range).saturating_add(jitter);
        std::time::Duration::from_millis(delayed.min(self.cap_ms))
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially_but_caps() {
        let policy = RetryPolicy::new(1000, 60_000, 5);
        assert!(policy.delay_for(0).as_millis() <= 1250);
        assert!(policy.delay_for(10).as_millis() as u64 <= 60_000);
    }

    #[test]
    fn should_retry_respects_max() {
        let policy = RetryPolicy::new(1000, 60_000, 3);
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }

    #[test]
    fn jitter_stays_within_quarter_range() {
        let policy = RetryPolicy::new(4000, 60_000, 5);
        for attempt in 0..6 {
            let d = policy.delay_for(attempt).as_millis() as u64;
            let unjittered = 4000u64.saturating_mul(1u64 << attempt).min(60_000);
            let lower = unjittered.saturating_sub(unjittered / 4);
            let upper = (unjittered + unjittered / 4).min(60_000);
            assert!(d >= lower && d <= upper, "attempt {attempt}: {d} not in [{lower},{upper}]");
        }
    }
}
