use std::time::Duration;

/// Exponential backoff: `base * 2^attempt`, with the exponent capped so the
/// multiplication cannot overflow.
pub fn calculate_backoff_delay(attempt: u32, base: Duration) -> Duration {
    let capped_attempt = attempt.min(10);
    base.saturating_mul(2_u32.saturating_pow(capped_attempt))
}

/// Attempt budget and backoff unit for [`crate::fetcher::HttpFetcher::fetch_with_retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        calculate_backoff_delay(retry, self.base_delay)
    }

    /// Sum of every delay a fully exhausted fetch sleeps through.
    pub fn total_delay(&self) -> Duration {
        (0..self.max_attempts.saturating_sub(1))
            .map(|retry| self.delay_for(retry))
            .sum()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_progression() {
        let base = Duration::from_secs(1);
        assert_eq!(calculate_backoff_delay(0, base), Duration::from_secs(1));
        assert_eq!(calculate_backoff_delay(1, base), Duration::from_secs(2));
        assert_eq!(calculate_backoff_delay(2, base), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_cap() {
        let base = Duration::from_secs(30);
        assert_eq!(
            calculate_backoff_delay(20, base),
            calculate_backoff_delay(10, base)
        );
        assert_eq!(calculate_backoff_delay(10, base), Duration::from_secs(30 * 1024));
    }

    #[test]
    fn test_policy_total_delay_is_bounded() {
        let policy = RetryPolicy::default();
        // Three attempts sleep 1s then 2s.
        assert_eq!(policy.total_delay(), Duration::from_secs(3));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
