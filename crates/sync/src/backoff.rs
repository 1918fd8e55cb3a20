//! Timing parameters for subscription retries and polling.
//!
//! A failed subscription is retried after `backoff_base * 2^attempt`
//! (2 s, 4 s, 8 s with the defaults). Once `max_subscribe_retries` is
//! exceeded the synchronizer polls every `poll_interval` instead. A
//! subscription not acknowledged within `subscribe_timeout` counts as
//! failed.

use std::time::Duration;

/// Tunable parameters for the synchronizer.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Subscription retries allowed before falling back to polling.
    pub max_subscribe_retries: u32,
    /// Unit of the exponential backoff.
    pub backoff_base: Duration,
    /// Upper bound on a single backoff delay.
    pub max_backoff: Duration,
    /// Fixed delay between polls in fallback mode.
    pub poll_interval: Duration,
    /// How long to wait for a subscription to be acknowledged.
    pub subscribe_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_subscribe_retries: 3,
            backoff_base: Duration::from_secs(1),
            max_backoff: Duration::from_secs(60),
            poll_interval: Duration::from_secs(10),
            subscribe_timeout: Duration::from_secs(10),
        }
    }
}

/// Delay before retry number `attempt` (1-based).
///
/// The result is clamped to [`SyncConfig::max_backoff`].
pub fn retry_delay(attempt: u32, config: &SyncConfig) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    config
        .backoff_base
        .saturating_mul(factor)
        .min(config.max_backoff)
}

/// Whether retry number `attempt` (1-based) is still allowed.
pub fn should_retry(attempt: u32, config: &SyncConfig) -> bool {
    attempt <= config.max_subscribe_retries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_retry_waits_two_seconds() {
        let config = SyncConfig::default();
        assert_eq!(retry_delay(1, &config), Duration::from_secs(2));
    }

    #[test]
    fn default_sequence() {
        let config = SyncConfig::default();
        let delays: Vec<u64> = (1..=3).map(|a| retry_delay(a, &config).as_secs()).collect();
        assert_eq!(delays, vec![2, 4, 8]);
    }

    #[test]
    fn clamps_at_max() {
        let config = SyncConfig {
            max_backoff: Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(retry_delay(4, &config), Duration::from_secs(10));
    }

    #[test]
    fn huge_attempt_does_not_overflow() {
        let config = SyncConfig::default();
        assert_eq!(retry_delay(200, &config), config.max_backoff);
    }

    #[test]
    fn retry_cap() {
        let config = SyncConfig::default();
        assert!(should_retry(1, &config));
        assert!(should_retry(3, &config));
        assert!(!should_retry(4, &config));
    }

    #[test]
    fn custom_base() {
        let config = SyncConfig {
            backoff_base: Duration::from_millis(10),
            ..Default::default()
        };
        assert_eq!(retry_delay(3, &config), Duration::from_millis(80));
    }
}
