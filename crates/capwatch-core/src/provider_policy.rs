use std::time::Duration;

use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::retry::RetryConfig;

/// Request budget for one provider: quota, fan-out width, timeout and retries.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPolicy {
    pub max_concurrency: usize,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
}

impl ProviderPolicy {
    /// Finnhub free tier: 60 calls per minute.
    pub fn finnhub_default() -> Self {
        Self {
            max_concurrency: 4,
            quota_window: Duration::from_secs(60),
            quota_limit: 60,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry: RetryConfig::default(),
        }
    }

    /// No quota, no retries, sequential. For tests against fixture transports.
    pub fn unthrottled() -> Self {
        Self {
            max_concurrency: 1,
            quota_window: Duration::from_millis(1),
            quota_limit: u32::MAX,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry: RetryConfig::no_retry(),
        }
    }

    pub fn timeout_ms(&self) -> u64 {
        u64::try_from(self.request_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finnhub_policy_matches_free_tier() {
        let policy = ProviderPolicy::finnhub_default();

        assert_eq!(policy.quota_window, Duration::from_secs(60));
        assert_eq!(policy.quota_limit, 60);
        assert_eq!(policy.max_concurrency, 4);
        assert_eq!(policy.timeout_ms(), 10_000);
    }
}
