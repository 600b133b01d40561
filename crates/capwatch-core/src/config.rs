use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::time::Duration;

use crate::adapters::FINNHUB_BASE_URL;
use crate::error::ConfigError;
use crate::provider_policy::ProviderPolicy;
use crate::retry::RetryConfig;

pub const ENV_API_KEY: &str = "CAPWATCH_FINNHUB_API_KEY";
pub const ENV_BASE_URL: &str = "CAPWATCH_FINNHUB_BASE_URL";
pub const ENV_EXCHANGE: &str = "CAPWATCH_EXCHANGE";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "CAPWATCH_REQUEST_TIMEOUT_MS";
pub const ENV_MAX_CONCURRENCY: &str = "CAPWATCH_MAX_CONCURRENCY";
pub const ENV_RATE_LIMIT_PER_MINUTE: &str = "CAPWATCH_RATE_LIMIT_PER_MINUTE";
pub const ENV_MAX_RETRIES: &str = "CAPWATCH_MAX_RETRIES";

/// Runtime configuration. The API token is only ever injected from here.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub exchange: String,
    pub request_timeout_ms: u64,
    pub max_concurrency: usize,
    pub rate_limit_per_minute: u32,
    pub max_retries: u32,
}

impl Config {
    /// Reads the process environment. A `.env` file is loaded first but never
    /// overrides variables that are already set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ProviderPolicy::finnhub_default();
        let read = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_key = read(ENV_API_KEY)
            .map(|value| value.trim().to_owned())
            .ok_or(ConfigError::MissingApiKey { key: ENV_API_KEY })?;

        Ok(Self {
            api_key,
            base_url: read(ENV_BASE_URL).unwrap_or_else(|| String::from(FINNHUB_BASE_URL)),
            exchange: read(ENV_EXCHANGE).unwrap_or_else(|| String::from("US")),
            request_timeout_ms: parse_or(&read, ENV_REQUEST_TIMEOUT_MS, defaults.timeout_ms())?,
            max_concurrency: parse_or(&read, ENV_MAX_CONCURRENCY, defaults.max_concurrency)?,
            rate_limit_per_minute: parse_or(&read, ENV_RATE_LIMIT_PER_MINUTE, defaults.quota_limit)?,
            max_retries: parse_or(&read, ENV_MAX_RETRIES, defaults.retry.max_retries)?,
        })
    }

    pub fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    pub fn policy(&self) -> ProviderPolicy {
        ProviderPolicy {
            max_concurrency: self.max_concurrency.max(1),
            quota_window: Duration::from_secs(60),
            quota_limit: self.rate_limit_per_minute.max(1),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            retry: RetryConfig::exponential(self.max_retries),
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("exchange", &self.exchange)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("max_concurrency", &self.max_concurrency)
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

fn parse_or<T, R>(read: &R, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    R: Fn(&str) -> Option<String>,
{
    match read(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let err = Config::from_lookup(lookup(&[])).expect_err("must fail");
        assert_eq!(err, ConfigError::MissingApiKey { key: ENV_API_KEY });

        let blank = Config::from_lookup(lookup(&[(ENV_API_KEY, "  ")])).expect_err("must fail");
        assert!(matches!(blank, ConfigError::MissingApiKey { .. }));
    }

    #[test]
    fn defaults_follow_the_finnhub_policy() {
        let config = Config::from_lookup(lookup(&[(ENV_API_KEY, "abc")])).expect("valid");

        assert_eq!(config.api_key, "abc");
        assert_eq!(config.base_url, FINNHUB_BASE_URL);
        assert_eq!(config.exchange, "US");
        assert_eq!(config.request_timeout_ms, 10_000);
        assert_eq!(config.max_concurrency, 4);
        assert_eq!(config.rate_limit_per_minute, 60);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            (ENV_API_KEY, "abc"),
            (ENV_REQUEST_TIMEOUT_MS, "2500"),
            (ENV_MAX_CONCURRENCY, "8"),
            (ENV_RATE_LIMIT_PER_MINUTE, "300"),
        ]))
        .expect("valid");

        let policy = config.policy();
        assert_eq!(policy.request_timeout, Duration::from_millis(2_500));
        assert_eq!(policy.max_concurrency, 8);
        assert_eq!(policy.quota_limit, 300);
    }

    #[test]
    fn non_numeric_values_are_rejected() {
        let err = Config::from_lookup(lookup(&[
            (ENV_API_KEY, "abc"),
            (ENV_MAX_CONCURRENCY, "lots"),
        ]))
        .expect_err("must fail");

        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: ENV_MAX_CONCURRENCY,
                value: String::from("lots"),
            }
        );
    }

    #[test]
    fn debug_output_redacts_the_token() {
        let config = Config::from_lookup(lookup(&[(ENV_API_KEY, "secret-token")])).expect("valid");
        assert!(!format!("{config:?}").contains("secret-token"));
    }
}
