use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::data_source::{CandleRequest, Endpoint, MarketDataSource, SourceError, SourceFuture};
use crate::domain::positive_finite;
use crate::http_client::{HttpClient, HttpErrorKind, HttpRequest, ReqwestHttpClient};
use crate::provider_policy::ProviderPolicy;
use crate::throttling::Throttle;
use crate::{Metric, PriceHistory, Quote, SearchEntry, Symbol, UtcDateTime};

pub const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Finnhub REST adapter.
///
/// Every request waits on the shared [`Throttle`] first, so clones of the
/// adapter fanning out from several tasks stay inside one quota.
#[derive(Clone)]
pub struct FinnhubAdapter {
    http_client: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    policy: ProviderPolicy,
    throttle: Throttle,
}

impl FinnhubAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: impl Into<String>) -> Self {
        let policy = ProviderPolicy::finnhub_default();
        Self {
            http_client,
            api_key: api_key.into(),
            base_url: String::from(FINNHUB_BASE_URL),
            throttle: Throttle::from_policy(&policy),
            policy,
        }
    }

    /// Production adapter built from environment configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(ReqwestHttpClient::new()), config.api_key.clone())
            .with_base_url(config.base_url.clone())
            .with_policy(config.policy())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn with_policy(mut self, policy: ProviderPolicy) -> Self {
        self.throttle = Throttle::from_policy(&policy);
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ProviderPolicy {
        &self.policy
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> String {
        let mut url = format!("{}{}?", self.base_url, path);
        for (name, value) in params {
            url.push_str(name);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
            url.push('&');
        }
        url.push_str("token=");
        url.push_str(&urlencoding::encode(&self.api_key));
        url
    }

    /// Issues one GET with throttling and retries, returning the success body.
    ///
    /// `subject` names the symbol or exchange for messages; the URL is never
    /// logged because it carries the token.
    async fn get(&self, endpoint: Endpoint, subject: &str, url: String) -> Result<String, SourceError> {
        let retry = &self.policy.retry;
        let mut attempt = 0;

        loop {
            self.throttle.acquire().await;
            let request = HttpRequest::get(url.as_str()).with_timeout_ms(self.policy.timeout_ms());

            let (error, retryable) = match self.http_client.execute(request).await {
                Ok(response) if response.is_success() => return Ok(response.body),
                Ok(response) => {
                    let message = format!(
                        "finnhub {endpoint} for {subject} returned status {}",
                        response.status
                    );
                    let error = if response.status == 429 {
                        SourceError::rate_limited(message)
                    } else {
                        SourceError::unavailable(message)
                    };
                    (error, retry.should_retry_status(response.status))
                }
                Err(error) => {
                    let retryable = match error.kind() {
                        HttpErrorKind::Timeout => retry.retry_on_timeout,
                        HttpErrorKind::Connect => retry.retry_on_connect,
                        HttpErrorKind::Other => false,
                    };
                    let error = SourceError::transport(format!(
                        "finnhub {endpoint} for {subject}: {}",
                        error.message()
                    ));
                    (error, retryable)
                }
            };

            if !retryable || attempt >= retry.max_retries {
                return Err(error);
            }

            let delay = retry.delay_for_attempt(attempt);
            debug!(
                endpoint = endpoint.as_str(),
                subject,
                attempt,
                delay_ms = delay.as_millis() as u64,
                code = error.code(),
                "retrying finnhub request"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn fetch_metric(&self, symbol: &Symbol) -> Result<Metric, SourceError> {
        let url = self.url(
            "/stock/metric",
            &[("symbol", symbol.as_str()), ("metric", "all")],
        );
        let body = self.get(Endpoint::Metric, symbol.as_str(), url).await?;
        parse_metric(&body).map_err(|e| malformed(Endpoint::Metric, symbol.as_str(), &e))
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Quote, SourceError> {
        let url = self.url("/quote", &[("symbol", symbol.as_str())]);
        let body = self.get(Endpoint::Quote, symbol.as_str(), url).await?;
        parse_quote(&body).map_err(|e| malformed(Endpoint::Quote, symbol.as_str(), &e))
    }

    async fn fetch_candles(&self, req: &CandleRequest) -> Result<PriceHistory, SourceError> {
        let from = req.from.unix_timestamp().to_string();
        let to = req.to.unix_timestamp().to_string();
        let url = self.url(
            "/stock/candle",
            &[
                ("symbol", req.symbol.as_str()),
                ("resolution", "D"),
                ("from", &from),
                ("to", &to),
            ],
        );
        let body = self.get(Endpoint::Candle, req.symbol.as_str(), url).await?;
        let response: CandleResponse = serde_json::from_str(&body)
            .map_err(|e| malformed(Endpoint::Candle, req.symbol.as_str(), &e))?;
        response.into_history(req.symbol.clone())
    }

    async fn fetch_directory(&self, exchange: &str) -> Result<Vec<SearchEntry>, SourceError> {
        let url = self.url("/stock/symbol", &[("exchange", exchange)]);
        let body = self.get(Endpoint::SymbolDirectory, exchange, url).await?;
        let rows: Vec<DirectoryRow> = serde_json::from_str(&body)
            .map_err(|e| malformed(Endpoint::SymbolDirectory, exchange, &e))?;

        let total = rows.len();
        let entries: Vec<SearchEntry> = rows.into_iter().filter_map(DirectoryRow::into_entry).collect();
        if entries.len() < total {
            debug!(
                exchange,
                skipped = total - entries.len(),
                "skipped directory rows with unsupported tickers"
            );
        }
        Ok(entries)
    }
}

impl MarketDataSource for FinnhubAdapter {
    fn metric<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Metric> {
        Box::pin(self.fetch_metric(symbol))
    }

    fn quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Quote> {
        Box::pin(self.fetch_quote(symbol))
    }

    fn candles<'a>(&'a self, req: &'a CandleRequest) -> SourceFuture<'a, PriceHistory> {
        Box::pin(self.fetch_candles(req))
    }

    fn symbol_directory<'a>(&'a self, exchange: &'a str) -> SourceFuture<'a, Vec<SearchEntry>> {
        Box::pin(self.fetch_directory(exchange))
    }
}

fn malformed(endpoint: Endpoint, subject: &str, error: &serde_json::Error) -> SourceError {
    SourceError::malformed(format!(
        "failed to parse finnhub {endpoint} response for {subject}: {error}"
    ))
}

// Wire shapes. Numeric fields are read as raw JSON values so that a missing or
// non-numeric field degrades to `None` instead of failing the whole response.

#[derive(Debug, Deserialize)]
struct MetricResponse {
    #[serde(default)]
    metric: Option<MetricBody>,
}

#[derive(Debug, Deserialize)]
struct MetricBody {
    #[serde(rename = "marketCapitalization", default)]
    market_capitalization: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    c: Option<Value>,
    #[serde(default)]
    o: Option<Value>,
    #[serde(default)]
    h: Option<Value>,
    #[serde(default)]
    l: Option<Value>,
    #[serde(default)]
    pc: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CandleResponse {
    s: String,
    #[serde(default)]
    c: Vec<Value>,
    #[serde(default)]
    t: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct DirectoryRow {
    symbol: String,
    #[serde(default)]
    description: Option<String>,
}

/// Quote fields: the provider reports `0` for unknown symbols.
fn number(value: Option<Value>) -> Option<f64> {
    positive_finite(value.as_ref().and_then(Value::as_f64))
}

/// Market caps keep any finite value, `0` included.
fn finite(value: Option<Value>) -> Option<f64> {
    value
        .as_ref()
        .and_then(Value::as_f64)
        .filter(|cap| cap.is_finite())
}

fn parse_metric(body: &str) -> Result<Metric, serde_json::Error> {
    let response: MetricResponse = serde_json::from_str(body)?;
    Ok(Metric {
        market_cap: response
            .metric
            .and_then(|metric| finite(metric.market_capitalization)),
    })
}

fn parse_quote(body: &str) -> Result<Quote, serde_json::Error> {
    let response: QuoteResponse = serde_json::from_str(body)?;
    Ok(Quote {
        current_price: number(response.c),
        open_price: number(response.o),
        high_price: number(response.h),
        low_price: number(response.l),
        previous_close: number(response.pc),
    })
}

impl CandleResponse {
    fn into_history(self, symbol: Symbol) -> Result<PriceHistory, SourceError> {
        match self.s.as_str() {
            "ok" => {}
            "no_data" => return Ok(PriceHistory::empty(symbol)),
            other => {
                return Err(SourceError::malformed(format!(
                    "finnhub candle status for {symbol} is '{other}'"
                )))
            }
        }

        let closes: Vec<f64> = self.c.iter().filter_map(Value::as_f64).collect();
        let timestamps: Vec<UtcDateTime> = self
            .t
            .iter()
            .filter_map(Value::as_i64)
            .filter_map(|seconds| UtcDateTime::from_unix(seconds).ok())
            .collect();

        // Timestamps are only meaningful when they line up one-to-one.
        let timestamps = if timestamps.len() == closes.len() && closes.len() == self.c.len() {
            timestamps
        } else {
            Vec::new()
        };

        Ok(PriceHistory {
            symbol,
            closes,
            timestamps,
        })
    }
}

impl DirectoryRow {
    fn into_entry(self) -> Option<SearchEntry> {
        let symbol = Symbol::parse(&self.symbol).ok()?;
        let entry = SearchEntry::new(symbol);
        Some(match self.description {
            Some(description) if !description.trim().is_empty() => {
                entry.with_description(description.trim())
            }
            _ => entry,
        })
    }
}
