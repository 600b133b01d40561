//! Market data source trait and request/error types.
//!
//! This module defines the contract (`MarketDataSource`) that provider
//! adapters implement, along with the structured error every call returns.
//!
//! # Endpoints
//!
//! | Endpoint | Request | Response | Description |
//! |----------|---------|----------|-------------|
//! | Metric | [`Symbol`] | [`Metric`] | Fundamental metrics (market cap) |
//! | Quote | [`Symbol`] | [`Quote`] | Current/open/high/low/previous close |
//! | Candle | [`CandleRequest`] | [`PriceHistory`] | Daily closing series |
//! | Symbol directory | exchange code | [`SearchEntry`] list | Every listed ticker |
//!
//! # Example
//!
//! ```rust,ignore
//! use capwatch_core::{MarketDataSource, SourceError, Symbol};
//!
//! async fn print_cap(source: &dyn MarketDataSource) -> Result<(), SourceError> {
//!     let symbol = Symbol::parse("AAPL").expect("valid");
//!     let metric = source.metric(&symbol).await?;
//!     println!("{symbol}: {:?}", metric.market_cap);
//!     Ok(())
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{Metric, PriceHistory, Quote, SearchEntry, Symbol, UtcDateTime};

/// Provider endpoint, used in logs and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Metric,
    Quote,
    Candle,
    SymbolDirectory,
}

impl Endpoint {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Metric => "metric",
            Self::Quote => "quote",
            Self::Candle => "candle",
            Self::SymbolDirectory => "symbol_directory",
        }
    }
}

impl Display for Endpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Transport failure: timeout, refused connection, broken body.
    Transport,
    /// Non-success HTTP status.
    Unavailable,
    /// HTTP 429 after the retry budget ran out.
    RateLimited,
    /// The body was not the JSON shape the endpoint promises.
    MalformedResponse,
}

/// Structured error returned by every source call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Transport,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::MalformedResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Transport => "source.transport",
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::MalformedResponse => "source.malformed_response",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Request payload for the daily candle endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleRequest {
    pub symbol: Symbol,
    pub from: UtcDateTime,
    pub to: UtcDateTime,
}

impl CandleRequest {
    /// The `days`-long window ending at `now`.
    pub fn trailing_days(symbol: Symbol, days: u32, now: UtcDateTime) -> Self {
        Self {
            symbol,
            from: now.days_before(days),
            to: now,
        }
    }
}

/// Boxed future returned by [`MarketDataSource`] methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Market data provider contract.
///
/// Every method performs exactly one logical provider call (retries aside) and
/// reports failure as a [`SourceError`]; deciding whether a failure is fatal is
/// left to the caller.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the ranker and the enrichment pass
/// issue calls concurrently from several tasks.
pub trait MarketDataSource: Send + Sync {
    /// Fetches fundamental metrics. A response without a numeric market cap is
    /// `Ok` with `market_cap: None`.
    fn metric<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Metric>;

    /// Fetches the current price snapshot.
    fn quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Quote>;

    /// Fetches daily closes in the requested range. A range with no data is an
    /// empty history, not an error.
    fn candles<'a>(&'a self, req: &'a CandleRequest) -> SourceFuture<'a, PriceHistory>;

    /// Fetches every listed symbol of an exchange.
    fn symbol_directory<'a>(&'a self, exchange: &'a str) -> SourceFuture<'a, Vec<SearchEntry>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(SourceError::transport("x").code(), "source.transport");
        assert_eq!(SourceError::unavailable("x").code(), "source.unavailable");
        assert_eq!(SourceError::rate_limited("x").code(), "source.rate_limited");
        assert_eq!(
            SourceError::malformed("x").code(),
            "source.malformed_response"
        );
        assert!(!SourceError::malformed("x").retryable());
    }

    #[test]
    fn trailing_window_ends_now() {
        let symbol = Symbol::parse("AAPL").expect("valid");
        let now = UtcDateTime::from_unix(1_704_067_200).expect("in range");

        let trailing = CandleRequest::trailing_days(symbol, 30, now);
        assert_eq!(trailing.to, now);
        assert!(trailing.from <= trailing.to);
        assert_eq!(trailing.to.unix_timestamp() - trailing.from.unix_timestamp(), 30 * 86_400);
    }
}
