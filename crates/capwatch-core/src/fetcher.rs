//! Per-symbol metric and quote fetching with null-on-failure semantics.
//!
//! The fetcher is the boundary where per-symbol failures stop: the `try_*`
//! methods expose the [`SourceError`] for callers that need to count failures,
//! every other method logs the error and yields `None`.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::warn;

use crate::data_source::{CandleRequest, Endpoint, MarketDataSource, SourceError};
use crate::{PriceHistory, Quote, Symbol};

pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Shared handle over a market data source. Cheap to clone.
#[derive(Clone)]
pub struct MetricsFetcher {
    source: Arc<dyn MarketDataSource>,
    max_concurrency: usize,
}

impl MetricsFetcher {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    pub fn source(&self) -> &dyn MarketDataSource {
        self.source.as_ref()
    }

    pub async fn try_market_cap(&self, symbol: &Symbol) -> Result<Option<f64>, SourceError> {
        self.source.metric(symbol).await.map(|metric| metric.market_cap)
    }

    pub async fn try_current_price(&self, symbol: &Symbol) -> Result<Option<f64>, SourceError> {
        self.source.quote(symbol).await.map(|quote| quote.current_price)
    }

    pub async fn market_cap(&self, symbol: &Symbol) -> Option<f64> {
        let result = self.try_market_cap(symbol).await;
        swallow(Endpoint::Metric, symbol, result).flatten()
    }

    pub async fn current_price(&self, symbol: &Symbol) -> Option<f64> {
        let result = self.try_current_price(symbol).await;
        swallow(Endpoint::Quote, symbol, result).flatten()
    }

    pub async fn quote(&self, symbol: &Symbol) -> Option<Quote> {
        let result = self.source.quote(symbol).await;
        swallow(Endpoint::Quote, symbol, result)
    }

    pub async fn history(&self, req: &CandleRequest) -> Option<PriceHistory> {
        let result = self.source.candles(req).await;
        swallow(Endpoint::Candle, &req.symbol, result)
    }

    /// Runs `f` over `items` with at most `max_concurrency` in flight.
    pub async fn fan_out<T, R, F, Fut>(&self, items: impl IntoIterator<Item = T>, f: F) -> Vec<R>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = R>,
    {
        fan_out(items, self.max_concurrency, f).await
    }
}

/// Bounded-concurrency map that keeps input order regardless of completion
/// order. Each task owns its own failure handling.
pub async fn fan_out<T, R, F, Fut>(items: impl IntoIterator<Item = T>, limit: usize, f: F) -> Vec<R>
where
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items)
        .map(f)
        .buffered(limit.max(1))
        .collect()
        .await
}

fn swallow<T>(endpoint: Endpoint, symbol: &Symbol, result: Result<T, SourceError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(
                symbol = symbol.as_str(),
                endpoint = endpoint.as_str(),
                code = error.code(),
                error = %error,
                "fetch failed; treating value as missing"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSource;
    use std::time::Duration;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    #[tokio::test]
    async fn failures_become_missing_values() {
        let source = FakeSource::new()
            .with_cap("AAPL", 3_000_000.0)
            .failing_metric("MSFT")
            .failing_quote("AAPL");
        let fetcher = MetricsFetcher::new(Arc::new(source));

        assert_eq!(fetcher.market_cap(&symbol("AAPL")).await, Some(3_000_000.0));
        assert_eq!(fetcher.market_cap(&symbol("MSFT")).await, None);
        assert_eq!(fetcher.current_price(&symbol("AAPL")).await, None);
        assert!(fetcher.try_market_cap(&symbol("MSFT")).await.is_err());
    }

    #[tokio::test]
    async fn fan_out_preserves_input_order() {
        let delays = vec![30_u64, 0, 10, 20];

        let out = fan_out(delays.clone(), 4, |ms| async move {
            tokio::time::sleep(Duration::from_millis(ms)).await;
            ms
        })
        .await;

        assert_eq!(out, delays);
    }

    #[tokio::test]
    async fn fan_out_isolates_failed_tasks() {
        let out = fan_out(1..=5, 2, |n| async move {
            if n % 2 == 0 {
                None
            } else {
                Some(n)
            }
        })
        .await;

        assert_eq!(out, vec![Some(1), None, Some(3), None, Some(5)]);
    }
}
