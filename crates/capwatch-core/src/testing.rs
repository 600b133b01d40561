//! In-memory [`MarketDataSource`] for deterministic offline tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::data_source::{CandleRequest, Endpoint, MarketDataSource, SourceError, SourceFuture};
use crate::{Metric, PriceHistory, Quote, SearchEntry, Symbol};

/// Scripted source. Symbols without a scripted value answer with empty data,
/// symbols marked failing answer with [`SourceError::unavailable`].
#[derive(Debug, Default)]
pub struct FakeSource {
    caps: HashMap<String, f64>,
    prices: HashMap<String, f64>,
    closes: HashMap<String, Vec<f64>>,
    failing_metric: HashSet<String>,
    failing_quote: HashSet<String>,
    delays: HashMap<String, Duration>,
    directory: Vec<SearchEntry>,
    directory_fails: bool,
    calls: Mutex<Vec<(Endpoint, String)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cap(mut self, symbol: &str, market_cap: f64) -> Self {
        self.caps.insert(key(symbol), market_cap);
        self
    }

    pub fn with_price(mut self, symbol: &str, price: f64) -> Self {
        self.prices.insert(key(symbol), price);
        self
    }

    pub fn with_closes(mut self, symbol: &str, closes: Vec<f64>) -> Self {
        self.closes.insert(key(symbol), closes);
        self
    }

    pub fn failing_metric(mut self, symbol: &str) -> Self {
        self.failing_metric.insert(key(symbol));
        self
    }

    pub fn failing_quote(mut self, symbol: &str) -> Self {
        self.failing_quote.insert(key(symbol));
        self
    }

    /// Delays every answer for `symbol`.
    pub fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(key(symbol), delay);
        self
    }

    /// Directory rows; tickers that fail validation are ignored.
    pub fn with_directory(mut self, symbols: &[&str]) -> Self {
        self.directory = symbols
            .iter()
            .filter_map(|raw| Symbol::parse(raw).ok())
            .map(SearchEntry::new)
            .collect();
        self
    }

    pub fn failing_directory(mut self) -> Self {
        self.directory_fails = true;
        self
    }

    /// Calls made so far, in arrival order.
    pub fn calls(&self) -> Vec<(Endpoint, String)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self, endpoint: Endpoint) -> usize {
        self.calls()
            .iter()
            .filter(|(called, _)| *called == endpoint)
            .count()
    }

    fn record(&self, endpoint: Endpoint, subject: &str) -> Option<Duration> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((endpoint, subject.to_owned()));
        self.delays.get(subject).copied()
    }
}

fn key(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

async fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
}

impl MarketDataSource for FakeSource {
    fn metric<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Metric> {
        Box::pin(async move {
            pause(self.record(Endpoint::Metric, symbol.as_str())).await;
            if self.failing_metric.contains(symbol.as_str()) {
                return Err(SourceError::unavailable(format!("metric for {symbol} failed")));
            }
            Ok(Metric {
                market_cap: self.caps.get(symbol.as_str()).copied(),
            })
        })
    }

    fn quote<'a>(&'a self, symbol: &'a Symbol) -> SourceFuture<'a, Quote> {
        Box::pin(async move {
            pause(self.record(Endpoint::Quote, symbol.as_str())).await;
            if self.failing_quote.contains(symbol.as_str()) {
                return Err(SourceError::unavailable(format!("quote for {symbol} failed")));
            }
            Ok(Quote {
                current_price: self.prices.get(symbol.as_str()).copied(),
                ..Quote::default()
            })
        })
    }

    fn candles<'a>(&'a self, req: &'a CandleRequest) -> SourceFuture<'a, PriceHistory> {
        Box::pin(async move {
            pause(self.record(Endpoint::Candle, req.symbol.as_str())).await;
            Ok(match self.closes.get(req.symbol.as_str()) {
                Some(closes) => PriceHistory {
                    symbol: req.symbol.clone(),
                    closes: closes.clone(),
                    timestamps: Vec::new(),
                },
                None => PriceHistory::empty(req.symbol.clone()),
            })
        })
    }

    fn symbol_directory<'a>(&'a self, exchange: &'a str) -> SourceFuture<'a, Vec<SearchEntry>> {
        Box::pin(async move {
            pause(self.record(Endpoint::SymbolDirectory, exchange)).await;
            if self.directory_fails {
                return Err(SourceError::unavailable("symbol directory failed"));
            }
            Ok(self.directory.clone())
        })
    }
}
