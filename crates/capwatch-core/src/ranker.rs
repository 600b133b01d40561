//! Top-N large-cap ranking.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::data_source::SourceError;
use crate::error::PipelineError;
use crate::fetcher::MetricsFetcher;
use crate::{RankedEntry, Symbol};

/// Maximum length of the ranked list.
pub const RANKED_LIMIT: usize = 50;

/// Tickers eligible for ranking.
pub const LARGE_CAP_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "AMZN", "GOOGL", "META", "TSLA", "NVDA", "BRK.A", "UNH", "JNJ", "V", "XOM",
    "WMT", "JPM", "MA", "LLY", "PG", "HD", "MRK", "BAC", "CVX", "PFE", "ABBV", "PEP", "KO",
    "COST", "TMO", "AVGO", "DIS", "CSCO", "ADBE", "ABT", "NKE", "CMCSA", "WFC", "VZ", "ACN",
    "DHR", "INTC", "TXN", "MCD", "CRM", "HON", "LIN", "IBM", "AMGN", "MDT", "PM", "ORCL", "UPS",
];

/// The large-cap universe as validated symbols, in declaration order.
pub fn large_cap_universe() -> Vec<Symbol> {
    LARGE_CAP_SYMBOLS
        .iter()
        .filter_map(|raw| Symbol::parse(raw).ok())
        .collect()
}

/// Builds the ranked list for a fixed universe.
#[derive(Clone)]
pub struct Ranker {
    fetcher: MetricsFetcher,
    universe: Vec<Symbol>,
    limit: usize,
}

impl Ranker {
    pub fn new(fetcher: MetricsFetcher) -> Self {
        Self::with_universe(fetcher, large_cap_universe())
    }

    /// Duplicate symbols in `universe` are ignored after their first occurrence.
    pub fn with_universe(fetcher: MetricsFetcher, universe: Vec<Symbol>) -> Self {
        let mut seen = HashSet::new();
        let universe = universe
            .into_iter()
            .filter(|symbol| seen.insert(symbol.clone()))
            .collect();
        Self {
            fetcher,
            universe,
            limit: RANKED_LIMIT,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn universe(&self) -> &[Symbol] {
        &self.universe
    }

    /// Ranks the universe by market cap, descending, then prices the survivors.
    ///
    /// A symbol whose market cap is missing or failed is dropped; a symbol whose
    /// price failed keeps its rank with `current_price: None`. Fails only when
    /// every market cap request failed outright.
    pub async fn rank(&self) -> Result<Vec<RankedEntry>, PipelineError> {
        let fetcher = &self.fetcher;
        let caps = fetcher
            .fan_out(self.universe.clone(), move |symbol| async move {
                let result = fetcher.try_market_cap(&symbol).await;
                (symbol, result)
            })
            .await;

        let mut failures = 0;
        let mut last_error: Option<SourceError> = None;
        let mut capped: Vec<(Symbol, f64)> = Vec::with_capacity(caps.len());
        for (symbol, result) in caps {
            match result {
                Ok(Some(market_cap)) => capped.push((symbol, market_cap)),
                Ok(None) => {}
                Err(error) => {
                    warn!(
                        symbol = symbol.as_str(),
                        code = error.code(),
                        error = %error,
                        "market cap fetch failed; dropping symbol from ranking"
                    );
                    failures += 1;
                    last_error = Some(error);
                }
            }
        }

        if let Some(last_error) = last_error {
            if failures == self.universe.len() {
                return Err(PipelineError::RankingUnavailable {
                    attempted: failures,
                    last_error,
                });
            }
        }

        let top = top_by_market_cap(capped, self.limit);

        let ranked = fetcher
            .fan_out(top, move |(symbol, market_cap)| async move {
                let current_price = fetcher.current_price(&symbol).await;
                RankedEntry {
                    symbol,
                    market_cap,
                    current_price,
                }
            })
            .await;

        info!(
            universe = self.universe.len(),
            ranked = ranked.len(),
            cap_failures = failures,
            "ranked large-cap universe"
        );
        Ok(ranked)
    }
}

/// Stable descending sort by market cap, truncated to `limit`. Ties keep input order.
pub fn top_by_market_cap(mut capped: Vec<(Symbol, f64)>, limit: usize) -> Vec<(Symbol, f64)> {
    capped.sort_by(|(_, a), (_, b)| b.total_cmp(a));
    capped.truncate(limit);
    capped
}
