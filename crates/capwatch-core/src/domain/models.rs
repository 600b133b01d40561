use serde::Serialize;

use crate::{Symbol, UtcDateTime};

/// Instantaneous price snapshot. Missing or unusable fields are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Quote {
    pub current_price: Option<f64>,
    pub open_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub previous_close: Option<f64>,
}

/// Fundamental metrics for a symbol.
///
/// `market_cap` is reported by the provider in millions of the quote currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metric {
    pub market_cap: Option<f64>,
}

/// One row of the large-cap ranking. Only symbols with a known market cap rank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub symbol: Symbol,
    pub market_cap: f64,
    pub current_price: Option<f64>,
}

/// One row of the exchange symbol directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchEntry {
    pub symbol: Symbol,
    pub description: Option<String>,
}

impl SearchEntry {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A displayed list row: either a ranked entry or a search placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedEntry {
    pub symbol: Symbol,
    pub market_cap: Option<f64>,
    pub current_price: Option<f64>,
}

/// A merged row after the enrichment pass has run over it.
pub type EnrichedEntry = MergedEntry;

impl MergedEntry {
    pub fn placeholder(symbol: Symbol) -> Self {
        Self {
            symbol,
            market_cap: None,
            current_price: None,
        }
    }

    /// A placeholder has no metrics at all yet.
    pub fn is_placeholder(&self) -> bool {
        self.market_cap.is_none() && self.current_price.is_none()
    }
}

impl From<&RankedEntry> for MergedEntry {
    fn from(entry: &RankedEntry) -> Self {
        Self {
            symbol: entry.symbol.clone(),
            market_cap: Some(entry.market_cap),
            current_price: entry.current_price,
        }
    }
}

/// Daily closing-price series for the detail chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    pub symbol: Symbol,
    pub closes: Vec<f64>,
    /// Bar timestamps, aligned with `closes`. Empty when the provider omits them.
    pub timestamps: Vec<UtcDateTime>,
}

impl PriceHistory {
    pub fn empty(symbol: Symbol) -> Self {
        Self {
            symbol,
            closes: Vec::new(),
            timestamps: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }
}

/// Everything the detail view shows for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockDetail {
    pub symbol: Symbol,
    pub market_cap: Option<f64>,
    pub quote: Quote,
    pub history: PriceHistory,
}

/// Keeps only finite, strictly positive prices. The provider reports `0` for
/// symbols it has no data for.
pub(crate) fn positive_finite(value: Option<f64>) -> Option<f64> {
    value.filter(|price| price.is_finite() && *price > 0.0)
}
