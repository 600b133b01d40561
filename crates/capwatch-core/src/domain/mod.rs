//! # Domain Models
//!
//! Types that flow through the ranking, search and enrichment pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated, uppercase ticker |
//! | [`Quote`] | Price snapshot (current, open, high, low, previous close) |
//! | [`Metric`] | Fundamental metrics (market cap) |
//! | [`RankedEntry`] | Row of the large-cap ranking |
//! | [`SearchEntry`] | Row of the exchange symbol directory |
//! | [`MergedEntry`] | Displayed row, possibly a placeholder awaiting enrichment |
//! | [`PriceHistory`] | Daily closing prices for the detail chart |
//! | [`StockDetail`] | Detail view payload |
//! | [`UtcDateTime`] | UTC instant |
//!
//! Every value fetched from the provider is optional: a field that could not be
//! fetched or parsed is `None`, never an error.

mod models;
mod symbol;
mod timestamp;

pub(crate) use models::positive_finite;
pub use models::{
    EnrichedEntry, MergedEntry, Metric, PriceHistory, Quote, RankedEntry, SearchEntry,
    StockDetail,
};
pub use symbol::{normalize_query, Symbol};
pub use timestamp::UtcDateTime;
