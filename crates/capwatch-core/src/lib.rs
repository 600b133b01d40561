//! Core pipeline for capwatch.
//!
//! This crate contains:
//! - Domain models and symbol validation
//! - The market data source contract and the Finnhub adapter
//! - Null-on-failure fetching with bounded fan-out
//! - Large-cap ranking, directory search, merge and lazy enrichment
//! - The versioned pipeline state and its session actor
//! - Pagination and the detail view loader

pub mod adapters;
pub mod config;
pub mod data_source;
pub mod detail;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod fetcher;
pub mod http_client;
pub mod merge;
pub mod paginate;
pub mod pipeline;
pub mod provider_policy;
pub mod ranker;
pub mod retry;
pub mod search;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod throttling;

pub use adapters::{FinnhubAdapter, FINNHUB_BASE_URL};
pub use config::Config;
pub use data_source::{
    CandleRequest, Endpoint, MarketDataSource, SourceError, SourceErrorKind, SourceFuture,
};
pub use detail::{load_detail, HISTORY_DAYS};
pub use domain::{
    normalize_query, EnrichedEntry, MergedEntry, Metric, PriceHistory, Quote, RankedEntry,
    SearchEntry, StockDetail, Symbol, UtcDateTime,
};
pub use enrich::enrich;
pub use error::{ConfigError, PipelineError, ValidationError};
pub use fetcher::{fan_out, MetricsFetcher, DEFAULT_MAX_CONCURRENCY};
#[cfg(any(test, feature = "testing"))]
pub use http_client::FixtureHttpClient;
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse, ReqwestHttpClient,
};
pub use merge::merge;
pub use paginate::{paginate, Page, PageRequest, DEFAULT_PAGE_SIZE};
pub use pipeline::{EnrichmentJob, PipelineState, PipelineStatus, Snapshot};
pub use provider_policy::ProviderPolicy;
pub use ranker::{large_cap_universe, Ranker, LARGE_CAP_SYMBOLS, RANKED_LIMIT};
pub use retry::{Backoff, RetryConfig};
pub use search::SymbolUniverse;
pub use session::{spawn_session, SessionConfig, SessionHandle};
pub use throttling::Throttle;
