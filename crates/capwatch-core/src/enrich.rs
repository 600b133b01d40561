//! Lazy enrichment of placeholder rows.

use tracing::debug;

use crate::fetcher::MetricsFetcher;
use crate::{EnrichedEntry, MergedEntry};

/// Fills in metrics for every placeholder in `entries`.
///
/// Works on the owned list and returns it whole, so callers publish either the
/// previous list or the fully processed one, never something in between. Each
/// placeholder fetches its market cap, then its price; a failed fetch leaves
/// that field `None` and the pass moves on. Rows that already carry metrics are
/// returned untouched.
pub async fn enrich(fetcher: &MetricsFetcher, entries: Vec<MergedEntry>) -> Vec<EnrichedEntry> {
    let placeholders = entries.iter().filter(|e| e.is_placeholder()).count();
    if placeholders == 0 {
        return entries;
    }

    let enriched = fetcher
        .fan_out(entries, move |entry| async move {
            if !entry.is_placeholder() {
                return entry;
            }
            let market_cap = fetcher.market_cap(&entry.symbol).await;
            let current_price = fetcher.current_price(&entry.symbol).await;
            MergedEntry {
                market_cap,
                current_price,
                ..entry
            }
        })
        .await;

    let unresolved = enriched.iter().filter(|e| e.is_placeholder()).count();
    debug!(placeholders, unresolved, "enrichment pass finished");

    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::Endpoint;
    use crate::testing::FakeSource;
    use crate::Symbol;
    use std::sync::Arc;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    fn populated(raw: &str) -> MergedEntry {
        MergedEntry {
            symbol: symbol(raw),
            market_cap: Some(3_000_000.0),
            current_price: Some(190.0),
        }
    }

    #[tokio::test]
    async fn populated_rows_are_left_alone() {
        let source = Arc::new(FakeSource::new());
        let fetcher = MetricsFetcher::new(source.clone());
        let entries = vec![populated("AAPL"), populated("MSFT")];

        let enriched = enrich(&fetcher, entries.clone()).await;

        assert_eq!(enriched, entries);
        assert!(source.calls().is_empty());
    }

    #[tokio::test]
    async fn fills_placeholders_and_keeps_failures_missing() {
        let source = Arc::new(
            FakeSource::new()
                .with_cap("AAPB", 12_000.0)
                .with_price("AAPB", 30.5)
                .failing_metric("AAPE")
                .with_price("AAPE", 4.2),
        );
        let fetcher = MetricsFetcher::new(source.clone());
        let entries = vec![
            populated("AAPL"),
            MergedEntry::placeholder(symbol("AAPE")),
            MergedEntry::placeholder(symbol("AAPB")),
        ];

        let enriched = enrich(&fetcher, entries).await;

        assert_eq!(enriched[0], populated("AAPL"));
        assert_eq!(enriched[1].market_cap, None);
        assert_eq!(enriched[1].current_price, Some(4.2));
        assert_eq!(enriched[2].market_cap, Some(12_000.0));
        assert_eq!(enriched[2].current_price, Some(30.5));
        assert_eq!(source.call_count(Endpoint::Metric), 2);
    }

    #[tokio::test]
    async fn fetches_market_cap_before_price_for_each_placeholder() {
        let source = Arc::new(FakeSource::new());
        let fetcher = MetricsFetcher::new(source.clone()).with_max_concurrency(1);

        enrich(&fetcher, vec![MergedEntry::placeholder(symbol("AAPE"))]).await;

        let calls = source.calls();
        assert_eq!(calls[0].0, Endpoint::Metric);
        assert_eq!(calls[1].0, Endpoint::Quote);
    }
}
