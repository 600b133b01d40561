use crate::data_source::CandleRequest;
use crate::fetcher::MetricsFetcher;
use crate::{PriceHistory, StockDetail, Symbol, UtcDateTime};

/// Length of the detail chart window.
pub const HISTORY_DAYS: u32 = 30;

/// Loads the detail view for `symbol`: market cap, full quote and the daily
/// closes for the `days` ending at `now`. The three requests run concurrently
/// and each degrades to empty on failure.
pub async fn load_detail(
    fetcher: &MetricsFetcher,
    symbol: Symbol,
    days: u32,
    now: UtcDateTime,
) -> StockDetail {
    let request = CandleRequest::trailing_days(symbol.clone(), days, now);

    let (market_cap, quote, history) = tokio::join!(
        fetcher.market_cap(&symbol),
        fetcher.quote(&symbol),
        fetcher.history(&request),
    );

    StockDetail {
        market_cap,
        quote: quote.unwrap_or_default(),
        history: history.unwrap_or_else(|| PriceHistory::empty(symbol.clone())),
        symbol,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSource;
    use std::sync::Arc;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    #[tokio::test]
    async fn assembles_detail_from_three_fetches() {
        let source = FakeSource::new()
            .with_cap("AAPL", 3_000_000.0)
            .with_price("AAPL", 190.0)
            .with_closes("AAPL", vec![185.0, 187.5, 190.0]);
        let fetcher = MetricsFetcher::new(Arc::new(source));

        let detail = load_detail(&fetcher, symbol("AAPL"), HISTORY_DAYS, UtcDateTime::now()).await;

        assert_eq!(detail.market_cap, Some(3_000_000.0));
        assert_eq!(detail.quote.current_price, Some(190.0));
        assert_eq!(detail.history.closes, vec![185.0, 187.5, 190.0]);
    }

    #[tokio::test]
    async fn failed_pieces_degrade_to_empty() {
        let source = FakeSource::new().failing_metric("AAPE").failing_quote("AAPE");
        let fetcher = MetricsFetcher::new(Arc::new(source));

        let detail = load_detail(&fetcher, symbol("AAPE"), HISTORY_DAYS, UtcDateTime::now()).await;

        assert_eq!(detail.market_cap, None);
        assert_eq!(detail.quote, crate::Quote::default());
        assert!(detail.history.is_empty());
    }
}
