use tracing::info;

use crate::data_source::MarketDataSource;
use crate::error::PipelineError;
use crate::{normalize_query, SearchEntry};

/// The full symbol directory of one exchange, in provider order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SymbolUniverse {
    entries: Vec<SearchEntry>,
}

impl SymbolUniverse {
    pub fn new(entries: Vec<SearchEntry>) -> Self {
        Self { entries }
    }

    /// Fetches the directory. Unlike per-symbol fetches this one is load-bearing,
    /// so a failure is returned to the caller instead of degrading.
    pub async fn load(source: &dyn MarketDataSource, exchange: &str) -> Result<Self, PipelineError> {
        let entries = source
            .symbol_directory(exchange)
            .await
            .map_err(PipelineError::DirectoryUnavailable)?;
        info!(exchange, symbols = entries.len(), "loaded symbol directory");
        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[SearchEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose symbol starts with `query`, ignoring case. A blank query
    /// matches nothing.
    pub fn filter_prefix(&self, query: &str) -> Vec<&SearchEntry> {
        let prefix = normalize_query(query);
        if prefix.is_empty() {
            return Vec::new();
        }
        self.entries
            .iter()
            .filter(|entry| entry.symbol.starts_with(&prefix))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSource;
    use crate::Symbol;

    fn universe(symbols: &[&str]) -> SymbolUniverse {
        SymbolUniverse::new(
            symbols
                .iter()
                .map(|s| SearchEntry::new(Symbol::parse(s).expect("valid symbol")))
                .collect(),
        )
    }

    fn names(entries: Vec<&SearchEntry>) -> Vec<&str> {
        entries.into_iter().map(|e| e.symbol.as_str()).collect()
    }

    #[test]
    fn prefix_filter_is_case_insensitive_and_ordered() {
        let universe = universe(&["AAPL", "MSFT", "AAPE", "AAP"]);

        assert_eq!(names(universe.filter_prefix("aap")), vec!["AAPL", "AAPE", "AAP"]);
        assert_eq!(names(universe.filter_prefix(" Ms ")), vec!["MSFT"]);
        assert!(universe.filter_prefix("ZZ").is_empty());
    }

    #[test]
    fn blank_query_matches_nothing() {
        let universe = universe(&["AAPL"]);
        assert!(universe.filter_prefix("").is_empty());
        assert!(universe.filter_prefix("   ").is_empty());
    }

    #[test]
    fn same_inputs_give_same_output() {
        let universe = universe(&["AAPL", "AAPE", "AMZN"]);
        assert_eq!(universe.filter_prefix("a"), universe.filter_prefix("A"));
    }

    #[tokio::test]
    async fn directory_failure_is_a_pipeline_error() {
        let source = FakeSource::new().failing_directory();

        let err = SymbolUniverse::load(&source, "US")
            .await
            .expect_err("must fail");

        assert!(matches!(err, PipelineError::DirectoryUnavailable(_)));
    }

    #[tokio::test]
    async fn loads_directory_in_provider_order() {
        let source = FakeSource::new().with_directory(&["MSFT", "AAPL"]);

        let universe = SymbolUniverse::load(&source, "US").await.expect("loaded");

        assert_eq!(universe.len(), 2);
        assert_eq!(universe.entries()[0].symbol.as_str(), "MSFT");
    }
}
