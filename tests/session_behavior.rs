//! Behavior tests for the pipeline session actor.
//!
//! Each test drives a live session over an in-memory source and observes it
//! only through published snapshots.

use std::sync::Arc;
use std::time::Duration;

use capwatch_core::testing::FakeSource;
use capwatch_core::{
    spawn_session, Endpoint, MetricsFetcher, PageRequest, PipelineStatus, SessionConfig,
    SessionHandle, Snapshot, Symbol,
};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).expect("valid symbol")
}

fn source() -> FakeSource {
    FakeSource::new()
        .with_cap("AAPL", 2_900_000.0)
        .with_price("AAPL", 190.0)
        .with_cap("MSFT", 3_100_000.0)
        .with_price("MSFT", 420.0)
        .with_cap("AAPE", 1_200.0)
        .with_price("AAPE", 4.2)
        .with_directory(&["AAPL", "AAPE", "MSFT", "MSFO"])
}

fn start(source: FakeSource) -> SessionHandle {
    let config = SessionConfig::default().with_large_caps(vec![symbol("AAPL"), symbol("MSFT")]);
    spawn_session(MetricsFetcher::new(Arc::new(source)), config)
}

async fn settled(session: &SessionHandle) -> Snapshot {
    timeout(WAIT, session.settled())
        .await
        .expect("session settles in time")
        .expect("session is running")
}

fn names(snapshot: &Snapshot) -> Vec<&str> {
    snapshot.entries.iter().map(|e| e.symbol.as_str()).collect()
}

#[tokio::test]
async fn when_session_starts_system_publishes_the_ranked_list() {
    // Given: A fresh session
    let session = start(source());

    // When: Both bulk loads finish
    let snapshot = settled(&session).await;

    // Then: The blank query shows the ranked list, largest first
    assert_eq!(snapshot.status, PipelineStatus::Ready);
    assert_eq!(names(&snapshot), vec!["MSFT", "AAPL"]);
    assert!(!snapshot.enriching);
}

#[tokio::test]
async fn when_query_changes_system_publishes_placeholders_then_enriched_rows() {
    // Given: A settled session
    let session = start(source());
    settled(&session).await;

    // When: The user searches for "aap"
    let immediate = session.set_query("aap").await.expect("query accepted");
    let finished = settled(&session).await;

    // Then: The merge is published at once and enrichment replaces it whole
    assert_eq!(names(&immediate), vec!["AAPL", "AAPE"]);
    assert!(immediate.entries[1].is_placeholder());
    assert!(immediate.enriching);

    assert_eq!(finished.version, immediate.version);
    assert_eq!(finished.entries[0].market_cap, Some(2_900_000.0));
    assert_eq!(finished.entries[1].market_cap, Some(1_200.0));
    assert_eq!(finished.entries[1].current_price, Some(4.2));
}

#[tokio::test]
async fn when_older_enrichment_finishes_late_system_ignores_it() {
    // Given: A placeholder whose fetches are slow
    let session = start(source().with_delay("AAPE", Duration::from_millis(200)));
    settled(&session).await;

    // When: The query moves on before the slow pass finishes
    let slow = session.set_query("AAPE").await.expect("query accepted");
    let current = session.set_query("MS").await.expect("query accepted");
    let settled_now = settled(&session).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    let later = session.snapshot();

    // Then: Only the latest query's rows are ever shown
    assert!(current.version > slow.version);
    assert_eq!(settled_now.query, "MS");
    assert_eq!(names(&settled_now), vec!["MSFT", "MSFO"]);
    assert_eq!(later.version, current.version);
    assert_eq!(names(&later), vec!["MSFT", "MSFO"]);
}

#[tokio::test]
async fn when_directory_fails_system_reports_failure_without_partial_rows() {
    // Given: A source whose directory endpoint is down but whose ranking works
    let session = start(source().failing_directory());

    // When: Both bulk loads have finished
    let snapshot = timeout(WAIT, async {
        let mut snapshots = session.subscribe();
        let found = snapshots
            .wait_for(|s| s.is_settled() && s.version > 1)
            .await
            .expect("session is running");
        (*found).clone()
    })
    .await
    .expect("both loads finish");

    // Then: Only the failure is published, with no rows from the ranked list
    assert!(matches!(snapshot.status, PipelineStatus::Failed(_)));
    assert!(snapshot.entries.is_empty());
    assert_eq!(snapshot.page(PageRequest::first(), false).total, 0);
}

#[tokio::test]
async fn when_same_query_is_entered_again_system_keeps_enriched_rows() {
    // Given: A session that has enriched the results for "aap"
    let source = Arc::new(source());
    let config = SessionConfig::default().with_large_caps(vec![symbol("AAPL"), symbol("MSFT")]);
    let session = spawn_session(MetricsFetcher::new(source.clone()), config);
    settled(&session).await;
    let first = session.set_query("aap").await.expect("query accepted");
    let enriched = settled(&session).await;
    let metric_calls = source.call_count(Endpoint::Metric);

    // When: The same query is entered with different case and spacing
    let again = session.set_query(" AAP ").await.expect("query accepted");

    // Then: The enriched rows stay published and nothing is fetched again
    assert_eq!(again.version, first.version);
    assert_eq!(again.entries, enriched.entries);
    assert!(!again.enriching);
    assert_eq!(again.entries[1].market_cap, Some(1_200.0));
    assert_eq!(source.call_count(Endpoint::Metric), metric_calls);
}

#[tokio::test]
async fn when_favorite_is_toggled_system_publishes_it() {
    // Given: A settled session
    let session = start(source());
    settled(&session).await;

    // When: AAPL is toggled twice and MSFT once
    let first = session.toggle_favorite(symbol("AAPL")).await.expect("toggled");
    let second = session.toggle_favorite(symbol("AAPL")).await.expect("toggled");
    session.toggle_favorite(symbol("MSFT")).await.expect("toggled");
    let snapshot = session.snapshot();

    // Then: Toggling flips membership and the view filters by it
    assert!(first);
    assert!(!second);
    assert!(snapshot.is_favorite(&symbol("MSFT")));
    assert!(!snapshot.is_favorite(&symbol("AAPL")));
    assert_eq!(snapshot.favorite_entries().len(), 1);
}

#[tokio::test]
async fn when_all_handles_are_dropped_system_stops_the_session() {
    // Given: A running session with an outside snapshot subscriber
    let session = start(source());
    let mut snapshots = session.subscribe();

    // When: The last handle is dropped
    drop(session);

    // Then: The snapshot channel closes
    let closed = timeout(WAIT, async {
        while snapshots.changed().await.is_ok() {}
    })
    .await;
    assert!(closed.is_ok());
}
