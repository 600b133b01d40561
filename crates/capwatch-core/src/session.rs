//! The pipeline session actor.
//!
//! One task owns a [`PipelineState`]. User commands arrive on a bounded `mpsc`
//! channel, load and enrichment results on an internal unbounded one, and each
//! handled message publishes a fresh [`Snapshot`] on a `watch` channel. The
//! actor stops when the last [`SessionHandle`] is dropped.

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::enrich::enrich;
use crate::error::PipelineError;
use crate::fetcher::MetricsFetcher;
use crate::pipeline::{EnrichmentJob, PipelineState, Snapshot};
use crate::ranker::{large_cap_universe, Ranker};
use crate::search::SymbolUniverse;
use crate::{EnrichedEntry, RankedEntry, Symbol};

const DEFAULT_COMMAND_BUFFER: usize = 32;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub exchange: String,
    pub large_caps: Vec<Symbol>,
    pub initial_query: String,
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            exchange: String::from("US"),
            large_caps: large_cap_universe(),
            initial_query: String::new(),
            command_buffer: DEFAULT_COMMAND_BUFFER,
        }
    }
}

impl SessionConfig {
    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = exchange.into();
        self
    }

    pub fn with_large_caps(mut self, large_caps: Vec<Symbol>) -> Self {
        self.large_caps = large_caps;
        self
    }

    pub fn with_initial_query(mut self, query: impl Into<String>) -> Self {
        self.initial_query = query.into();
        self
    }
}

#[derive(Debug)]
enum Command {
    SetQuery {
        query: String,
        reply: oneshot::Sender<Snapshot>,
    },
    ToggleFavorite {
        symbol: Symbol,
        reply: oneshot::Sender<bool>,
    },
}

#[derive(Debug)]
enum Event {
    RankedLoaded(Result<Vec<RankedEntry>, PipelineError>),
    UniverseLoaded(Result<SymbolUniverse, PipelineError>),
    EnrichmentFinished {
        version: u64,
        entries: Vec<EnrichedEntry>,
    },
}

/// Client side of a running session. Cloning shares the same actor.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<Snapshot>,
}

impl SessionHandle {
    /// Replaces the query. Resolves once the new merge has been published.
    pub async fn set_query(&self, query: impl Into<String>) -> Result<Snapshot, PipelineError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::SetQuery {
            query: query.into(),
            reply,
        })
        .await?;
        response.await.map_err(|_| PipelineError::SessionClosed)
    }

    /// Returns whether `symbol` is a favorite after the toggle.
    pub async fn toggle_favorite(&self, symbol: Symbol) -> Result<bool, PipelineError> {
        let (reply, response) = oneshot::channel();
        self.send(Command::ToggleFavorite { symbol, reply }).await?;
        response.await.map_err(|_| PipelineError::SessionClosed)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.clone()
    }

    /// Waits until both bulk loads have finished and the current version has
    /// no enrichment outstanding.
    pub async fn settled(&self) -> Result<Snapshot, PipelineError> {
        let mut snapshots = self.snapshots.clone();
        let settled = snapshots
            .wait_for(Snapshot::is_settled)
            .await
            .map_err(|_| PipelineError::SessionClosed)?;
        Ok((*settled).clone())
    }

    async fn send(&self, command: Command) -> Result<(), PipelineError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| PipelineError::SessionClosed)
    }
}

/// Starts a session and kicks off both bulk loads. Must be called from within a
/// tokio runtime.
pub fn spawn_session(fetcher: MetricsFetcher, config: SessionConfig) -> SessionHandle {
    let (command_tx, command_rx) = mpsc::channel(config.command_buffer.max(1));
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let mut state = PipelineState::new();
    let initial_job = state.set_query(config.initial_query.clone());
    let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());

    let actor = SessionActor {
        fetcher,
        state,
        commands: command_rx,
        events: event_rx,
        event_tx,
        snapshots: snapshot_tx,
    };
    actor.start_loads(&config);
    actor.launch(initial_job);
    tokio::spawn(actor.run());

    SessionHandle {
        commands: command_tx,
        snapshots: snapshot_rx,
    }
}

struct SessionActor {
    fetcher: MetricsFetcher,
    state: PipelineState,
    commands: mpsc::Receiver<Command>,
    events: mpsc::UnboundedReceiver<Event>,
    event_tx: mpsc::UnboundedSender<Event>,
    snapshots: watch::Sender<Snapshot>,
}

impl SessionActor {
    fn start_loads(&self, config: &SessionConfig) {
        let ranker = Ranker::with_universe(self.fetcher.clone(), config.large_caps.clone());
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            let result = ranker.rank().await;
            let _ = events.send(Event::RankedLoaded(result));
        });

        let fetcher = self.fetcher.clone();
        let exchange = config.exchange.clone();
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            let result = SymbolUniverse::load(fetcher.source(), &exchange).await;
            let _ = events.send(Event::UniverseLoaded(result));
        });
    }

    async fn run(mut self) {
        info!(version = self.state.version(), "pipeline session started");
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                Some(event) = self.events.recv() => self.handle_event(event),
            }
        }
        info!(version = self.state.version(), "pipeline session stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::SetQuery { query, reply } => {
                debug!(query = query.as_str(), "query changed");
                let job = self.state.set_query(query);
                self.launch(job);
                let _ = reply.send(self.publish());
            }
            Command::ToggleFavorite { symbol, reply } => {
                let favorite = self.state.toggle_favorite(symbol);
                self.publish();
                let _ = reply.send(favorite);
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::RankedLoaded(result) => {
                if let Err(error) = &result {
                    warn!(error = %error, "ranked list unavailable");
                }
                let job = self.state.ranked_loaded(result);
                self.launch(job);
            }
            Event::UniverseLoaded(result) => {
                if let Err(error) = &result {
                    warn!(error = %error, "symbol universe unavailable");
                }
                let job = self.state.universe_loaded(result);
                self.launch(job);
            }
            Event::EnrichmentFinished { version, entries } => {
                if !self.state.apply_enrichment(version, entries) {
                    return;
                }
            }
        }
        self.publish();
    }

    /// Spawns an enrichment pass. Passes are never cancelled; a superseded one
    /// finishes and its result is dropped on arrival.
    fn launch(&self, job: Option<EnrichmentJob>) {
        let Some(EnrichmentJob { version, entries }) = job else {
            return;
        };
        debug!(version, entries = entries.len(), "starting enrichment pass");

        let fetcher = self.fetcher.clone();
        let events = self.event_tx.clone();
        tokio::spawn(async move {
            let entries = enrich(&fetcher, entries).await;
            let _ = events.send(Event::EnrichmentFinished { version, entries });
        });
    }

    fn publish(&self) -> Snapshot {
        let snapshot = self.state.snapshot();
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }
}
