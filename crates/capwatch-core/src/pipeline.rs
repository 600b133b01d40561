//! Versioned pipeline state.
//!
//! [`PipelineState`] holds the three merge inputs (query, ranked list, symbol
//! universe) together with the favorite set and the displayed entries. It is
//! plain synchronous data: the session actor drives it and performs all I/O.
//!
//! Every input change re-runs [`merge`]. When the merged rows differ from the
//! previous merge the version is bumped and a new enrichment pass is due; an
//! identical merge keeps the version and whatever enrichment it already has.
//! Enrichment results carry the version they started from and are applied only
//! when that version is still current, so the displayed list is never older
//! than the latest inputs.
//!
//! Once either bulk load has failed, snapshots carry the error and no rows.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::error::PipelineError;
use crate::merge::merge;
use crate::paginate::{paginate, Page, PageRequest};
use crate::search::SymbolUniverse;
use crate::{EnrichedEntry, MergedEntry, RankedEntry, Symbol};

/// Progress of one bulk load.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LoadPhase {
    Pending,
    Done,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum PipelineStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Published view of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub version: u64,
    pub query: String,
    pub status: PipelineStatus,
    pub entries: Vec<MergedEntry>,
    pub enriching: bool,
    pub favorites: BTreeSet<Symbol>,
}

impl Snapshot {
    pub fn is_loading(&self) -> bool {
        self.status == PipelineStatus::Loading
    }

    /// No bulk load outstanding and no enrichment pending for this version.
    pub fn is_settled(&self) -> bool {
        !self.is_loading() && !self.enriching
    }

    pub fn is_favorite(&self, symbol: &Symbol) -> bool {
        self.favorites.contains(symbol)
    }

    /// Displayed entries restricted to favorites, in display order.
    pub fn favorite_entries(&self) -> Vec<MergedEntry> {
        self.entries
            .iter()
            .filter(|entry| self.is_favorite(&entry.symbol))
            .cloned()
            .collect()
    }

    pub fn page(&self, request: PageRequest, favorites_only: bool) -> Page<MergedEntry> {
        if favorites_only {
            paginate(&self.favorite_entries(), request)
        } else {
            paginate(&self.entries, request)
        }
    }
}

/// Work order for one enrichment pass.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentJob {
    pub version: u64,
    pub entries: Vec<MergedEntry>,
}

#[derive(Debug, Clone)]
pub struct PipelineState {
    version: u64,
    query: String,
    ranked: Vec<RankedEntry>,
    universe: SymbolUniverse,
    ranked_phase: LoadPhase,
    universe_phase: LoadPhase,
    favorites: BTreeSet<Symbol>,
    /// Last raw merge output, before enrichment.
    merged: Vec<MergedEntry>,
    entries: Vec<MergedEntry>,
    pending_enrichment: Option<u64>,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineState {
    pub fn new() -> Self {
        Self {
            version: 0,
            query: String::new(),
            ranked: Vec::new(),
            universe: SymbolUniverse::default(),
            ranked_phase: LoadPhase::Pending,
            universe_phase: LoadPhase::Pending,
            favorites: BTreeSet::new(),
            merged: Vec::new(),
            entries: Vec::new(),
            pending_enrichment: None,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn entries(&self) -> &[MergedEntry] {
        &self.entries
    }

    pub fn set_query(&mut self, query: impl Into<String>) -> Option<EnrichmentJob> {
        self.query = query.into();
        self.remerge()
    }

    /// Records the ranking result. A failure leaves the ranked list empty.
    pub fn ranked_loaded(
        &mut self,
        result: Result<Vec<RankedEntry>, PipelineError>,
    ) -> Option<EnrichmentJob> {
        match result {
            Ok(ranked) => {
                self.ranked = ranked;
                self.ranked_phase = LoadPhase::Done;
            }
            Err(error) => {
                self.ranked = Vec::new();
                self.ranked_phase = LoadPhase::Failed(error.to_string());
            }
        }
        self.remerge()
    }

    /// Records the directory result. A failure leaves the universe empty.
    pub fn universe_loaded(
        &mut self,
        result: Result<SymbolUniverse, PipelineError>,
    ) -> Option<EnrichmentJob> {
        match result {
            Ok(universe) => {
                self.universe = universe;
                self.universe_phase = LoadPhase::Done;
            }
            Err(error) => {
                self.universe = SymbolUniverse::default();
                self.universe_phase = LoadPhase::Failed(error.to_string());
            }
        }
        self.remerge()
    }

    /// Flips `symbol` in the favorite set and returns whether it is now a favorite.
    pub fn toggle_favorite(&mut self, symbol: Symbol) -> bool {
        if self.favorites.remove(&symbol) {
            false
        } else {
            self.favorites.insert(symbol);
            true
        }
    }

    /// Applies a finished enrichment pass. Returns `false` when the pass started
    /// from a version that has since been replaced.
    pub fn apply_enrichment(&mut self, version: u64, entries: Vec<EnrichedEntry>) -> bool {
        if version < self.version {
            debug!(
                job_version = version,
                current_version = self.version,
                "dropping stale enrichment result"
            );
            return false;
        }
        self.entries = entries;
        self.pending_enrichment = None;
        true
    }

    pub fn status(&self) -> PipelineStatus {
        for phase in [&self.ranked_phase, &self.universe_phase] {
            if let LoadPhase::Failed(message) = phase {
                return PipelineStatus::Failed(message.clone());
            }
        }
        if self.ranked_phase == LoadPhase::Pending || self.universe_phase == LoadPhase::Pending {
            return PipelineStatus::Loading;
        }
        PipelineStatus::Ready
    }

    pub fn snapshot(&self) -> Snapshot {
        let status = self.status();
        let entries = match status {
            PipelineStatus::Failed(_) => Vec::new(),
            _ => self.entries.clone(),
        };
        Snapshot {
            version: self.version,
            query: self.query.clone(),
            status,
            entries,
            enriching: self.pending_enrichment.is_some(),
            favorites: self.favorites.clone(),
        }
    }

    fn remerge(&mut self) -> Option<EnrichmentJob> {
        let merged = merge(&self.ranked, &self.universe, &self.query);
        if self.version > 0 && merged == self.merged {
            debug!(version = self.version, "merge unchanged; keeping current entries");
            return None;
        }

        self.version += 1;
        self.merged = merged;
        self.entries = self.merged.clone();

        let needs_enrichment = self.entries.iter().any(MergedEntry::is_placeholder);
        if !needs_enrichment {
            self.pending_enrichment = None;
            return None;
        }

        self.pending_enrichment = Some(self.version);
        Some(EnrichmentJob {
            version: self.version,
            entries: self.entries.clone(),
        })
    }
}
