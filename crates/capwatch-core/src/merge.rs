//! Union of the ranked list and directory matches for a query.

use std::collections::HashSet;

use crate::search::SymbolUniverse;
use crate::{normalize_query, MergedEntry, RankedEntry, Symbol};

/// Merges ranked entries and directory matches for `query`.
///
/// - Blank query: the ranked list, unchanged.
/// - Otherwise: ranked entries matching the prefix in rank order, then
///   directory matches not already listed, as placeholders in directory order.
///
/// Output symbols are unique; the first occurrence wins, so a ranked entry
/// always shadows the directory row for the same symbol.
pub fn merge(ranked: &[RankedEntry], universe: &SymbolUniverse, query: &str) -> Vec<MergedEntry> {
    let prefix = normalize_query(query);
    let mut seen: HashSet<&Symbol> = HashSet::new();

    let ranked_matches = ranked
        .iter()
        .filter(|entry| prefix.is_empty() || entry.symbol.starts_with(&prefix))
        .filter(|entry| seen.insert(&entry.symbol))
        .map(MergedEntry::from)
        .collect::<Vec<_>>();

    if prefix.is_empty() {
        return ranked_matches;
    }

    let placeholders = universe
        .filter_prefix(&prefix)
        .into_iter()
        .filter(|entry| seen.insert(&entry.symbol))
        .map(|entry| MergedEntry::placeholder(entry.symbol.clone()));

    ranked_matches.into_iter().chain(placeholders).collect()
}
