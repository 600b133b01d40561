use std::collections::BTreeSet;

use capwatch_core::{paginate, spawn_session, MergedEntry, PageRequest, PipelineStatus, Ranker};

use crate::cli::{OutputFormat, SearchArgs, TopArgs};
use crate::error::CliError;
use crate::output::{render_list, ListView};

use super::Context;

/// Ranking only: the directory is not needed for an empty query.
pub async fn top(
    args: &TopArgs,
    context: &Context,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let request = PageRequest::page(args.page)?;

    let ranked = Ranker::new(context.fetcher.clone()).rank().await?;
    let entries: Vec<MergedEntry> = ranked.iter().map(MergedEntry::from).collect();

    let view = ListView {
        query: String::new(),
        status: PipelineStatus::Ready,
        favorites_only: false,
        page: paginate(&entries, request),
        favorites: BTreeSet::new(),
    };
    render_list(&view, format, pretty)
}

pub async fn search(
    args: &SearchArgs,
    context: &Context,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let request = PageRequest::page(args.page)?;
    if args.query.trim().is_empty() {
        return Err(CliError::Command(String::from("query must not be empty")));
    }

    let session = spawn_session(
        context.fetcher.clone(),
        context.session_config().with_initial_query(args.query.clone()),
    );
    let snapshot = session.settled().await?;

    if let PipelineStatus::Failed(message) = snapshot.status {
        return Err(CliError::PipelineStatus(message));
    }

    render_list(&ListView::from_snapshot(&snapshot, request, false), format, pretty)
}
