//! Line-driven interactive session.
//!
//! A bare line replaces the query. Lines starting with `:` are commands:
//! `:fav SYM`, `:favs`, `:page N` and `:quit`. The current page is printed
//! again whenever the session publishes a new snapshot.

use capwatch_core::{spawn_session, PageRequest, PipelineStatus, Snapshot, Symbol};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{BrowseArgs, OutputFormat};
use crate::error::CliError;
use crate::output::{render_list, ListView};

use super::Context;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Query(String),
    ToggleFavorite(String),
    FavoritesOnly,
    Page(usize),
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Input::Query(line.to_owned()));
    };

    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some("quit" | "q"), None, None) => Ok(Input::Quit),
        (Some("favs"), None, None) => Ok(Input::FavoritesOnly),
        (Some("fav"), Some(symbol), None) => Ok(Input::ToggleFavorite(symbol.to_owned())),
        (Some("page"), Some(page), None) => page
            .parse()
            .map(Input::Page)
            .map_err(|_| format!("not a page number: '{page}'")),
        _ => Err(format!("unknown command: '{line}'")),
    }
}

fn failure_line(message: &str) -> String {
    format!("error: {message}")
}

struct View {
    request: PageRequest,
    favorites_only: bool,
    format: OutputFormat,
    pretty: bool,
}

impl View {
    /// A failed bulk load shows only the error, never a partial list.
    fn show(&self, snapshot: &Snapshot) -> Result<(), CliError> {
        if let PipelineStatus::Failed(message) = &snapshot.status {
            eprintln!("{}", failure_line(message));
            return Ok(());
        }
        let view = ListView::from_snapshot(snapshot, self.request, self.favorites_only);
        render_list(&view, self.format, self.pretty)
    }
}

pub async fn run(
    args: &BrowseArgs,
    context: &Context,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let session = spawn_session(
        context.fetcher.clone(),
        context.session_config().with_initial_query(args.query.clone()),
    );
    let mut snapshots = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = View {
        request: PageRequest::first(),
        favorites_only: false,
        format,
        pretty,
    };

    view.show(&snapshots.borrow_and_update().clone())?;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                view.show(&snapshot)?;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Query(query)) => {
                        view.request = PageRequest::first();
                        session.set_query(query).await?;
                    }
                    Ok(Input::ToggleFavorite(raw)) => match Symbol::parse(&raw) {
                        Ok(symbol) => {
                            session.toggle_favorite(symbol).await?;
                        }
                        Err(error) => eprintln!("error: {error}"),
                    },
                    Ok(Input::FavoritesOnly) => {
                        view.favorites_only = !view.favorites_only;
                        view.request = PageRequest::first();
                        view.show(&session.snapshot())?;
                    }
                    Ok(Input::Page(page)) => match PageRequest::page(page) {
                        Ok(request) => {
                            view.request = request;
                            view.show(&session.snapshot())?;
                        }
                        Err(error) => eprintln!("error: {error}"),
                    },
                    Err(message) => eprintln!("error: {message}"),
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_lines_are_queries() {
        assert_eq!(parse_input("  aap "), Ok(Input::Query(String::from("aap"))));
        assert_eq!(parse_input(""), Ok(Input::Query(String::new())));
    }

    #[test]
    fn colon_commands_are_parsed() {
        assert_eq!(parse_input(":quit"), Ok(Input::Quit));
        assert_eq!(parse_input(":favs"), Ok(Input::FavoritesOnly));
        assert_eq!(
            parse_input(":fav aapl"),
            Ok(Input::ToggleFavorite(String::from("aapl")))
        );
        assert_eq!(parse_input(":page 3"), Ok(Input::Page(3)));
    }

    #[test]
    fn failure_line_carries_only_the_error() {
        let line = failure_line("symbol directory unavailable");
        assert_eq!(line, "error: symbol directory unavailable");
        assert!(!line.contains("SYMBOL"));
    }

    #[test]
    fn malformed_commands_are_rejected() {
        assert!(parse_input(":page two").is_err());
        assert!(parse_input(":fav").is_err());
        assert!(parse_input(":launch").is_err());
    }
}
