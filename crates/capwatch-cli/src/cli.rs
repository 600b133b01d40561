//! CLI argument definitions for capwatch.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `top` | Large-cap ranking, one page at a time |
//! | `search` | Ranked matches plus directory matches for a prefix |
//! | `detail` | Quote, market cap and recent closes for one symbol |
//! | `browse` | Interactive session over stdin |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `table` | Output format (table, json) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | env or `10000` | Per-request timeout in ms |
//! | `--concurrency` | env or `4` | Max in-flight per-symbol requests |
//!
//! The Finnhub token is read from `CAPWATCH_FINNHUB_API_KEY` (or a `.env` file).

use clap::{Args, Parser, Subcommand, ValueEnum};

use capwatch_core::HISTORY_DAYS;

/// Large-cap equity browser backed by Finnhub.
#[derive(Debug, Parser)]
#[command(name = "capwatch", author, version, about = "Large-cap equity browser")]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Per-request timeout in milliseconds. Overrides the environment.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Maximum concurrent per-symbol requests. Overrides the environment.
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for terminal display.
    Table,
    /// Single JSON object.
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the large-cap ranking.
    ///
    ///   capwatch top
    ///   capwatch top --page 2
    Top(TopArgs),

    /// Search ranked and listed symbols by prefix.
    ///
    ///   capwatch search aap
    ///   capwatch search m --page 3 --format json
    Search(SearchArgs),

    /// Show the quote, market cap and recent closes for one symbol.
    ///
    ///   capwatch detail AAPL
    ///   capwatch detail MSFT --days 90
    Detail(DetailArgs),

    /// Interactive session. Type a prefix to search, or one of
    /// `:fav SYM`, `:favs`, `:page N`, `:quit`.
    Browse(BrowseArgs),
}

#[derive(Debug, Args)]
pub struct TopArgs {
    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Symbol prefix, case-insensitive.
    pub query: String,

    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,
}

#[derive(Debug, Args)]
pub struct DetailArgs {
    /// Market symbol (e.g. AAPL).
    pub symbol: String,

    /// Days of daily closes to load.
    #[arg(long, default_value_t = HISTORY_DAYS)]
    pub days: u32,
}

#[derive(Debug, Args)]
pub struct BrowseArgs {
    /// Query to start with.
    #[arg(long, default_value = "")]
    pub query: String,
}
