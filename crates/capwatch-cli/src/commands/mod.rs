mod browse;
mod detail;
mod list;

use std::sync::Arc;

use capwatch_core::{Config, FinnhubAdapter, MetricsFetcher, SessionConfig};
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Everything a command needs to talk to the provider.
pub struct Context {
    pub config: Config,
    pub fetcher: MetricsFetcher,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut config = Config::from_env()?;
        if let Some(timeout_ms) = cli.timeout_ms {
            config = config.with_request_timeout_ms(timeout_ms);
        }
        if let Some(concurrency) = cli.concurrency {
            if concurrency == 0 {
                return Err(CliError::Command(String::from(
                    "--concurrency must be greater than zero",
                )));
            }
            config = config.with_max_concurrency(concurrency);
        }
        debug!(config = ?config, "resolved configuration");

        let source = Arc::new(FinnhubAdapter::from_config(&config));
        let fetcher = MetricsFetcher::new(source).with_max_concurrency(config.max_concurrency);
        Ok(Self { config, fetcher })
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default().with_exchange(self.config.exchange.clone())
    }
}

pub async fn run(cli: &Cli) -> Result<(), CliError> {
    let context = Context::from_cli(cli)?;

    match &cli.command {
        Command::Top(args) => list::top(args, &context, cli.format, cli.pretty).await,
        Command::Search(args) => list::search(args, &context, cli.format, cli.pretty).await,
        Command::Detail(args) => detail::run(args, &context, cli.format, cli.pretty).await,
        Command::Browse(args) => browse::run(args, &context, cli.format, cli.pretty).await,
    }
}
