use capwatch_core::{load_detail, Symbol, UtcDateTime};

use crate::cli::{DetailArgs, OutputFormat};
use crate::error::CliError;
use crate::output::render_detail;

use super::Context;

pub async fn run(
    args: &DetailArgs,
    context: &Context,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let symbol = Symbol::parse(&args.symbol)?;
    if args.days == 0 {
        return Err(CliError::Command(String::from("--days must be greater than zero")));
    }

    let detail = load_detail(&context.fetcher, symbol, args.days, UtcDateTime::now()).await;
    render_detail(&detail, format, pretty)
}
