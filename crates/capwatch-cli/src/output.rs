use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::Serialize;

use capwatch_core::{MergedEntry, Page, PageRequest, PipelineStatus, Snapshot, StockDetail, Symbol};

use crate::cli::OutputFormat;
use crate::error::CliError;

const MISSING: &str = "N/A";

/// One rendered page of the list view.
#[derive(Debug, Serialize)]
pub struct ListView {
    pub query: String,
    pub status: PipelineStatus,
    pub favorites_only: bool,
    pub page: Page<MergedEntry>,
    pub favorites: BTreeSet<Symbol>,
}

impl ListView {
    pub fn from_snapshot(snapshot: &Snapshot, request: PageRequest, favorites_only: bool) -> Self {
        Self {
            query: snapshot.query.clone(),
            status: snapshot.status.clone(),
            favorites_only,
            page: snapshot.page(request, favorites_only),
            favorites: snapshot.favorites.clone(),
        }
    }
}

pub fn render_list(view: &ListView, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    let text = match format {
        OutputFormat::Json => to_json(view, pretty)?,
        OutputFormat::Table => list_table(view),
    };
    println!("{text}");
    Ok(())
}

pub fn render_detail(
    detail: &StockDetail,
    format: OutputFormat,
    pretty: bool,
) -> Result<(), CliError> {
    let text = match format {
        OutputFormat::Json => to_json(detail, pretty)?,
        OutputFormat::Table => detail_table(detail),
    };
    println!("{text}");
    Ok(())
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn list_table(view: &ListView) -> String {
    let page = &view.page;
    let mut out = String::new();

    let query = if view.query.trim().is_empty() {
        "(top)"
    } else {
        view.query.as_str()
    };
    let _ = writeln!(
        out,
        "query: {query}  status: {}  page {}/{} ({} total){}",
        status_label(&view.status),
        page.page,
        page.page_count.max(1),
        page.total,
        if view.favorites_only { "  [favorites]" } else { "" },
    );
    let _ = writeln!(out, "{:>4}  {:<10} {:>18} {:>12}", "#", "SYMBOL", "MARKET CAP (M)", "PRICE");

    let offset = page.page.saturating_sub(1).saturating_mul(page.page_size);
    for (index, entry) in page.items.iter().enumerate() {
        let marker = if view.favorites.contains(&entry.symbol) { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker}{:>3}  {:<10} {:>18} {:>12}",
            offset.saturating_add(index + 1),
            entry.symbol.as_str(),
            amount(entry.market_cap),
            amount(entry.current_price),
        );
    }
    if page.items.is_empty() {
        let _ = writeln!(out, "  (no results)");
    }

    out.trim_end().to_owned()
}

fn detail_table(detail: &StockDetail) -> String {
    let quote = &detail.quote;
    let mut out = String::new();

    let _ = writeln!(out, "symbol        : {}", detail.symbol);
    let _ = writeln!(out, "market cap (M): {}", amount(detail.market_cap));
    let _ = writeln!(out, "price         : {}", amount(quote.current_price));
    let _ = writeln!(out, "open          : {}", amount(quote.open_price));
    let _ = writeln!(out, "high          : {}", amount(quote.high_price));
    let _ = writeln!(out, "low           : {}", amount(quote.low_price));
    let _ = writeln!(out, "prev close    : {}", amount(quote.previous_close));

    if detail.history.is_empty() {
        let _ = writeln!(out, "history       : {MISSING}");
    } else {
        let _ = writeln!(out, "history       : {} closes", detail.history.closes.len());
        for (index, close) in detail.history.closes.iter().enumerate() {
            let label = detail
                .history
                .timestamps
                .get(index)
                .map(|ts| ts.format_rfc3339().chars().take(10).collect::<String>())
                .unwrap_or_else(|| format!("#{}", index + 1));
            let _ = writeln!(out, "  {label:<10} {close:>12.2}");
        }
    }

    out.trim_end().to_owned()
}

fn status_label(status: &PipelineStatus) -> String {
    match status {
        PipelineStatus::Loading => String::from("loading"),
        PipelineStatus::Ready => String::from("ready"),
        PipelineStatus::Failed(message) => format!("failed ({message})"),
    }
}

fn amount(value: Option<f64>) -> String {
    value.map_or_else(|| String::from(MISSING), |v| format!("{v:.2}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use capwatch_core::{paginate, PriceHistory, Quote};

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).expect("valid symbol")
    }

    fn view(entries: Vec<MergedEntry>) -> ListView {
        ListView {
            query: String::from("AAP"),
            status: PipelineStatus::Ready,
            favorites_only: false,
            page: paginate(&entries, PageRequest::first()),
            favorites: BTreeSet::from([symbol("AAPE")]),
        }
    }

    #[test]
    fn list_table_marks_favorites_and_missing_values() {
        let table = list_table(&view(vec![
            MergedEntry {
                symbol: symbol("AAPL"),
                market_cap: Some(2_950_000.0),
                current_price: Some(190.5),
            },
            MergedEntry::placeholder(symbol("AAPE")),
        ]));

        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].contains("page 1/1 (2 total)"));
        assert!(lines[2].contains("2950000.00"));
        assert!(lines[2].contains("190.50"));
        assert!(lines[3].starts_with('*'));
        assert!(lines[3].contains(MISSING));
    }

    #[test]
    fn huge_page_number_renders_an_empty_page() {
        let entries = vec![MergedEntry::placeholder(symbol("AAPE"))];
        let huge = ListView {
            page: paginate(&entries, PageRequest::page(usize::MAX).expect("valid page")),
            ..view(Vec::new())
        };

        let table = list_table(&huge);

        assert!(table.contains(&format!("page {}/1", usize::MAX)));
        assert!(table.contains("(no results)"));
    }

    #[test]
    fn empty_page_says_so() {
        let table = list_table(&view(Vec::new()));
        assert!(table.contains("(no results)"));
        assert!(table.contains("page 1/1 (0 total)"));
    }

    #[test]
    fn detail_table_without_history() {
        let detail = StockDetail {
            symbol: symbol("AAPE"),
            market_cap: None,
            quote: Quote::default(),
            history: PriceHistory::empty(symbol("AAPE")),
        };

        let table = detail_table(&detail);

        assert!(table.contains("market cap (M): N/A"));
        assert!(table.contains("history       : N/A"));
    }

    #[test]
    fn json_output_carries_page_metadata() {
        let json = to_json(&view(Vec::new()), false).expect("serializes");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(value["page"]["page_count"], 0);
        assert_eq!(value["status"]["state"], "ready");
        assert_eq!(value["favorites"][0], "AAPE");
    }
}
