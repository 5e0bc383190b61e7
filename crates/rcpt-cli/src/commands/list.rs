//! List command - page through stored receipts.

use clap::Args;
use console::style;
use serde::Serialize;

use rcpt_core::StoredReceipt;
use rcpt_core::storage::DEFAULT_PAGE_SIZE;

use super::{Context, FilterArgs};

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    #[command(flatten)]
    filters: FilterArgs,

    /// Page number, starting at 1
    #[arg(short, long, default_value = "1")]
    page: u32,

    /// Receipts per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u32,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: ListFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ListFormat {
    /// JSON object with the page and the total count
    Json,
    /// Aligned table
    Text,
}

#[derive(Serialize)]
struct Page<'a> {
    receipts: &'a [StoredReceipt],
    total: usize,
    page: u32,
    page_size: u32,
}

pub fn run(args: ListArgs, ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let store = ctx.open_store(&config)?;

    let mut query = args.filters.to_query();
    query.page = args.page.max(1);
    query.page_size = args.page_size.max(1);

    let receipts = store.list(&query)?;
    let total = store.count(&query)?;

    match args.format {
        ListFormat::Json => {
            let page = Page {
                receipts: &receipts,
                total,
                page: query.page,
                page_size: query.page_size,
            };
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        ListFormat::Text => print_table(&receipts, total, query.page, query.page_size),
    }

    Ok(())
}

fn print_table(receipts: &[StoredReceipt], total: usize, page: u32, page_size: u32) {
    if receipts.is_empty() {
        println!("{} No receipts found.", style("ℹ").blue());
        return;
    }

    println!(
        "{:>5}  {:<10}  {:<24}  {:>12}  {:<8}  {}",
        "ID", "DATE", "VENDOR", "AMOUNT", "CURRENCY", "CATEGORY"
    );
    for stored in receipts {
        let receipt = &stored.receipt;
        println!(
            "{:>5}  {:<10}  {:<24}  {:>12}  {:<8}  {}",
            stored.id,
            receipt.date.as_deref().unwrap_or("-"),
            truncate(receipt.vendor.as_deref().unwrap_or("-"), 24),
            receipt
                .amount
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string()),
            receipt.currency,
            receipt.category
        );
    }

    let pages = total.div_ceil(page_size as usize).max(1);
    println!();
    println!(
        "Page {} of {} ({} receipts)",
        page,
        pages,
        style(total).bold()
    );
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width - 1).collect();
    cut.push('…');
    cut
}
