//! Export command - write every matching receipt as CSV or JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::Context as _;
use clap::Args;
use console::style;

use rcpt_core::StoredReceipt;

use super::{Context, FilterArgs};

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    #[command(flatten)]
    filters: FilterArgs,

    /// Export format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: ExportFormat,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

pub fn run(args: ExportArgs, ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let store = ctx.open_store(&config)?;

    let receipts = store.list_all(&args.filters.to_query())?;

    let content = match args.format {
        ExportFormat::Csv => to_csv(&receipts)?,
        ExportFormat::Json => serde_json::to_string_pretty(&receipts)?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "{} Exported {} receipts to {}",
                style("✓").green(),
                receipts.len(),
                path.display()
            );
        }
        None => print!("{}", content),
    }

    Ok(())
}

fn to_csv(receipts: &[StoredReceipt]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "id", "vendor", "date", "amount", "category", "currency", "filename",
    ])?;

    for stored in receipts {
        let receipt = &stored.receipt;
        wtr.write_record([
            &stored.id.to_string(),
            receipt.vendor.as_deref().unwrap_or_default(),
            receipt.date.as_deref().unwrap_or_default(),
            &receipt.amount.map(|a| a.to_string()).unwrap_or_default(),
            &receipt.category,
            &receipt.currency,
            stored.filename.as_deref().unwrap_or_default(),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}
