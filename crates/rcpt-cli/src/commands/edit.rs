//! Edit command - correct fields of a stored receipt.

use clap::Args;
use console::style;

use rcpt_core::ReceiptUpdate;

use super::Context;

/// Arguments for the edit command.
#[derive(Args)]
pub struct EditArgs {
    /// Receipt id
    id: i64,

    #[arg(long)]
    vendor: Option<String>,

    /// Date as YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,

    /// Non-negative decimal amount
    #[arg(long)]
    amount: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    currency: Option<String>,

    #[arg(long)]
    filename: Option<String>,
}

pub fn run(args: EditArgs, ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let store = ctx.open_store(&config)?;

    let update = ReceiptUpdate {
        vendor: args.vendor,
        date: args.date,
        amount: args.amount,
        category: args.category,
        currency: args.currency,
        filename: args.filename,
    };

    let fields = store.update(args.id, &update)?;

    println!(
        "{} Updated receipt {}: {}",
        style("✓").green(),
        args.id,
        fields.join(", ")
    );

    Ok(())
}
