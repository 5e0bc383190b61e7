//! Stats command - spending statistics over the whole database.

use super::Context;

pub fn run(ctx: &Context) -> anyhow::Result<()> {
    let config = ctx.load_config()?;
    let store = ctx.open_store(&config)?;

    let summary = store.aggregate()?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
