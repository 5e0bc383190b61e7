//! CLI application for receipt OCR processing.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{config, edit, export, ingest, list, parse, stats, Context};

/// Receipt OCR - Extract, store and summarize receipts
#[derive(Parser)]
#[command(name = "rcpt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the receipt database (overrides the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields from a single receipt without storing it
    Parse(parse::ParseArgs),

    /// Extract and store receipts from files
    Ingest(ingest::IngestArgs),

    /// List stored receipts
    List(list::ListArgs),

    /// Export stored receipts
    Export(export::ExportArgs),

    /// Show spending statistics
    Stats,

    /// Edit fields of a stored receipt
    Edit(edit::EditArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let ctx = Context {
        config_path: cli.config,
        db_path: cli.db,
    };

    match cli.command {
        Commands::Parse(args) => parse::run(args, &ctx).await,
        Commands::Ingest(args) => ingest::run(args, &ctx).await,
        Commands::List(args) => list::run(args, &ctx),
        Commands::Export(args) => export::run(args, &ctx),
        Commands::Stats => stats::run(&ctx),
        Commands::Edit(args) => edit::run(args, &ctx),
        Commands::Config(args) => config::run(args, &ctx),
    }
}
