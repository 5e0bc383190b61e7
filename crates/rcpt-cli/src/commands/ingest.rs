//! Ingest command - extract and store receipts from many files.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, warn};

use rcpt_core::{DocumentReader, IngestOutcome, Ingestor, PureOcrLoader, ReceiptParser};

use super::Context;

/// Arguments for the ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// Input files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// OCR language hint (default: from config)
    #[arg(short, long)]
    lang: Option<String>,

    /// Number of files processed concurrently
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Directory uploads are copied into (default: from config)
    #[arg(long)]
    upload_dir: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Result of ingesting a single file.
struct FileResult {
    path: PathBuf,
    outcome: Result<IngestOutcome, String>,
}

pub async fn run(args: IngestArgs, ctx: &Context) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = ctx.load_config()?;

    if let Some(ref dir) = args.upload_dir {
        config.ingest.upload_dir = dir.clone();
    }
    let language = args.lang.clone().unwrap_or_else(|| config.ocr.language.clone());

    let files = expand_inputs(&args.inputs, &config.ingest.supported_extensions)?;
    if files.is_empty() {
        anyhow::bail!("No matching files found for: {}", args.inputs.join(", "));
    }

    println!(
        "{} Found {} files to ingest",
        style("ℹ").blue(),
        files.len()
    );

    let ingestor = Arc::new(Ingestor::new(
        Arc::new(ReceiptParser::new(&config.extraction)?),
        Arc::new(DocumentReader::new(
            PureOcrLoader::new(config.models.clone(), config.ocr.clone()),
            config.pdf.clone(),
        )),
        Arc::new(ctx.open_store(&config)?),
        config.ingest.clone(),
    ));

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let mut tasks = JoinSet::new();

    for path in files {
        let ingestor = Arc::clone(&ingestor);
        let semaphore = Arc::clone(&semaphore);
        let language = language.clone();

        tasks.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => ingestor
                    .ingest_file(&path, &language)
                    .await
                    .map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            FileResult { path, outcome }
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let result = joined.context("Ingestion task panicked")?;
        pb.inc(1);

        if let Err(ref message) = result.outcome {
            if args.continue_on_error {
                warn!("Failed to ingest {}: {}", result.path.display(), message);
            } else {
                error!("Failed to ingest {}: {}", result.path.display(), message);
                tasks.abort_all();
                pb.abandon();
                anyhow::bail!("Ingestion of {} failed: {}", result.path.display(), message);
            }
        }
        results.push(result);
    }

    pb.finish_and_clear();
    results.sort_by(|a, b| a.path.cmp(&b.path));
    print_summary(&results, start);

    Ok(())
}

/// Expand glob patterns, keeping files with a supported extension.
fn expand_inputs(inputs: &[String], extensions: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        for entry in glob(input).with_context(|| format!("Invalid pattern: {}", input))? {
            let path = entry?;
            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| extensions.contains(&e.to_lowercase()));

            if path.is_file() && supported && !files.contains(&path) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

fn print_summary(results: &[FileResult], start: Instant) {
    let mut stored = 0;
    let mut duplicates = 0;
    let mut failed = Vec::new();

    for result in results {
        match &result.outcome {
            Ok(outcome) if outcome.is_duplicate() => {
                duplicates += 1;
                println!(
                    "  {} {} (duplicate)",
                    style("=").yellow(),
                    result.path.display()
                );
            }
            Ok(outcome) => {
                stored += 1;
                println!(
                    "  {} {} -> #{} {} {} {}",
                    style("+").green(),
                    result.path.display(),
                    outcome.id.unwrap_or_default(),
                    outcome.receipt.vendor.as_deref().unwrap_or("-"),
                    outcome
                        .receipt
                        .amount
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    outcome.receipt.currency
                );
            }
            Err(message) => failed.push((&result.path, message)),
        }
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} stored, {} duplicates, {} failed",
        style(stored).green(),
        style(duplicates).yellow(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for (path, message) in failed {
            println!("  - {}: {}", path.display(), message);
        }
    }
}
