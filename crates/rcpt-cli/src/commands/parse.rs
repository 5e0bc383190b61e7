//! Parse command - extract fields from a single receipt file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context as _;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use rcpt_core::models::config::RcptConfig;
use rcpt_core::{DocumentReader, ExtractionResult, ParsedReceipt, PureOcrLoader, ReceiptParser};

use super::Context;

/// Arguments for the parse command.
#[derive(Args)]
pub struct ParseArgs {
    /// Input file (.txt transcript, image or PDF)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// OCR language hint (default: from config)
    #[arg(short, long)]
    lang: Option<String>,

    /// Show extraction warnings and timing
    #[arg(long)]
    show_warnings: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: ParseArgs, ctx: &Context) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = ctx.load_config()?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let language = args.lang.clone().unwrap_or_else(|| config.ocr.language.clone());
    info!("Parsing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );

    pb.set_message("Reading text...");
    let text = read_text(&args, &config, &language).await?;

    pb.set_message("Extracting fields...");
    let parser = ReceiptParser::new(&config.extraction)?;
    let result = parser.parse(&text);

    pb.finish_and_clear();

    let output = format_receipt(&result.receipt, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_warnings {
        print_diagnostics(&result);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Transcript of the input: `.txt` as is, anything else through OCR.
async fn read_text(args: &ParseArgs, config: &RcptConfig, language: &str) -> anyhow::Result<String> {
    let is_text = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));

    if is_text {
        let bytes = fs::read(&args.input)?;
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }

    let reader = DocumentReader::new(
        PureOcrLoader::new(config.models.clone(), config.ocr.clone()),
        config.pdf.clone(),
    );
    let input = args.input.clone();
    let language = language.to_string();

    let text = tokio::task::spawn_blocking(move || reader.extract_text(&input, &language))
        .await?
        .with_context(|| format!("Failed to read text from {}", args.input.display()))?;
    Ok(text)
}

fn print_diagnostics(result: &ExtractionResult) {
    eprintln!();
    for warning in &result.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }
    if let Some(strategy) = result.vendor_strategy {
        eprintln!("{} Vendor found by: {:?}", style("ℹ").blue(), strategy);
    }
    eprintln!(
        "{} {} lines parsed in {}ms",
        style("ℹ").blue(),
        result.line_count,
        result.processing_time_ms
    );
}

fn format_receipt(receipt: &ParsedReceipt, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(receipt)?),
        OutputFormat::Csv => format_csv(receipt),
        OutputFormat::Text => Ok(format_text(receipt)),
    }
}

fn format_csv(receipt: &ParsedReceipt) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["vendor", "date", "amount", "category", "currency"])?;
    wtr.write_record([
        receipt.vendor.as_deref().unwrap_or_default(),
        receipt.date.as_deref().unwrap_or_default(),
        &receipt.amount.map(|a| a.to_string()).unwrap_or_default(),
        &receipt.category,
        &receipt.currency,
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data.trim_end().to_string())
}

fn format_text(receipt: &ParsedReceipt) -> String {
    let missing = || "-".to_string();

    let mut output = String::new();
    output.push_str(&format!(
        "Vendor:   {}\n",
        receipt.vendor.clone().unwrap_or_else(missing)
    ));
    output.push_str(&format!(
        "Date:     {}\n",
        receipt.date.clone().unwrap_or_else(missing)
    ));
    output.push_str(&format!(
        "Amount:   {}\n",
        receipt.amount.map(|a| a.to_string()).unwrap_or_else(missing)
    ));
    output.push_str(&format!("Currency: {}\n", receipt.currency));
    output.push_str(&format!("Category: {}", receipt.category));
    output
}
