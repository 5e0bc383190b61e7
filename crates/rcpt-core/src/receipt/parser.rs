//! Receipt parser assembling the rule-based extractors into one record.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::receipt::ParsedReceipt;

use super::rules::{
    normalize_lines, AmountExtractor, CategoryMapper, DateExtractor, FieldExtractor,
    VendorResolver, VendorStrategy,
};

/// Result of receipt extraction.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    /// Extracted receipt fields.
    pub receipt: ParsedReceipt,
    /// Number of non-empty transcript lines.
    pub line_count: usize,
    /// How the vendor was found, if it was.
    pub vendor_strategy: Option<VendorStrategy>,
    /// Extraction warnings.
    pub warnings: Vec<String>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Turns OCR transcripts into [`ParsedReceipt`] records.
///
/// Built once from an [`ExtractionConfig`] and shared; parsing never fails
/// and never mutates the parser.
pub struct ReceiptParser {
    vendor_resolver: VendorResolver,
    date_extractor: DateExtractor,
    amount_extractor: AmountExtractor,
    category_mapper: CategoryMapper,
    default_currency: String,
}

impl ReceiptParser {
    /// Create a parser for the given lookup tables.
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        Ok(Self {
            vendor_resolver: VendorResolver::new(&config.vendors),
            date_extractor: DateExtractor::new(),
            amount_extractor: AmountExtractor::new(&config.currencies)?,
            category_mapper: CategoryMapper::new(config),
            default_currency: config.default_currency.clone(),
        })
    }

    /// Create a parser with the built-in tables.
    pub fn with_defaults() -> Result<Self, ExtractionError> {
        Self::new(&ExtractionConfig::default())
    }

    /// Parse a transcript, keeping diagnostics.
    pub fn parse(&self, text: &str) -> ExtractionResult {
        let elapsed_ms = start_timer();
        let mut warnings = Vec::new();

        let lines = normalize_lines(text);
        info!(
            "Parsing receipt from {} characters ({} lines)",
            text.len(),
            lines.len()
        );

        let vendor = self.vendor_resolver.extract(&lines);
        let vendor_strategy = vendor.as_ref().map(|m| m.value.strategy);
        let vendor = vendor.map(|m| m.value.name);
        if vendor.is_none() {
            warnings.push("Could not extract vendor".to_string());
        }

        let date = self
            .date_extractor
            .extract(&lines)
            .map(|m| m.value.format("%Y-%m-%d").to_string());
        if date.is_none() {
            warnings.push("Could not extract date".to_string());
        }

        let total = self.amount_extractor.extract(&lines);
        let amount = total.as_ref().map(|m| m.value.value);
        if amount.is_none() {
            warnings.push("Could not extract amount".to_string());
        }

        let currency = match total.and_then(|m| m.value.currency) {
            Some(code) => code,
            None => {
                warnings.push(format!(
                    "No currency symbol found, using {:?}",
                    self.default_currency
                ));
                self.default_currency.clone()
            }
        };

        let category = self.category_mapper.categorize(vendor.as_deref()).to_string();
        if !vendor
            .as_deref()
            .is_some_and(|v| self.category_mapper.is_mapped(v))
        {
            warnings.push(format!("No category for vendor, using {:?}", category));
        }

        let receipt = ParsedReceipt {
            vendor,
            date,
            amount,
            category,
            currency,
        };

        debug!(
            "Extracted receipt vendor={:?} date={:?} amount={:?} with {} warnings",
            receipt.vendor,
            receipt.date,
            receipt.amount,
            warnings.len()
        );

        ExtractionResult {
            receipt,
            line_count: lines.len(),
            vendor_strategy,
            warnings,
            processing_time_ms: elapsed_ms(),
        }
    }

    /// Parse a transcript into its record only.
    pub fn parse_receipt(&self, text: &str) -> ParsedReceipt {
        self.parse(text).receipt
    }

    /// Category for a vendor name under this parser's tables.
    pub fn categorize(&self, vendor: Option<&str>) -> &str {
        self.category_mapper.categorize(vendor)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn start_timer() -> impl Fn() -> u64 {
    let start = std::time::Instant::now();
    move || start.elapsed().as_millis() as u64
}

// wasm32-unknown-unknown has no monotonic clock.
#[cfg(target_arch = "wasm32")]
fn start_timer() -> impl Fn() -> u64 {
    || 0
}
