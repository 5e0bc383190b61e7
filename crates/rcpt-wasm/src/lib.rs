//! WASM bindings for receipt field extraction.
//!
//! This crate provides WebAssembly bindings for use in browsers and Node.js.
//! OCR happens outside the module; these bindings turn transcripts into
//! structured receipts.

use wasm_bindgen::prelude::*;

use rcpt_core::models::config::ExtractionConfig;
use rcpt_core::receipt::rules;
use rcpt_core::{OcrResult, ParsedReceipt, ReceiptParser, TextBox};

fn to_js<T: serde::Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn default_parser() -> Result<ReceiptParser, JsValue> {
    ReceiptParser::with_defaults().map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Initialize panic hook for better error messages in console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Version information.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Extract a receipt from a transcript using the built-in tables.
#[wasm_bindgen]
pub fn parse_receipt(text: &str) -> Result<JsValue, JsValue> {
    to_js(&default_parser()?.parse_receipt(text))
}

/// Category of a vendor under the built-in tables.
#[wasm_bindgen]
pub fn categorize(vendor: &str) -> Result<String, JsValue> {
    Ok(default_parser()?.categorize(Some(vendor)).to_string())
}

/// Normalize a date fragment to `YYYY-MM-DD`.
#[wasm_bindgen]
pub fn normalize_date(fragment: &str) -> Option<String> {
    rules::normalize_date(fragment).map(|(date, _)| date.format("%Y-%m-%d").to_string())
}

/// Receipt extractor class for browser use.
#[wasm_bindgen]
pub struct ReceiptExtractor {
    parser: ReceiptParser,
    config: ExtractionConfig,
}

#[wasm_bindgen]
impl ReceiptExtractor {
    /// Create an extractor with the built-in tables.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<ReceiptExtractor, JsValue> {
        Self::from_config(ExtractionConfig::default())
    }

    /// Create an extractor from JSON tables.
    ///
    /// Missing keys fall back to the built-in values.
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config_json: &str) -> Result<ReceiptExtractor, JsValue> {
        let config: ExtractionConfig = serde_json::from_str(config_json)
            .map_err(|e| JsValue::from_str(&format!("invalid config: {}", e)))?;
        Self::from_config(config)
    }

    /// Extract a receipt from text.
    #[wasm_bindgen]
    pub fn extract(&self, text: &str) -> Result<JsValue, JsValue> {
        to_js(&self.extract_receipt(text))
    }

    /// Get extraction result with metadata.
    #[wasm_bindgen]
    pub fn extract_with_metadata(&self, text: &str) -> Result<JsValue, JsValue> {
        #[derive(serde::Serialize)]
        struct ExtractResult {
            receipt: ParsedReceipt,
            raw_text: String,
            line_count: usize,
            warnings: Vec<String>,
            processing_time_ms: u64,
        }

        let result = self.parser.parse(text);
        to_js(&ExtractResult {
            receipt: result.receipt,
            raw_text: text.to_string(),
            line_count: result.line_count,
            warnings: result.warnings,
            processing_time_ms: result.processing_time_ms,
        })
    }

    /// Category of a vendor under this extractor's tables.
    #[wasm_bindgen]
    pub fn categorize(&self, vendor: &str) -> String {
        self.parser.categorize(Some(vendor)).to_string()
    }

    /// Known vendor names, in match order.
    #[wasm_bindgen]
    pub fn vendors(&self) -> js_sys::Array {
        self.config
            .vendors
            .iter()
            .map(|v| JsValue::from_str(&v.name))
            .collect()
    }
}

impl ReceiptExtractor {
    fn from_config(config: ExtractionConfig) -> Result<ReceiptExtractor, JsValue> {
        let parser =
            ReceiptParser::new(&config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self { parser, config })
    }

    fn extract_receipt(&self, text: &str) -> ParsedReceipt {
        let result = self.parser.parse(text);
        for warning in &result.warnings {
            web_sys::console::debug_1(&JsValue::from_str(warning));
        }
        result.receipt
    }
}

/// Text boxes recognized by browser-side OCR.
#[wasm_bindgen]
pub struct OcrTranscript {
    boxes: Vec<TextBox>,
}

#[wasm_bindgen]
impl OcrTranscript {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self { boxes: Vec::new() }
    }

    /// Add a text box to the transcript.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn add_box(
        &mut self,
        text: &str,
        x1: f32, y1: f32,
        x2: f32, y2: f32,
        x3: f32, y3: f32,
        x4: f32, y4: f32,
        confidence: f32,
    ) {
        self.boxes.push(TextBox {
            bbox: [x1, y1, x2, y2, x3, y3, x4, y4],
            text: text.to_string(),
            score: confidence,
        });
    }

    /// Boxes joined in reading order, one per line.
    #[wasm_bindgen]
    pub fn get_text(&self) -> String {
        OcrResult::from_boxes(self.boxes.clone(), (0, 0), 0).text
    }

    /// Extract a receipt from this transcript with the built-in tables.
    #[wasm_bindgen]
    pub fn extract_receipt(&self) -> Result<JsValue, JsValue> {
        parse_receipt(&self.get_text())
    }
}

impl Default for OcrTranscript {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_categorize() {
        assert_eq!(categorize("Flipkart").unwrap(), "Shopping");
        assert_eq!(categorize("Corner Shop").unwrap(), "Other");
    }

    #[wasm_bindgen_test]
    fn test_normalize_date() {
        assert_eq!(normalize_date("12/03/2024").as_deref(), Some("2024-03-12"));
        assert_eq!(normalize_date("December 2023").as_deref(), Some("2023-12-01"));
        assert_eq!(normalize_date("yesterday"), None);
    }

    #[wasm_bindgen_test]
    fn test_custom_tables() {
        let extractor = ReceiptExtractor::with_config(
            r#"{ "vendors": [ { "name": "Corner Cafe", "category": "Dining" } ] }"#,
        )
        .unwrap();
        assert_eq!(extractor.categorize("Corner Cafe"), "Dining");
        assert_eq!(extractor.categorize("Amazon"), "Other");
        assert_eq!(extractor.extract_receipt("corner cafe\n$4.50").currency, "USD");
    }

    #[wasm_bindgen_test]
    fn test_transcript_reading_order() {
        let mut transcript = OcrTranscript::new();
        transcript.add_box("Total: $9.99", 10.0, 80.0, 90.0, 80.0, 90.0, 95.0, 10.0, 95.0, 0.9);
        transcript.add_box("Amazon", 10.0, 5.0, 60.0, 5.0, 60.0, 15.0, 10.0, 15.0, 0.9);
        assert_eq!(transcript.get_text(), "Amazon\nTotal: $9.99");
    }
}
