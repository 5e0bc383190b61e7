//! Configuration structures for the receipt pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::receipt::{DEFAULT_CATEGORY, DEFAULT_CURRENCY};

/// Main configuration for rcpt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RcptConfig {
    /// OCR configuration.
    pub ocr: OcrConfig,

    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// Field extraction tables.
    pub extraction: ExtractionConfig,

    /// Model configuration.
    pub models: ModelConfig,

    /// Storage configuration.
    pub storage: StorageConfig,

    /// Ingestion configuration.
    pub ingest: IngestConfig,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Language used when a request gives no hint.
    pub language: String,

    /// Recognition confidence threshold (0.0 - 1.0).
    pub recognition_threshold: f32,

    /// Keep `[UNK]` tokens emitted by the recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            recognition_threshold: 0.0,
            keep_unk: false,
        }
    }
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Maximum pages to OCR (0 = unlimited).
    pub max_pages: usize,

    /// Use embedded text before falling back to OCR.
    pub prefer_embedded_text: bool,

    /// Minimum embedded text length to skip OCR.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            max_pages: 5,
            prefer_embedded_text: true,
            min_text_length: 50,
        }
    }
}

/// A known merchant and the category its receipts belong to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorEntry {
    pub name: String,
    pub category: String,
}

/// A currency symbol and the code it maps to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySymbol {
    pub symbol: String,
    pub code: String,
}

/// Lookup tables driving field extraction.
///
/// Table order is significant: vendors are matched in declaration order and
/// the first currency symbol present in a candidate wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Known vendors with their categories.
    pub vendors: Vec<VendorEntry>,

    /// Recognized currency symbols.
    pub currencies: Vec<CurrencySymbol>,

    /// Category when the vendor is unmapped.
    pub default_category: String,

    /// Currency when no symbol is detected.
    pub default_currency: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let vendors = [
            ("Amazon", "Shopping"),
            ("Walmart", "Groceries"),
            ("Reliance", "Utilities"),
            ("Flipkart", "Shopping"),
            ("Big Bazaar", "Groceries"),
            ("Vodafone", "Telecom"),
            ("Airtel", "Telecom"),
            ("Tata Power", "Electricity"),
        ];
        let currencies = [("₹", "INR"), ("$", "USD"), ("€", "EUR"), ("£", "GBP")];

        Self {
            vendors: vendors
                .iter()
                .map(|(name, category)| VendorEntry {
                    name: name.to_string(),
                    category: category.to_string(),
                })
                .collect(),
            currencies: currencies
                .iter()
                .map(|(symbol, code)| CurrencySymbol {
                    symbol: symbol.to_string(),
                    code: code.to_string(),
                })
                .collect(),
            default_category: DEFAULT_CATEGORY.to_string(),
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// Model file locations.
///
/// Recognition model and dictionary names may contain a `{family}`
/// placeholder, replaced by the script family of the requested language.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Directory containing model files.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name template.
    pub recognition_model: String,

    /// Character dictionary file name template.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "{family}_rec.onnx".to_string(),
            dictionary: "{family}_dict.txt".to_string(),
        }
    }
}

impl ModelConfig {
    /// Recognition model path for a language.
    pub fn recognition_path(&self, language: &str) -> PathBuf {
        self.model_dir
            .join(self.recognition_model.replace("{family}", script_family(language)))
    }

    /// Dictionary path for a language.
    pub fn dictionary_path(&self, language: &str) -> PathBuf {
        self.model_dir
            .join(self.dictionary.replace("{family}", script_family(language)))
    }

    /// Detection model path (shared by all languages).
    pub fn detection_path(&self) -> PathBuf {
        self.model_dir.join(&self.detection_model)
    }
}

/// Map a language hint onto the recognition model family that covers it.
pub fn script_family(language: &str) -> &str {
    match language {
        "en" | "de" | "fr" | "es" | "it" | "pt" | "nl" | "pl" | "sv" | "da" | "no" | "fi"
        | "cs" | "sk" | "hu" | "ro" | "tr" | "id" | "ms" => "latin",
        "ru" | "uk" | "be" | "bg" | "sr" => "cyrillic",
        "hi" | "mr" | "ne" => "devanagari",
        other => other,
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("receipts.db"),
        }
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Directory uploads are copied into.
    pub upload_dir: PathBuf,

    /// Time budget for OCR of a single upload, in seconds.
    pub ocr_timeout_secs: u64,

    /// Accepted file extensions (lowercase, without dot).
    pub supported_extensions: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            ocr_timeout_secs: 120,
            supported_extensions: ["jpg", "jpeg", "png", "pdf", "txt"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RcptConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables_keep_declaration_order() {
        let config = ExtractionConfig::default();
        assert_eq!(config.vendors[0].name, "Amazon");
        assert_eq!(config.vendors[7].name, "Tata Power");
        assert_eq!(config.currencies[0].code, "INR");
        assert_eq!(config.default_category, "Other");
        assert_eq!(config.default_currency, "Unknown");
    }

    #[test]
    fn test_model_paths_use_script_family() {
        let models = ModelConfig::default();
        assert_eq!(
            models.recognition_path("en"),
            PathBuf::from("models/latin_rec.onnx")
        );
        assert_eq!(
            models.dictionary_path("ja"),
            PathBuf::from("models/ja_dict.txt")
        );
    }

    #[test]
    fn test_partial_config_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "pdf": { "max_pages": 2 } }"#).unwrap();

        let config = RcptConfig::from_file(&path).unwrap();
        assert_eq!(config.pdf.max_pages, 2);
        assert!(config.pdf.prefer_embedded_text);
        assert_eq!(config.ingest.ocr_timeout_secs, 120);
        assert_eq!(config.extraction.vendors.len(), 8);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = RcptConfig::default();
        config.ocr.language = "de".to_string();
        config.save(&path).unwrap();

        let loaded = RcptConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.language, "de");
    }
}
