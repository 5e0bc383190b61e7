//! Core library for receipt OCR processing.
//!
//! This crate provides:
//! - Receipt field extraction (vendor, date, amount, category, currency)
//! - OCR of receipt images and PDFs with a per-language engine cache
//! - SQLite storage with querying, edits and spending statistics
//! - Upload ingestion tying the pieces together

pub mod error;
pub mod models;
pub mod ocr;
pub mod receipt;

#[cfg(feature = "native")]
pub mod ingest;
#[cfg(feature = "native")]
pub mod pdf;
#[cfg(feature = "native")]
pub mod storage;

pub use error::{ExtractionError, OcrError, RcptError, Result, StorageError};
pub use models::config::{ExtractionConfig, RcptConfig};
pub use models::receipt::{ParsedReceipt, StoredReceipt};
pub use ocr::{EngineCache, EngineHandle, EngineLoader, OcrResult, TextBox, TextRecognizer};
pub use receipt::{ExtractionResult, ReceiptParser};

#[cfg(feature = "native")]
pub use ingest::{IngestOutcome, Ingestor};
#[cfg(feature = "native")]
pub use ocr::{DocumentReader, PureOcrEngine, PureOcrLoader};
#[cfg(feature = "native")]
pub use pdf::PdfDocument;
#[cfg(feature = "native")]
pub use storage::{InsertOutcome, ReceiptQuery, ReceiptStore, ReceiptUpdate, Summary};
