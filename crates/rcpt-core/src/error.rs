//! Error types for the rcpt-core library.

use thiserror::Error;

/// Main error type for the rcpt library.
#[derive(Error, Debug)]
pub enum RcptError {
    /// The uploaded file has an extension outside the supported set.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Parser construction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors raised by the OCR collaborator.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The image could not be decoded.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// The file type cannot be processed by OCR.
    #[error("unsupported format for OCR: {0}")]
    UnsupportedFormat(String),

    /// OCR did not finish within the configured time budget.
    #[error("OCR timed out after {0}s")]
    Timeout(u64),

    /// The PDF container could not be read.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// I/O error while reading the source file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to building a receipt parser.
///
/// Parsing itself never fails; these only surface when a configuration
/// produces an invalid pattern.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// A pattern built from configuration failed to compile.
    #[error("invalid pattern for {field}: {reason}")]
    Pattern { field: String, reason: String },
}

/// Errors related to receipt storage.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Underlying SQLite failure.
    #[cfg(feature = "native")]
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No receipt with the given id.
    #[error("receipt {0} not found")]
    NotFound(i64),

    /// An update carried no editable fields.
    #[error("no valid fields to update")]
    NoFieldsToUpdate,

    /// A field value failed validation.
    #[error("invalid value for {field}: {value}")]
    InvalidField { field: String, value: String },

    /// The database directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage lock was poisoned by a panicking writer.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Result type for the rcpt library.
pub type Result<T> = std::result::Result<T, RcptError>;
