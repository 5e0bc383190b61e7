//! Rule-based field extractors for receipt transcripts.
//!
//! Every extractor works on the normalized line sequence produced by
//! [`normalize_lines`] and degrades to "nothing found" instead of failing.

pub mod amounts;
pub mod category;
pub mod dates;
pub mod lines;
pub mod patterns;
pub mod vendor;

pub use amounts::{parse_amount, AmountCandidate, AmountExtractor};
pub use category::CategoryMapper;
pub use dates::{normalize_date, parse_day_first, DateExtractor, DateResolution};
pub use lines::normalize_lines;
pub use vendor::{VendorMatch, VendorResolver, VendorStrategy};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the preferred value from the lines.
    fn extract(&self, lines: &[&str]) -> Option<Self::Output>;

    /// Extract every candidate, in scan order.
    fn extract_all(&self, lines: &[&str]) -> Vec<Self::Output>;
}

/// Extraction context with confidence scores.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Confidence score (0.0 - 1.0).
    pub confidence: f32,
    /// Index of the source line.
    pub line: Option<usize>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, confidence: f32, source: impl Into<String>) -> Self {
        Self {
            value,
            confidence,
            line: None,
            source: source.into(),
        }
    }

    pub fn on_line(mut self, index: usize) -> Self {
        self.line = Some(index);
        self
    }
}
