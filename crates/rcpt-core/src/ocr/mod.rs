//! OCR collaborator: text recognition over receipt images and PDFs.

mod cache;
#[cfg(feature = "native")]
mod document;
#[cfg(feature = "native")]
mod pure_engine;

pub use cache::{EngineCache, EngineHandle};
#[cfg(feature = "native")]
pub use document::DocumentReader;
#[cfg(feature = "native")]
pub use pure_engine::{PureOcrEngine, PureOcrLoader};

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::error::OcrError;

/// Rows closer than this many pixels are read as one line.
const ROW_TOLERANCE_PX: f32 = 20.0;

/// A recognized text region with its coordinates and content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextBox {
    /// Bounding box coordinates (x1, y1, x2, y2, x3, y3, x4, y4) for quadrilateral.
    pub bbox: [f32; 8],

    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub score: f32,
}

impl TextBox {
    /// Get the axis-aligned bounding rectangle.
    pub fn rect(&self) -> (f32, f32, f32, f32) {
        let xs = [self.bbox[0], self.bbox[2], self.bbox[4], self.bbox[6]];
        let ys = [self.bbox[1], self.bbox[3], self.bbox[5], self.bbox[7]];

        let min_x = xs.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_x = xs.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let min_y = ys.iter().cloned().fold(f32::INFINITY, f32::min);
        let max_y = ys.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

        (min_x, min_y, max_x, max_y)
    }
}

/// Result of OCR processing on an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    /// Recognized text boxes.
    pub boxes: Vec<TextBox>,

    /// Full transcript (boxes joined with newlines).
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,

    /// Image dimensions (width, height).
    pub image_size: (u32, u32),
}

impl OcrResult {
    /// Create an empty result.
    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            boxes: Vec::new(),
            text: String::new(),
            processing_time_ms: 0,
            image_size: (width, height),
        }
    }

    /// Build a result from unordered boxes, rebuilding the transcript.
    pub fn from_boxes(boxes: Vec<TextBox>, image_size: (u32, u32), processing_time_ms: u64) -> Self {
        let mut result = Self {
            boxes,
            text: String::new(),
            processing_time_ms,
            image_size,
        };
        result.sort_by_reading_order();
        result
    }

    /// Sort boxes by reading order (top-to-bottom, left-to-right).
    pub fn sort_by_reading_order(&mut self) {
        self.boxes.sort_by(|a, b| {
            let (ax, ay, _, _) = a.rect();
            let (bx, by, _, _) = b.rect();

            let row_a = (ay / ROW_TOLERANCE_PX) as i32;
            let row_b = (by / ROW_TOLERANCE_PX) as i32;

            row_a
                .cmp(&row_b)
                .then_with(|| ax.partial_cmp(&bx).unwrap_or(std::cmp::Ordering::Equal))
        });

        self.text = self
            .boxes
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }
}

/// Recognizes text in a decoded image.
///
/// Implementations may hold thread-bound state; [`EngineCache`] keeps each
/// one on the thread that loaded it.
pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError>;
}

/// Creates a recognizer for a language hint.
///
/// Loading is assumed to be expensive; [`EngineCache`] calls it at most
/// once per language, on that language's worker thread.
pub trait EngineLoader: Send + Sync + 'static {
    type Engine: TextRecognizer + 'static;

    fn load(&self, language: &str) -> Result<Self::Engine, OcrError>;
}
