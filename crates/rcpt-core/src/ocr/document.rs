//! Text extraction from receipt files (images and PDFs).

use std::path::Path;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::PdfConfig;
use crate::pdf::PdfDocument;

use super::{EngineCache, EngineLoader};

/// Reads the transcript of an image or PDF file.
pub struct DocumentReader<L: EngineLoader> {
    engines: EngineCache<L>,
    pdf: PdfConfig,
}

impl<L: EngineLoader> DocumentReader<L> {
    pub fn new(loader: L, pdf: PdfConfig) -> Self {
        Self {
            engines: EngineCache::new(loader),
            pdf,
        }
    }

    pub fn engines(&self) -> &EngineCache<L> {
        &self.engines
    }

    /// Extract the transcript of a `.jpg`, `.jpeg`, `.png` or `.pdf` file.
    pub fn extract_text(&self, path: &Path, language: &str) -> Result<String, OcrError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !is_ocr_format(&extension) {
            return Err(OcrError::UnsupportedFormat(extension));
        }

        info!("Extracting text from {} ({})", path.display(), language);
        let data = std::fs::read(path)?;
        self.extract_bytes(&data, &extension, language)
    }

    /// Extract the transcript of file content whose type is given by `extension`.
    pub fn extract_bytes(&self, data: &[u8], extension: &str, language: &str) -> Result<String, OcrError> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" => {
                let image = image::load_from_memory(data)
                    .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
                self.recognize_image(image, language)
            }
            "pdf" => self.extract_pdf_text(data, language),
            other => Err(OcrError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Recognize the text of one decoded image.
    pub fn recognize_image(&self, image: DynamicImage, language: &str) -> Result<String, OcrError> {
        let engine = self.engines.get(language)?;
        Ok(engine.recognize(image)?.text)
    }

    /// Embedded text when there is enough of it, otherwise OCR of page images.
    pub fn extract_pdf_text(&self, data: &[u8], language: &str) -> Result<String, OcrError> {
        let pdf = PdfDocument::load(data)?;

        let embedded = if self.pdf.prefer_embedded_text {
            match pdf.text() {
                Ok(text) => text,
                Err(e) => {
                    warn!("Embedded text extraction failed: {}", e);
                    String::new()
                }
            }
        } else {
            String::new()
        };

        if embedded.trim().len() >= self.pdf.min_text_length {
            debug!("Using {} chars of embedded PDF text", embedded.len());
            return Ok(embedded);
        }

        let images = pdf.images_for_ocr(self.pdf.max_pages);
        if images.is_empty() {
            warn!("PDF has neither enough text nor images to OCR");
            return Ok(embedded);
        }

        warn!(
            "PDF text too short ({} chars), running OCR on {} images",
            embedded.trim().len(),
            images.len()
        );

        let mut pages = Vec::with_capacity(images.len());
        for image in images {
            pages.push(self.recognize_image(image, language)?);
        }
        Ok(pages.join("\n"))
    }
}

fn is_ocr_format(extension: &str) -> bool {
    matches!(extension, "jpg" | "jpeg" | "png" | "pdf")
}
