//! PDF text and image access using lopdf and pdf-extract.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::Result;
use crate::error::PdfError;

/// A loaded PDF: its object tree for images and raw bytes for text.
pub struct PdfDocument {
    document: Document,
    /// Decrypted bytes handed to `pdf-extract`.
    raw_data: Vec<u8>,
}

impl PdfDocument {
    /// Load a PDF from bytes, decrypting it if it uses an empty password.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            document
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if document.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", document.get_pages().len());
        Ok(Self { document, raw_data })
    }

    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Embedded text of the whole document.
    pub fn text(&self) -> Result<String> {
        pdf_extract::extract_text_from_mem(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Images referenced from a page's XObject resources (1-indexed page).
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let pages = self.document.get_pages();
        let page_id = pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();
        let Some(resources) = self.page_resources(*page_id) else {
            return Ok(images);
        };

        if let Ok(xobjects) = resources.get(b"XObject") {
            if let Ok((_, Object::Dictionary(xobjects))) = self.document.dereference(xobjects) {
                for (_name, reference) in xobjects.iter() {
                    if let Ok((_, object)) = self.document.dereference(reference) {
                        if let Some(img) = decode_image(&self.document, object) {
                            images.push(img);
                        }
                    }
                }
            }
        }

        trace!("Page {} has {} decodable images", page, images.len());
        Ok(images)
    }

    /// Every decodable image object in the document, in object order.
    pub fn document_images(&self) -> Vec<DynamicImage> {
        let images: Vec<DynamicImage> = self
            .document
            .objects
            .values()
            .filter_map(|object| decode_image(&self.document, object))
            .collect();

        debug!("Found {} images in document", images.len());
        images
    }

    /// Images to OCR from the first `max_pages` pages (0 = all pages).
    ///
    /// When no page references an image directly, every image object in the
    /// document is used instead, still capped at `max_pages`.
    pub fn images_for_ocr(&self, max_pages: usize) -> Vec<DynamicImage> {
        let limit = if max_pages == 0 {
            self.page_count()
        } else {
            (max_pages as u32).min(self.page_count())
        };

        let mut images = Vec::new();
        for page in 1..=limit {
            match self.page_images(page) {
                Ok(found) => images.extend(found),
                Err(e) => warn!("Skipping page {}: {}", page, e),
            }
        }

        if images.is_empty() {
            debug!("No page-level images, scanning all objects");
            images = self.document_images();
            if max_pages > 0 {
                images.truncate(max_pages);
            }
        }

        images
    }

    /// Resources dictionary of a page, following inheritance from parents.
    fn page_resources(&self, node_id: ObjectId) -> Option<Dictionary> {
        let Ok(Object::Dictionary(node)) = self.document.get_object(node_id) else {
            return None;
        };

        if let Ok(resources) = node.get(b"Resources") {
            if let Ok((_, Object::Dictionary(resources))) = self.document.dereference(resources) {
                return Some(resources.clone());
            }
        }

        match node.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => self.page_resources(*parent_id),
            _ => None,
        }
    }
}

/// Decode an image XObject stream: JPEG, or raw 8-bit RGB / grayscale.
fn decode_image(document: &Document, object: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = object else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
    let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;

    let filter = dict.get(b"Filter").ok().and_then(|filter| match filter {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
        _ => None,
    });

    match filter {
        Some(b"DCTDecode") => {
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("Unsupported image filter {:?}", filter.map(String::from_utf8_lossy));
            return None;
        }
        _ => {}
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => document.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!("Unsupported bits per component: {}", bits);
        return None;
    }

    let pixels = (width as usize) * (height as usize);
    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            RgbImage::from_raw(width, height, data[..pixels * 3].to_vec()).map(DynamicImage::ImageRgb8)
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            GrayImage::from_raw(width, height, data[..pixels].to_vec()).map(DynamicImage::ImageLuma8)
        }
        _ => {
            trace!(
                "Could not decode image: {}x{}, colorspace={:?}, data_len={}",
                width,
                height,
                String::from_utf8_lossy(color_space),
                data.len()
            );
            None
        }
    }
}
