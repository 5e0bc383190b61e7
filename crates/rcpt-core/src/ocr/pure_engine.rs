//! Pure Rust OCR engine wrapper using `pure-onnx-ocr`.

use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::OcrError;
use crate::models::config::{ModelConfig, OcrConfig};

use super::{EngineLoader, OcrResult, TextBox, TextRecognizer};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external ONNX Runtime).
pub struct PureOcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    config: OcrConfig,
}

impl PureOcrEngine {
    /// Load the detection model and the recognition model for a language.
    pub fn load(models: &ModelConfig, language: &str, config: OcrConfig) -> Result<Self, OcrError> {
        let det_path = models.detection_path();
        let rec_path = models.recognition_path(language);
        let dict_path = models.dictionary_path(language);

        for path in [&det_path, &rec_path, &dict_path] {
            if !path.exists() {
                return Err(OcrError::ModelLoad(format!(
                    "missing model file {} for language {:?}",
                    path.display(),
                    language
                )));
            }
        }

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!(
            "Loaded OCR engine for {:?} from {}",
            language,
            models.model_dir.display()
        );

        Ok(Self { engine, config })
    }
}

impl TextRecognizer for PureOcrEngine {
    fn recognize(&self, image: &DynamicImage) -> Result<OcrResult, OcrError> {
        let start = Instant::now();
        let (width, height) = image.dimensions();

        debug!("Recognizing image: {}x{}", width, height);

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        let boxes: Vec<TextBox> = results
            .iter()
            .filter(|r| r.confidence >= self.config.recognition_threshold)
            .map(|r| {
                let text = if self.config.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                TextBox {
                    bbox: polygon_to_bbox(&r.bounding_box),
                    text,
                    score: r.confidence,
                }
            })
            .collect();

        let result =
            OcrResult::from_boxes(boxes, (width, height), start.elapsed().as_millis() as u64);

        debug!(
            "OCR complete: {} of {} regions kept in {}ms",
            result.boxes.len(),
            results.len(),
            result.processing_time_ms
        );

        Ok(result)
    }
}

/// Loads [`PureOcrEngine`]s from a model directory.
pub struct PureOcrLoader {
    models: ModelConfig,
    config: OcrConfig,
}

impl PureOcrLoader {
    pub fn new(models: ModelConfig, config: OcrConfig) -> Self {
        Self { models, config }
    }
}

impl EngineLoader for PureOcrLoader {
    type Engine = PureOcrEngine;

    fn load(&self, language: &str) -> Result<PureOcrEngine, OcrError> {
        PureOcrEngine::load(&self.models, language, self.config.clone())
    }
}

/// Convert a `Polygon<f64>` to our `[f32; 8]` bbox format.
fn polygon_to_bbox(polygon: &pure_onnx_ocr::Polygon<f64>) -> [f32; 8] {
    let mut bbox = [0.0f32; 8];
    for (i, coord) in polygon.exterior().coords().take(4).enumerate() {
        bbox[i * 2] = coord.x as f32;
        bbox[i * 2 + 1] = coord.y as f32;
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_models_fail_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let loader = PureOcrLoader::new(
            ModelConfig {
                model_dir: dir.path().to_path_buf(),
                ..ModelConfig::default()
            },
            OcrConfig::default(),
        );

        match loader.load("en") {
            Err(OcrError::ModelLoad(msg)) => assert!(msg.contains("det.onnx"), "{}", msg),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("engine loaded without model files"),
        }
    }
}
