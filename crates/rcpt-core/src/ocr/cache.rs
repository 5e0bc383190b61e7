//! Per-language OCR engine cache.
//!
//! Engines are not required to be thread-safe (the ONNX plans inside
//! `pure-onnx-ocr` use interior mutability), so each language gets a
//! dedicated worker thread that loads the engine once and owns it for the
//! lifetime of the cache. Callers talk to it through an [`EngineHandle`].

use std::collections::HashMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::OcrError;

use super::{EngineLoader, OcrResult, TextRecognizer};

type Reply = mpsc::SyncSender<Result<OcrResult, OcrError>>;

struct Job {
    image: DynamicImage,
    reply: Reply,
}

/// Sending side of a language's OCR worker.
#[derive(Clone)]
pub struct EngineHandle {
    language: String,
    jobs: mpsc::Sender<Job>,
}

impl EngineHandle {
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Run recognition on the worker and wait for its answer.
    pub fn recognize(&self, image: DynamicImage) -> Result<OcrResult, OcrError> {
        let (reply, answer) = mpsc::sync_channel(1);
        self.jobs
            .send(Job { image, reply })
            .map_err(|_| self.stopped())?;
        answer.recv().map_err(|_| self.stopped())?
    }

    fn stopped(&self) -> OcrError {
        OcrError::Recognition(format!("OCR worker for {:?} stopped", self.language))
    }
}

/// Holds one loaded engine per language.
///
/// Engines are created on first request for a language and reused for the
/// lifetime of the cache; an entry is never replaced once inserted. Workers
/// exit once the cache and every handle cloned from it are dropped.
pub struct EngineCache<L: EngineLoader> {
    loader: Arc<L>,
    engines: Mutex<HashMap<String, EngineHandle>>,
}

impl<L: EngineLoader> EngineCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader: Arc::new(loader),
            engines: Mutex::new(HashMap::new()),
        }
    }

    /// Get the engine for a language, loading it on first use.
    pub fn get(&self, language: &str) -> Result<EngineHandle, OcrError> {
        // Held across the load so concurrent first requests wait for one worker.
        let mut engines = self
            .engines
            .lock()
            .map_err(|_| OcrError::ModelLoad("engine cache lock poisoned".to_string()))?;

        if let Some(handle) = engines.get(language) {
            debug!("Reusing OCR engine for {:?}", language);
            return Ok(handle.clone());
        }

        info!("Loading OCR engine for {:?}", language);
        let handle = spawn_worker(Arc::clone(&self.loader), language)?;
        engines.insert(language.to_string(), handle.clone());
        Ok(handle)
    }

    /// Languages with a loaded engine, sorted.
    pub fn loaded_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = match self.engines.lock() {
            Ok(engines) => engines.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        languages.sort();
        languages
    }
}

/// Start a worker that loads the engine on its own thread.
///
/// Returns once the load has finished; a failed load ends the worker.
fn spawn_worker<L: EngineLoader>(loader: Arc<L>, language: &str) -> Result<EngineHandle, OcrError> {
    let (jobs, queue) = mpsc::channel::<Job>();
    let (ready, loaded) = mpsc::sync_channel(1);
    let worker_language = language.to_string();

    thread::Builder::new()
        .name(format!("ocr-{}", language))
        .spawn(move || {
            let engine = match loader.load(&worker_language) {
                Ok(engine) => {
                    let _ = ready.send(Ok(()));
                    engine
                }
                Err(e) => {
                    let _ = ready.send(Err(e));
                    return;
                }
            };

            for job in queue {
                // The caller may have given up (timeout); drop the answer then.
                let _ = job.reply.send(engine.recognize(&job.image));
            }
            debug!("OCR worker for {:?} exiting", worker_language);
        })
        .map_err(|e| OcrError::ModelLoad(format!("failed to start OCR worker: {}", e)))?;

    match loaded.recv() {
        Ok(Ok(())) => Ok(EngineHandle {
            language: language.to_string(),
            jobs,
        }),
        Ok(Err(e)) => {
            warn!("OCR engine for {:?} failed to load: {}", language, e);
            Err(e)
        }
        Err(_) => Err(OcrError::ModelLoad(format!(
            "OCR worker for {:?} exited during load",
            language
        ))),
    }
}
