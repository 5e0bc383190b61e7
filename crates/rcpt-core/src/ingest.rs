//! Upload ingestion: persist the file, read its transcript, parse and store.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{OcrError, RcptError, Result};
use crate::models::config::IngestConfig;
use crate::models::receipt::ParsedReceipt;
use crate::ocr::{DocumentReader, EngineLoader};
use crate::receipt::ReceiptParser;
use crate::storage::{InsertOutcome, ReceiptStore};

/// Result of ingesting one upload.
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    /// Base name the upload was saved under.
    pub filename: String,
    pub receipt: ParsedReceipt,
    /// Stored id, or `None` when an identical receipt already existed.
    pub id: Option<i64>,
}

impl IngestOutcome {
    pub fn is_duplicate(&self) -> bool {
        self.id.is_none()
    }
}

/// Orchestrates upload handling over shared parser, reader and store.
pub struct Ingestor<L: EngineLoader + 'static> {
    parser: Arc<ReceiptParser>,
    reader: Arc<DocumentReader<L>>,
    store: Arc<ReceiptStore>,
    config: IngestConfig,
}

impl<L: EngineLoader + 'static> Ingestor<L> {
    pub fn new(
        parser: Arc<ReceiptParser>,
        reader: Arc<DocumentReader<L>>,
        store: Arc<ReceiptStore>,
        config: IngestConfig,
    ) -> Self {
        Self {
            parser,
            reader,
            store,
            config,
        }
    }

    pub fn store(&self) -> &ReceiptStore {
        &self.store
    }

    /// Ingest an uploaded file given by name and content.
    pub async fn ingest_bytes(
        &self,
        filename: &str,
        bytes: &[u8],
        language: &str,
    ) -> Result<IngestOutcome> {
        let basename = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = self.check_extension(&basename)?;

        let bytes: Arc<[u8]> = Arc::from(bytes);
        let saved = self.save_upload(&basename, Arc::clone(&bytes)).await?;
        debug!("Saved upload to {}", saved.display());

        // The transcript comes from this upload's own bytes, never from the
        // saved copy, which a concurrent upload of the same name may replace.
        let text = if extension == "txt" {
            String::from_utf8_lossy(&bytes).into_owned()
        } else {
            self.ocr(bytes, extension, language).await?
        };

        let receipt = self.parser.parse_receipt(&text);
        let id = match self.store.insert(&receipt, Some(&basename))? {
            InsertOutcome::Inserted(id) => Some(id),
            InsertOutcome::Duplicate => None,
        };

        info!(
            "Ingested {}: vendor={:?} amount={:?} ({})",
            basename,
            receipt.vendor,
            receipt.amount,
            if id.is_some() { "stored" } else { "duplicate" }
        );

        Ok(IngestOutcome {
            filename: basename,
            receipt,
            id,
        })
    }

    /// Ingest a file from disk.
    pub async fn ingest_file(&self, path: &Path, language: &str) -> Result<IngestOutcome> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.check_extension(&filename)?;

        let bytes = tokio::fs::read(path).await?;
        self.ingest_bytes(&filename, &bytes, language).await
    }

    /// Lowercased extension, if it is one of the supported ones.
    fn check_extension(&self, filename: &str) -> Result<String> {
        let extension = Path::new(filename)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if extension.is_empty() || !self.config.supported_extensions.contains(&extension) {
            return Err(RcptError::UnsupportedFileType(filename.to_string()));
        }
        Ok(extension)
    }

    /// Write the upload to `upload_dir/<basename>`.
    ///
    /// Content is staged in a unique temp file and renamed into place, so the
    /// saved copy is always one complete upload.
    async fn save_upload(&self, basename: &str, bytes: Arc<[u8]>) -> Result<PathBuf> {
        let dir = self.config.upload_dir.clone();
        let target = dir.join(basename);
        let saved = target.clone();

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            let mut staged = tempfile::NamedTempFile::new_in(&dir)?;
            staged.write_all(&bytes)?;
            staged.persist(&saved).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(std::io::Error::other)??;

        Ok(target)
    }

    async fn ocr(&self, bytes: Arc<[u8]>, extension: String, language: &str) -> Result<String> {
        let reader = Arc::clone(&self.reader);
        let language = language.to_string();
        let secs = self.config.ocr_timeout_secs;

        let task =
            tokio::task::spawn_blocking(move || reader.extract_bytes(&bytes, &extension, &language));
        let text = tokio::time::timeout(Duration::from_secs(secs), task)
            .await
            .map_err(|_| OcrError::Timeout(secs))?
            .map_err(|e| OcrError::Recognition(format!("OCR task failed: {}", e)))??;
        Ok(text)
    }
}
