//! Document text extraction for uploaded job descriptions and resumes.
//!
//! File type is sniffed from content (magic bytes), never trusted from the extension.
//! Extraction is CPU-bound; async callers go through `extract_blocking`.

pub mod docx;

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

const PDF_MAGIC: &[u8] = b"%PDF-";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("File content is empty")]
    Empty,

    #[error("File size ({size} bytes) exceeds maximum limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Unsupported file type for '{0}'. Only PDF and DOCX files are supported.")]
    UnsupportedType(String),

    #[error("Error extracting text from PDF: {0}")]
    Pdf(String),

    #[error("Error extracting text from DOCX: {0}")]
    Docx(String),

    #[error("Extraction worker failed: {0}")]
    Worker(String),
}

/// An uploaded file as received from a multipart request.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Docx,
}

impl FileKind {
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PDF_MAGIC) {
            Some(FileKind::Pdf)
        } else if bytes.starts_with(ZIP_MAGIC) {
            Some(FileKind::Docx)
        } else {
            None
        }
    }
}

/// Turns an uploaded document into plain text.
pub trait DocumentProcessor: Send + Sync {
    fn extract_text(&self, file: &UploadedFile) -> Result<String, ExtractionError>;
}

/// PDF and DOCX extraction with a per-file size limit.
#[derive(Debug, Clone)]
pub struct FileDocumentProcessor {
    max_file_bytes: usize,
}

impl Default for FileDocumentProcessor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILE_BYTES)
    }
}

impl FileDocumentProcessor {
    pub fn new(max_file_bytes: usize) -> Self {
        Self { max_file_bytes }
    }
}

impl DocumentProcessor for FileDocumentProcessor {
    fn extract_text(&self, file: &UploadedFile) -> Result<String, ExtractionError> {
        let size = file.bytes.len();
        if size == 0 {
            return Err(ExtractionError::Empty);
        }
        if size > self.max_file_bytes {
            return Err(ExtractionError::TooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }

        let kind = FileKind::detect(&file.bytes)
            .ok_or_else(|| ExtractionError::UnsupportedType(file.filename.clone()))?;
        info!(
            "Processing {:?} '{}' ({:.2} KB)",
            kind,
            file.filename,
            size as f64 / 1024.0
        );

        let text = match kind {
            FileKind::Pdf => pdf_text(&file.bytes)?,
            FileKind::Docx => docx::extract_text(&file.bytes)?,
        };

        let text = text.trim().to_string();
        if text.is_empty() {
            warn!("No text extracted from '{}'", file.filename);
        } else {
            info!(
                "Extracted {} characters from '{}'",
                text.chars().count(),
                file.filename
            );
        }
        Ok(text)
    }
}

// pdf-extract panics on some malformed inputs instead of returning an error.
fn pdf_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ExtractionError::Pdf(e.to_string())),
        Err(_) => Err(ExtractionError::Pdf("PDF parser panicked".to_string())),
    }
}

/// Runs extraction on the blocking pool. A panic inside a parser fails only this file.
pub async fn extract_blocking(
    processor: Arc<dyn DocumentProcessor>,
    file: UploadedFile,
) -> Result<String, ExtractionError> {
    tokio::task::spawn_blocking(move || processor.extract_text(&file))
        .await
        .map_err(|e| ExtractionError::Worker(e.to_string()))?
}
