//! Raw text extraction from PDF, EPUB, DOCX/DOC and plain text inputs.

mod docx;
mod epub;
mod ocr;
mod pdf;
mod plain;

use crate::config::OcrConfig;
use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use ocr::OcrOptions;

/// Input formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Epub,
    Docx,
    Doc,
    Plain,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "pdf" => Ok(Self::Pdf),
            "epub" => Ok(Self::Epub),
            "docx" => Ok(Self::Docx),
            "doc" => Ok(Self::Doc),
            "txt" | "md" => Ok(Self::Plain),
            _ => Err(PipelineError::UnsupportedFormat {
                extension: format!(".{}", extension),
            }),
        }
    }
}

/// Text pulled out of a document, with whatever metadata it carried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub title: Option<String>,
    pub author: Option<String>,
}

impl ExtractedText {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// OCR PDFs even when they carry a text layer.
    pub force_ocr: bool,
    pub ocr: OcrOptions,
}

impl ExtractOptions {
    pub fn from_config(force_ocr: bool, config: &OcrConfig) -> Self {
        Self {
            force_ocr,
            ocr: OcrOptions {
                dpi: config.dpi,
                language: config.language.clone(),
                timeout: Duration::from_secs(config.timeout_secs),
            },
        }
    }
}

/// Extract raw text from the document at `path`.
pub async fn extract_text(path: &Path, options: &ExtractOptions) -> Result<ExtractedText> {
    let format = SourceFormat::from_path(path)?;
    log::info!("Extracting text from: {}", path.display());

    match format {
        SourceFormat::Pdf => {
            if options.force_ocr {
                return ocr::ocr_pdf(path, &options.ocr).await.map(ExtractedText::from_text);
            }

            let owned = path.to_path_buf();
            if blocking(path, move || Ok(pdf::looks_scanned(&owned))).await? {
                log::info!("PDF appears to be scanned, running OCR");
                return ocr::ocr_pdf(path, &options.ocr).await.map(ExtractedText::from_text);
            }

            let owned = path.to_path_buf();
            blocking(path, move || pdf::extract_text_layer(&owned))
                .await
                .map(ExtractedText::from_text)
        }
        SourceFormat::Epub => {
            let owned = path.to_path_buf();
            blocking(path, move || epub::extract(&owned)).await
        }
        SourceFormat::Docx => {
            let owned = path.to_path_buf();
            blocking(path, move || docx::extract(&owned)).await
        }
        SourceFormat::Doc => {
            let converted = docx::convert_doc(path, options.ocr.timeout).await?;
            let docx_path = converted.path().to_path_buf();
            blocking(path, move || docx::extract(&docx_path)).await
        }
        SourceFormat::Plain => plain::read_text(path).await.map(ExtractedText::from_text),
    }
}

/// Run a parser off the async runtime.
async fn blocking<T, F>(path: &Path, work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| PipelineError::extraction(PathBuf::from(path), e))?
}
