//! OCR for scanned PDFs via `pdftoppm` and `tesseract`.

use crate::error::{PipelineError, Result};
use crate::tools;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

const PDFTOPPM_HINT: &str = "Install poppler-utils (provides pdftoppm) to OCR scanned PDFs.";
const TESSERACT_HINT: &str = "Install Tesseract OCR and the language data you need.";

#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Page render resolution.
    pub dpi: u32,
    /// Tesseract language code, e.g. `eng` or `hin`.
    pub language: String,
    /// Bound on each external call.
    pub timeout: Duration,
}

/// Render every page of `path` and OCR them in page order.
pub async fn ocr_pdf(path: &Path, options: &OcrOptions) -> Result<String> {
    let pdftoppm = tools::locate(&["pdftoppm"], PDFTOPPM_HINT)?;
    let tesseract = tools::locate(&["tesseract"], TESSERACT_HINT)?;

    let render_dir = TempDir::new()?;
    let prefix = render_dir.path().join("page");

    let mut render = Command::new(pdftoppm);
    render
        .arg("-r")
        .arg(options.dpi.to_string())
        .arg("-png")
        .arg(path)
        .arg(&prefix);
    tools::run(render, None, options.timeout)
        .await
        .map_err(|e| PipelineError::extraction(path, e))?;

    let pages = rendered_pages(render_dir.path())?;
    if pages.is_empty() {
        return Err(PipelineError::extraction(path, "pdftoppm rendered no pages"));
    }

    let mut texts = Vec::with_capacity(pages.len());
    for (i, page) in pages.iter().enumerate() {
        log::info!("OCR: page {}/{}", i + 1, pages.len());

        let mut recognize = Command::new(&tesseract);
        recognize
            .arg(page)
            .arg("stdout")
            .arg("-l")
            .arg(&options.language);
        let output = tools::run(recognize, None, options.timeout)
            .await
            .map_err(|e| PipelineError::extraction(path, e))?;

        texts.push(String::from_utf8_lossy(&output.stdout).into_owned());
    }

    Ok(texts.join("\n"))
}

/// PNG files written by pdftoppm, in page order.
///
/// pdftoppm zero-pads page numbers to the width of the page count, so a
/// lexical sort of the names is page order.
fn rendered_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
        .collect();
    pages.sort();
    Ok(pages)
}
