//! PDF text layer extraction.

use crate::error::{PipelineError, Result};
use std::path::Path;

/// Pages sampled when deciding whether a PDF is scanned.
const SCAN_SAMPLE_PAGES: usize = 5;

/// Fewer non-whitespace characters than this in the sample means no usable text layer.
const SCAN_TEXT_THRESHOLD: usize = 200;

/// Whether the first pages carry too little text to be anything but images.
///
/// Pages are sampled with pdf-extract, the primary text-layer reader, and
/// with lopdf only when pdf-extract cannot parse the file. A PDF neither can
/// load is not treated as scanned; the text layer path reports the real error.
pub fn looks_scanned(path: &Path) -> bool {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            log::debug!("could not read {} for scan detection: {}", path.display(), e);
            return false;
        }
    };

    let pages = match sample_with_pdf_extract(&bytes) {
        Ok(pages) => pages,
        Err(message) => {
            log::debug!("pdf-extract could not sample pages ({}), trying lopdf", message);
            match sample_with_lopdf(&bytes) {
                Ok(pages) => pages,
                Err(e) => {
                    log::debug!("could not sample {} for scan detection: {}", path.display(), e);
                    return false;
                }
            }
        }
    };

    is_scanned_sample(&pages)
}

fn sample_with_pdf_extract(bytes: &[u8]) -> std::result::Result<Vec<String>, String> {
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| "parser panicked".to_string())?
        .map(|mut pages| {
            pages.truncate(SCAN_SAMPLE_PAGES);
            pages
        })
        .map_err(|e| e.to_string())
}

fn sample_with_lopdf(bytes: &[u8]) -> std::result::Result<Vec<String>, lopdf::Error> {
    let doc = lopdf::Document::load_mem(bytes)?;
    Ok(doc
        .get_pages()
        .keys()
        .take(SCAN_SAMPLE_PAGES)
        .map(|page| doc.extract_text(&[*page]).unwrap_or_default())
        .collect())
}

/// Decide on the first `SCAN_SAMPLE_PAGES` page texts.
fn is_scanned_sample(pages: &[String]) -> bool {
    let visible: usize = pages
        .iter()
        .take(SCAN_SAMPLE_PAGES)
        .map(|text| text.chars().filter(|c| !c.is_whitespace()).count())
        .sum();

    log::debug!("scan sample has {} visible characters", visible);
    visible < SCAN_TEXT_THRESHOLD
}

/// Extract the embedded text layer, falling back to page-by-page lopdf extraction.
pub fn extract_text_layer(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::extraction(path, e))?;

    match extract_with_pdf_extract(&bytes) {
        Ok(text) => return Ok(text),
        Err(message) => {
            log::warn!("pdf-extract failed ({}), falling back to lopdf", message);
        }
    }

    extract_with_lopdf(&bytes).map_err(|e| PipelineError::extraction(path, e))
}

fn extract_with_pdf_extract(bytes: &[u8]) -> std::result::Result<String, String> {
    // pdf-extract panics on some malformed inputs
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| "parser panicked".to_string())?
        .map_err(|e| e.to_string())
}

fn extract_with_lopdf(bytes: &[u8]) -> std::result::Result<String, lopdf::Error> {
    let doc = lopdf::Document::load_mem(bytes)?;
    let pages = doc
        .get_pages()
        .keys()
        .map(|page| doc.extract_text(&[*page]))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(pages.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unloadable_pdf_is_not_scanned() {
        assert!(!looks_scanned(Path::new("/nonexistent/file.pdf")));
    }

    #[test]
    fn test_scan_sample_threshold() {
        assert!(is_scanned_sample(&[]));
        assert!(is_scanned_sample(&vec!["   \n".to_string(); 5]));
        assert!(is_scanned_sample(&["x".repeat(199)]));
        assert!(!is_scanned_sample(&["x".repeat(120), "y".repeat(80)]));
    }

    #[test]
    fn test_scan_sample_only_counts_first_pages() {
        let mut pages = vec![String::new(); SCAN_SAMPLE_PAGES];
        pages.push("x".repeat(1000));
        assert!(is_scanned_sample(&pages));
    }

    #[test]
    fn test_garbage_pdf_fails_both_extractors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        assert!(!looks_scanned(&path));
        let err = extract_text_layer(&path).unwrap_err();
        assert!(matches!(err, PipelineError::Extraction { .. }));
    }
}
