// EPUB parsing and text extraction

use super::ExtractedText;
use crate::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static SCRIPT_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap());
static STYLE_ELEMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap());

/// Wide enough that html2text never wraps a paragraph.
const RENDER_WIDTH: usize = 10_000;

/// Extract the text of every spine document in reading order
pub fn extract(path: &Path) -> Result<ExtractedText> {
    let mut doc = epub::doc::EpubDoc::new(path)
        .map_err(|e| PipelineError::extraction(path, format!("failed to open EPUB: {}", e)))?;

    let title = doc.mdata("title").map(|m| m.value.clone());
    let author = doc.mdata("creator").map(|m| m.value.clone());

    let mut documents = Vec::new();
    let spine = doc.spine.clone();

    for spine_item in spine.iter() {
        let Some((content_bytes, mime)) = doc.get_resource(&spine_item.idref) else {
            log::debug!("spine item {} has no resource", spine_item.idref);
            continue;
        };
        if !is_markup(&mime) {
            continue;
        }

        let html = String::from_utf8_lossy(&content_bytes);
        let text = html_to_text(&html);
        if !text.trim().is_empty() {
            documents.push(text);
        }
    }

    Ok(ExtractedText {
        text: documents.join("\n"),
        title: non_empty(title),
        author: non_empty(author),
    })
}

fn is_markup(mime: &str) -> bool {
    mime.contains("html") || mime.contains("xml")
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Convert an XHTML document to plain text without markdown-style decorations
fn html_to_text(html: &str) -> String {
    let html = SCRIPT_ELEMENT.replace_all(html, "");
    let html = STYLE_ELEMENT.replace_all(&html, "");

    html2text::from_read_with_decorator(
        html.as_bytes(),
        RENDER_WIDTH,
        html2text::render::text_renderer::TrivialDecorator::new(),
    )
}
