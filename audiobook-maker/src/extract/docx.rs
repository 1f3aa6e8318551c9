//! Word documents: DOCX read straight from the zip container, DOC converted first.

use super::ExtractedText;
use crate::error::{PipelineError, Result};
use crate::tools;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

const OFFICE_HINT: &str = "Install LibreOffice to convert .doc files, or save the document as .docx.";

static PARAGRAPH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:p(?:\s[^>]*)?/>|<w:p(?:\s[^>]*)?>.*?</w:p>").unwrap());
/// Text boxes nest whole paragraphs inside a run.
static TEXT_BOX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:txbxContent\b.*?</w:txbxContent>").unwrap());
static PARAGRAPH_PROPERTIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<w:pPr\b.*?</w:pPr>").unwrap());
static RUN_CONTENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(?P<text>.*?)</w:t>|<w:(?P<tab>tab)\b[^>]*/>|<w:(?:br|cr)\b[^>]*/>")
        .unwrap()
});
static CORE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<dc:title(?:\s[^>]*)?>(.*?)</dc:title>").unwrap());
static CORE_CREATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<dc:creator(?:\s[^>]*)?>(.*?)</dc:creator>").unwrap());
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(?:#x(?P<hex>[0-9a-fA-F]+)|#(?P<dec>[0-9]+)|(?P<name>amp|lt|gt|quot|apos));").unwrap());

/// Extract paragraph text and core properties from a DOCX file.
pub fn extract(path: &Path) -> Result<ExtractedText> {
    let file = std::fs::File::open(path).map_err(|e| PipelineError::extraction(path, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| PipelineError::extraction(path, e))?;

    let document = read_entry(&mut archive, "word/document.xml")
        .map_err(|e| PipelineError::extraction(path, e))?
        .ok_or_else(|| PipelineError::extraction(path, "missing word/document.xml"))?;

    let core = read_entry(&mut archive, "docProps/core.xml")
        .map_err(|e| PipelineError::extraction(path, e))?
        .unwrap_or_default();

    Ok(ExtractedText {
        text: document_text(&document),
        title: core_property(&CORE_TITLE, &core),
        author: core_property(&CORE_CREATOR, &core),
    })
}

fn read_entry(
    archive: &mut zip::ZipArchive<std::fs::File>,
    name: &str,
) -> std::result::Result<Option<String>, zip::result::ZipError> {
    let mut entry = match archive.by_name(name) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut content = Vec::new();
    entry.read_to_end(&mut content)?;
    Ok(Some(String::from_utf8_lossy(&content).into_owned()))
}

/// Paragraph texts joined by newlines; empty paragraphs stay as empty lines.
///
/// Text box contents are skipped so the paragraph holding the box is read whole.
fn document_text(xml: &str) -> String {
    let xml = TEXT_BOX.replace_all(xml, "");
    PARAGRAPH
        .find_iter(&xml)
        .map(|paragraph| paragraph_text(paragraph.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

fn paragraph_text(paragraph: &str) -> String {
    let body = PARAGRAPH_PROPERTIES.replace_all(paragraph, "");
    let mut text = String::new();

    for caps in RUN_CONTENT.captures_iter(&body) {
        if let Some(run) = caps.name("text") {
            text.push_str(&decode_entities(run.as_str()));
        } else if caps.name("tab").is_some() {
            text.push('\t');
        } else {
            text.push('\n');
        }
    }

    text
}

fn core_property(pattern: &Regex, core: &str) -> Option<String> {
    pattern
        .captures(core)
        .map(|caps| decode_entities(caps[1].trim()))
        .filter(|value| !value.is_empty())
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let code = if let Some(hex) = caps.name("hex") {
                u32::from_str_radix(hex.as_str(), 16).ok()
            } else if let Some(dec) = caps.name("dec") {
                dec.as_str().parse().ok()
            } else {
                None
            };

            match (code, caps.name("name").map(|n| n.as_str())) {
                (Some(code), _) => char::from_u32(code).map(String::from).unwrap_or_default(),
                (None, Some("amp")) => "&".to_string(),
                (None, Some("lt")) => "<".to_string(),
                (None, Some("gt")) => ">".to_string(),
                (None, Some("quot")) => "\"".to_string(),
                (None, Some("apos")) => "'".to_string(),
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// A DOCX standing in for a legacy DOC file.
#[derive(Debug)]
pub struct ConvertedDoc {
    path: PathBuf,
    // Keeps the conversion output alive.
    _workdir: Option<TempDir>,
}

impl ConvertedDoc {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Find or produce a DOCX for a `.doc` file.
///
/// A sibling `.docx` with the same stem wins; otherwise LibreOffice converts
/// the document into a temporary directory.
pub async fn convert_doc(path: &Path, timeout: Duration) -> Result<ConvertedDoc> {
    let sibling = path.with_extension("docx");
    if sibling.exists() {
        log::info!("Using existing {}", sibling.display());
        return Ok(ConvertedDoc {
            path: sibling,
            _workdir: None,
        });
    }

    let office = tools::locate(&["soffice", "libreoffice"], OFFICE_HINT)?;
    let workdir = TempDir::new()?;

    log::info!("Converting {} to DOCX", path.display());
    let mut command = Command::new(office);
    command
        .args(["--headless", "--convert-to", "docx", "--outdir"])
        .arg(workdir.path())
        .arg(path);
    tools::run(command, None, timeout)
        .await
        .map_err(|e| PipelineError::extraction(path, e))?;

    let stem = path
        .file_stem()
        .ok_or_else(|| PipelineError::extraction(path, "file has no name"))?;
    let converted = workdir.path().join(stem).with_extension("docx");
    if !converted.exists() {
        return Err(PipelineError::extraction(path, "LibreOffice produced no .docx"));
    }

    Ok(ConvertedDoc {
        path: converted,
        _workdir: Some(workdir),
    })
}
