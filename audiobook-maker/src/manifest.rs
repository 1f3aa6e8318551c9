//! The book manifest written beside the audio.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub title: String,
    pub author: String,
    /// ISO 639-1 code
    pub language: String,
    pub chapters: Vec<ManifestChapter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestChapter {
    pub title: String,
    /// Body length in characters
    pub char_len: usize,
}

impl Manifest {
    /// Write as pretty-printed JSON to `manifest.json` in `dir`.
    pub fn write_to(&self, dir: &Path) -> Result<()> {
        let path = dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}
