//! Mock assembler for testing
//!
//! Concatenates part bytes into the output file and records every merge.

use super::{AudioAssembler, TrackTags};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct Merge {
    pub parts: Vec<PathBuf>,
    pub output: PathBuf,
    pub tags: TrackTags,
}

#[derive(Default)]
pub struct MockAssembler {
    merges: Mutex<Vec<Merge>>,
}

impl MockAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merges(&self) -> Vec<Merge> {
        self.merges.lock().unwrap().clone()
    }
}

#[async_trait]
impl AudioAssembler for MockAssembler {
    async fn merge(&self, parts: &[PathBuf], output: &Path, tags: &TrackTags) -> Result<()> {
        if parts.is_empty() {
            return Err(PipelineError::assembly(output, "No audio parts to merge"));
        }

        let mut audio = Vec::new();
        for part in parts {
            audio.extend(std::fs::read(part)?);
        }
        std::fs::write(output, audio)?;

        self.merges.lock().unwrap().push(Merge {
            parts: parts.to_vec(),
            output: output.to_path_buf(),
            tags: tags.clone(),
        });
        Ok(())
    }
}
