//! Audio assembly: merging MP3 parts into tagged tracks.

pub mod assembler;
#[cfg(test)]
pub mod mock;

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub use assembler::FfmpegAssembler;

/// ID3 tags written to a merged track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackTags {
    pub title: String,
    pub artist: String,
    pub album: String,
}

/// Merges audio parts, in order, into one tagged MP3.
#[async_trait]
pub trait AudioAssembler: Send + Sync {
    async fn merge(&self, parts: &[PathBuf], output: &Path, tags: &TrackTags) -> Result<()>;
}
