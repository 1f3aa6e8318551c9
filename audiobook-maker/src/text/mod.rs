//! Text stages: normalization, chapter segmentation, sentence chunking.

pub mod chunker;
pub mod language;
pub mod normalizer;
pub mod segmenter;
mod sentences;

pub use chunker::{Chunk, Chunker};
#[cfg(test)]
pub use chunker::reassemble;
pub use language::detect_language;
pub use normalizer::TextNormalizer;
pub use segmenter::ChapterSegmenter;
