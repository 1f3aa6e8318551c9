//! audiobook-maker configuration: pipeline heuristics, synthesis and OCR defaults.

use crate::error::{PipelineError, Result};
use crate::tts::TtsEngine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default character substitutions applied before any other cleaning.
const DEFAULT_SUBSTITUTIONS: &[(&str, &str)] = &[
    ("\u{fb00}", "ff"),  // ff ligature
    ("\u{fb01}", "fi"),  // fi ligature
    ("\u{fb02}", "fl"),  // fl ligature
    ("\u{fb03}", "ffi"), // ffi ligature
    ("\u{fb04}", "ffl"), // ffl ligature
    ("\u{fb05}", "st"),  // long s t ligature
    ("\u{fb06}", "st"),  // st ligature
    ("\u{2011}", "-"),   // Non-breaking hyphen
    ("\u{2012}", "-"),   // Figure dash
    ("\u{2013}", "-"),   // En dash
    ("\u{2014}", "-"),   // Em dash
    ("\u{2015}", "-"),   // Horizontal bar
    ("\u{2026}", "..."), // Ellipsis
    ("\u{00a0}", " "),   // Non-breaking space
    ("\u{2018}", "'"),   // Left single quote
    ("\u{2019}", "'"),   // Right single quote
    ("\u{201c}", "\""),  // Left double quote
    ("\u{201d}", "\""),  // Right double quote
    ("\u{200b}", ""),    // Zero-width space
    ("\u{200c}", ""),    // Zero-width non-joiner
    ("\u{200d}", ""),    // Zero-width joiner
    ("\u{feff}", ""),    // BOM
];

/// Abbreviations that never end a sentence.
const DEFAULT_ABBREVIATIONS: &[&str] = &[
    "Mr", "Ms", "Mrs", "Dr", "Prof", "Sr", "Jr", "St", "vs", "e.g", "i.e", "cf", "etc", "No",
    "Fig", "Eq", "Ch",
];

pub const DEFAULT_HEADING_PATTERN: &str = r"(?i)^(chapter|section|part)\s+\w+\.?$";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudiobookConfig {
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub segmenter: SegmenterConfig,

    #[serde(default)]
    pub chunker: ChunkerConfig,

    #[serde(default)]
    pub synthesis: SynthesisConfig,

    #[serde(default)]
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    /// Lines repeating at least this many times are treated as headers/footers
    #[serde(default = "default_header_threshold")]
    pub header_threshold: usize,

    /// Shortest trimmed line considered a header/footer candidate
    #[serde(default = "default_header_min_len")]
    pub header_min_len: usize,

    /// Longest trimmed line considered a header/footer candidate
    #[serde(default = "default_header_max_len")]
    pub header_max_len: usize,

    /// Character-to-string replacements (ligatures, dashes, quotes)
    #[serde(default = "default_substitutions")]
    pub substitutions: BTreeMap<String, String>,
}

fn default_header_threshold() -> usize {
    15
}

fn default_header_min_len() -> usize {
    4
}

fn default_header_max_len() -> usize {
    80
}

fn default_substitutions() -> BTreeMap<String, String> {
    DEFAULT_SUBSTITUTIONS
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            header_threshold: default_header_threshold(),
            header_min_len: default_header_min_len(),
            header_max_len: default_header_max_len(),
            substitutions: default_substitutions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Regex matched against each trimmed line to detect explicit headings
    #[serde(default = "default_heading_pattern")]
    pub heading_pattern: String,

    /// All-caps lines shorter than this are not headings
    #[serde(default = "default_caps_min_len")]
    pub caps_min_len: usize,

    /// All-caps lines longer than this are not headings
    #[serde(default = "default_caps_max_len")]
    pub caps_max_len: usize,
}

fn default_heading_pattern() -> String {
    DEFAULT_HEADING_PATTERN.to_string()
}

fn default_caps_min_len() -> usize {
    3
}

fn default_caps_max_len() -> usize {
    60
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            heading_pattern: default_heading_pattern(),
            caps_min_len: default_caps_min_len(),
            caps_max_len: default_caps_max_len(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum characters per TTS chunk
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,

    /// Words that end in a period without ending the sentence
    #[serde(default = "default_abbreviations")]
    pub abbreviations: Vec<String>,
}

fn default_max_chars() -> usize {
    4000
}

fn default_abbreviations() -> Vec<String> {
    DEFAULT_ABBREVIATIONS.iter().map(|a| a.to_string()).collect()
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            abbreviations: default_abbreviations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// TTS backend used when --tts-engine is not given
    #[serde(default)]
    pub engine: TtsEngine,

    /// Concurrent synthesis calls per chapter
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Timeout for a single synthesis call
    #[serde(default = "default_synthesis_timeout")]
    pub timeout_secs: u64,

    /// Extra attempts after a failed synthesis call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Google Translate top-level domain (com, co.uk, com.au, ...)
    #[serde(default = "default_gtts_tld")]
    pub gtts_tld: String,

    /// Slower speech for the network backend
    #[serde(default)]
    pub gtts_slow: bool,

    /// Words per minute for the offline backend
    #[serde(default = "default_speech_rate")]
    pub speech_rate: u32,

    /// Voice name substring for the offline backend
    #[serde(default)]
    pub voice: Option<String>,
}

fn default_workers() -> usize {
    2
}

fn default_synthesis_timeout() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    2
}

fn default_gtts_tld() -> String {
    "com".to_string()
}

fn default_speech_rate() -> u32 {
    180
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            engine: TtsEngine::default(),
            workers: default_workers(),
            timeout_secs: default_synthesis_timeout(),
            max_retries: default_max_retries(),
            gtts_tld: default_gtts_tld(),
            gtts_slow: false,
            speech_rate: default_speech_rate(),
            voice: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Page render resolution
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Tesseract language code (eng, deu, hin, ...)
    #[serde(default = "default_ocr_language")]
    pub language: String,

    /// Timeout for each external OCR/conversion process
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

fn default_dpi() -> u32 {
    300
}

fn default_ocr_language() -> String {
    "eng".to_string()
}

fn default_ocr_timeout() -> u64 {
    600
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            language: default_ocr_language(),
            timeout_secs: default_ocr_timeout(),
        }
    }
}

impl AudiobookConfig {
    /// Get the config file path: ~/.config/cli-programs/audiobook.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PipelineError::Config("Could not determine home directory".into()))?;
        Ok(home
            .join(".config")
            .join("cli-programs")
            .join("audiobook.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: AudiobookConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunker.max_chars == 0 {
            return Err(PipelineError::Config("chunker.max_chars must be at least 1".into()));
        }
        if self.synthesis.workers == 0 {
            return Err(PipelineError::Config("synthesis.workers must be at least 1".into()));
        }
        if self.ocr.dpi == 0 {
            return Err(PipelineError::Config("ocr.dpi must be positive".into()));
        }
        if self.normalizer.header_min_len > self.normalizer.header_max_len {
            return Err(PipelineError::Config(
                "normalizer.header_min_len must not exceed header_max_len".into(),
            ));
        }
        if self.segmenter.caps_min_len > self.segmenter.caps_max_len {
            return Err(PipelineError::Config(
                "segmenter.caps_min_len must not exceed caps_max_len".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AudiobookConfig::default();
        assert_eq!(config.normalizer.header_threshold, 15);
        assert_eq!(config.chunker.max_chars, 4000);
        assert_eq!(config.ocr.dpi, 300);
        assert_eq!(config.ocr.language, "eng");
        assert_eq!(config.synthesis.engine, TtsEngine::Gtts);
        assert_eq!(config.normalizer.substitutions["\u{fb01}"], "fi");
        assert!(config.chunker.abbreviations.contains(&"e.g".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_path() {
        let path = AudiobookConfig::config_path();
        assert!(path.is_ok());
        let path = path.unwrap();
        assert!(path.ends_with("cli-programs/audiobook.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
[normalizer]
header_threshold = 5

[segmenter]
heading_pattern = "^Book \\d+$"

[chunker]
max_chars = 200
abbreviations = ["Capt"]

[synthesis]
engine = "pyttsx3"
workers = 4
voice = "english"

[ocr]
dpi = 200
language = "deu"
"#;
        let config: AudiobookConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.normalizer.header_threshold, 5);
        assert_eq!(config.normalizer.header_max_len, 80);
        assert_eq!(config.segmenter.heading_pattern, r"^Book \d+$");
        assert_eq!(config.chunker.max_chars, 200);
        assert_eq!(config.chunker.abbreviations, vec!["Capt".to_string()]);
        assert_eq!(config.synthesis.engine, TtsEngine::Espeak);
        assert_eq!(config.synthesis.workers, 4);
        assert_eq!(config.synthesis.voice.as_deref(), Some("english"));
        assert_eq!(config.ocr.dpi, 200);
        assert_eq!(config.ocr.language, "deu");
    }

    #[test]
    fn test_parse_empty_config() {
        let config: AudiobookConfig = toml::from_str("").unwrap();
        assert_eq!(config.chunker.max_chars, 4000);
        assert_eq!(config.synthesis.timeout_secs, 120);
        assert_eq!(config.segmenter.heading_pattern, DEFAULT_HEADING_PATTERN);
    }

    #[test]
    fn test_validate_rejects_zero_max_chars() {
        let mut config = AudiobookConfig::default();
        config.chunker.max_chars = 0;
        assert!(matches!(config.validate(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("audiobook.toml");

        let mut config = AudiobookConfig::default();
        config.normalizer.header_threshold = 9;
        config.save_to(&path).unwrap();

        let loaded = AudiobookConfig::load_from(&path).unwrap();
        assert_eq!(loaded.normalizer.header_threshold, 9);
        assert_eq!(loaded.normalizer.substitutions.len(), DEFAULT_SUBSTITUTIONS.len());
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = AudiobookConfig::load_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.chunker.max_chars, 4000);
    }
}
