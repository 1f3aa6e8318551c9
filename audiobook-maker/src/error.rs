use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Unsupported input type: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Failed to extract text from {}: {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    #[error("{tool} not found in PATH. {hint}")]
    MissingTool {
        tool: &'static str,
        hint: &'static str,
    },

    #[error("Speech synthesis failed for {segment}: {message}")]
    Synthesis { segment: String, message: String },

    #[error("Audio assembly failed for {}: {message}", output.display())]
    Assembly { output: PathBuf, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl PipelineError {
    pub fn extraction(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Extraction {
            path: path.into(),
            message: message.to_string(),
        }
    }

    pub fn assembly(output: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Assembly {
            output: output.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_message() {
        let err = PipelineError::UnsupportedFormat {
            extension: ".xyz".to_string(),
        };
        assert_eq!(err.to_string(), "Unsupported input type: .xyz");
    }

    #[test]
    fn test_missing_tool_message() {
        let err = PipelineError::MissingTool {
            tool: "tesseract",
            hint: "Install Tesseract OCR.",
        };
        assert_eq!(
            err.to_string(),
            "tesseract not found in PATH. Install Tesseract OCR."
        );
    }

    #[test]
    fn test_extraction_message_includes_path() {
        let err = PipelineError::extraction("/tmp/book.pdf", "bad xref");
        assert!(err.to_string().contains("/tmp/book.pdf"));
        assert!(err.to_string().contains("bad xref"));
    }
}
