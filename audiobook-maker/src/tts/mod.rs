//! Speech synthesizer trait and backend selection.

pub mod espeak;
pub mod gtts;
#[cfg(test)]
pub mod mock;

use crate::config::SynthesisConfig;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Available speech backends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TtsEngine {
    /// Google Translate speech (network)
    #[default]
    Gtts,
    /// eSpeak NG (offline)
    #[serde(alias = "pyttsx3")]
    #[value(alias = "pyttsx3")]
    Espeak,
}

impl fmt::Display for TtsEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TtsEngine::Gtts => write!(f, "gtts"),
            TtsEngine::Espeak => write!(f, "espeak"),
        }
    }
}

/// Speech synthesizer trait - all TTS backends implement this.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Render `text` as MP3 audio.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Backend name for logs and errors.
    fn name(&self) -> &'static str;

    /// Synthesize with a per-attempt timeout and up to `max_retries` retries.
    ///
    /// `segment` labels the final error.
    async fn synthesize_with_retry(
        &self,
        segment: &str,
        text: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Vec<u8>> {
        let attempts = max_retries + 1;
        let mut last_error = None;

        for attempt in 1..=attempts {
            let result = match tokio::time::timeout(timeout, self.synthesize(text)).await {
                Ok(result) => result,
                Err(_) => Err(PipelineError::Synthesis {
                    segment: segment.to_string(),
                    message: format!("timed out after {}s", timeout.as_secs()),
                }),
            };

            match result {
                Ok(audio) => return Ok(audio),
                Err(e) => {
                    log::warn!(
                        "{} failed for {} (attempt {}/{}): {}",
                        self.name(),
                        segment,
                        attempt,
                        attempts,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        let message = match last_error {
            Some(PipelineError::Synthesis { message, .. }) => message,
            Some(other) => other.to_string(),
            None => "no attempts made".to_string(),
        };
        Err(PipelineError::Synthesis {
            segment: segment.to_string(),
            message,
        })
    }
}

/// Create the synthesizer selected by `config`.
///
/// `language` is the ISO 639-1 code of the book text.
pub async fn create_synthesizer(
    config: &SynthesisConfig,
    language: &str,
) -> Result<Box<dyn Synthesizer>> {
    match config.engine {
        TtsEngine::Gtts => Ok(Box::new(gtts::GttsSynthesizer::new(
            language,
            &config.gtts_tld,
            config.gtts_slow,
        ))),
        TtsEngine::Espeak => {
            let synthesizer = espeak::EspeakSynthesizer::new(
                config.speech_rate,
                config.voice.as_deref(),
                Duration::from_secs(config.timeout_secs),
            )
            .await?;
            Ok(Box::new(synthesizer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockSynthesizer;
    use super::*;

    #[test]
    fn test_engine_display() {
        assert_eq!(TtsEngine::Gtts.to_string(), "gtts");
        assert_eq!(TtsEngine::Espeak.to_string(), "espeak");
        assert_eq!(TtsEngine::default(), TtsEngine::Gtts);
    }

    #[test]
    fn test_engine_cli_alias() {
        use clap::ValueEnum;
        assert_eq!(TtsEngine::from_str("pyttsx3", true).unwrap(), TtsEngine::Espeak);
        assert_eq!(TtsEngine::from_str("gtts", true).unwrap(), TtsEngine::Gtts);
    }

    #[tokio::test]
    async fn test_retry_recovers() {
        let synth = MockSynthesizer::fails_then_succeeds(2);
        let audio = synth
            .synthesize_with_retry("chapter 1 part 1", "Hello.", Duration::from_secs(5), 2)
            .await
            .unwrap();
        assert_eq!(audio, b"Hello.");
        assert_eq!(synth.call_count(), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up() {
        let synth = MockSynthesizer::always_fails();
        let err = synth
            .synthesize_with_retry("chapter 2 part 7", "Hello.", Duration::from_secs(5), 2)
            .await
            .unwrap_err();
        assert_eq!(synth.call_count(), 3);
        assert_eq!(
            err.to_string(),
            "Speech synthesis failed for chapter 2 part 7: mock failure"
        );
    }

    #[tokio::test]
    async fn test_no_retries_means_one_attempt() {
        let synth = MockSynthesizer::always_fails();
        assert!(
            synth
                .synthesize_with_retry("x", "Hello.", Duration::from_secs(5), 0)
                .await
                .is_err()
        );
        assert_eq!(synth.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let synth = MockSynthesizer::always_succeeds().with_delay(Duration::from_millis(200));
        let err = synth
            .synthesize_with_retry("slow part", "Hello.", Duration::from_millis(20), 1)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert_eq!(synth.call_count(), 2);
    }
}
