//! Offline eSpeak NG backend.
//!
//! eSpeak renders WAV from stdin; ffmpeg encodes it to MP3.

use super::Synthesizer;
use crate::error::{PipelineError, Result};
use crate::tools;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use tokio::process::Command;

const ESPEAK_HINT: &str = "Install eSpeak NG for offline speech, or use --tts-engine gtts.";
const FFMPEG_HINT: &str = "Install FFmpeg to encode and merge audio.";

/// One row of `espeak-ng --voices`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Voice {
    language: String,
    name: String,
    /// Voice file identifier, e.g. `gmw/en-US`; unique where languages repeat.
    identifier: String,
}

pub struct EspeakSynthesizer {
    espeak: PathBuf,
    ffmpeg: PathBuf,
    rate: u32,
    voice: Option<String>,
    timeout: Duration,
}

impl EspeakSynthesizer {
    /// Locate the tools and resolve `voice` (a case-insensitive name substring).
    ///
    /// An unmatched voice falls back to eSpeak's default with a warning.
    pub async fn new(rate: u32, voice: Option<&str>, timeout: Duration) -> Result<Self> {
        let espeak = tools::locate(&["espeak-ng", "espeak"], ESPEAK_HINT)?;
        let ffmpeg = tools::locate(&["ffmpeg"], FFMPEG_HINT)?;

        let voice = match voice {
            Some(wanted) => {
                let mut command = Command::new(&espeak);
                command.arg("--voices");
                let output = tools::run(command, None, timeout)
                    .await
                    .map_err(|e| synthesis_error(e.to_string()))?;
                let voices = parse_voices(&String::from_utf8_lossy(&output.stdout));

                match find_voice(&voices, wanted) {
                    Some(found) => {
                        log::info!("Using voice {} [{}] ({})", found.name, found.language, found.identifier);
                        Some(found.identifier.clone())
                    }
                    None => {
                        log::warn!("No voice matching {:?}; using the default voice", wanted);
                        None
                    }
                }
            }
            None => None,
        };

        Ok(Self {
            espeak,
            ffmpeg,
            rate,
            voice,
            timeout,
        })
    }

    fn espeak_args(&self, wav: &std::path::Path) -> Vec<String> {
        let mut args = vec!["-s".to_string(), self.rate.to_string()];
        if let Some(voice) = &self.voice {
            args.push("-v".to_string());
            args.push(voice.clone());
        }
        args.push("-w".to_string());
        args.push(wav.to_string_lossy().into_owned());
        args.push("--stdin".to_string());
        args
    }
}

#[async_trait]
impl Synthesizer for EspeakSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let workdir = TempDir::new()?;
        let wav = workdir.path().join("speech.wav");
        let mp3 = workdir.path().join("speech.mp3");

        let mut speak = Command::new(&self.espeak);
        speak.args(self.espeak_args(&wav));
        tools::run(speak, Some(text.as_bytes().to_vec()), self.timeout)
            .await
            .map_err(|e| synthesis_error(e.to_string()))?;

        let mut encode = Command::new(&self.ffmpeg);
        encode
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(&wav)
            .args(["-codec:a", "libmp3lame", "-b:a", "128k"])
            .arg(&mp3);
        tools::run(encode, None, self.timeout)
            .await
            .map_err(|e| synthesis_error(e.to_string()))?;

        Ok(tokio::fs::read(&mp3).await?)
    }

    fn name(&self) -> &'static str {
        "espeak"
    }
}

fn synthesis_error(message: String) -> PipelineError {
    PipelineError::Synthesis {
        segment: "espeak".to_string(),
        message,
    }
}

/// Parse the table printed by `espeak-ng --voices`.
///
/// Columns: Pty, Language, Age/Gender, VoiceName, File, Other Languages.
fn parse_voices(listing: &str) -> Vec<Voice> {
    listing
        .lines()
        .skip(1)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split_whitespace().collect();
            match columns.as_slice() {
                [_, language, _, name, identifier, ..] => Some(Voice {
                    language: language.to_string(),
                    name: name.to_string(),
                    identifier: identifier.to_string(),
                }),
                _ => None,
            }
        })
        .collect()
}

fn find_voice<'a>(voices: &'a [Voice], wanted: &str) -> Option<&'a Voice> {
    let wanted = wanted.to_lowercase();
    voices
        .iter()
        .find(|voice| voice.name.to_lowercase().contains(&wanted))
}
