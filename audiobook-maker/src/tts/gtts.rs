//! Google Translate text-to-speech backend
//!
//! Sends text to the public translate_tts endpoint in pieces short enough
//! for a single request and concatenates the MP3 frames it returns.

use super::Synthesizer;
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Longest text the endpoint accepts in one request.
const MAX_REQUEST_CHARS: usize = 100;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub struct GttsSynthesizer {
    client: Client,
    language: String,
    tld: String,
    slow: bool,
}

impl GttsSynthesizer {
    pub fn new(language: &str, tld: &str, slow: bool) -> Self {
        Self {
            client: Client::new(),
            language: language.to_string(),
            tld: tld.to_string(),
            slow,
        }
    }

    fn endpoint(&self) -> String {
        format!("https://translate.google.{}/translate_tts", self.tld)
    }

    async fn request(&self, piece: &str, index: usize, total: usize) -> Result<Vec<u8>> {
        let speed = if self.slow { "0.3" } else { "1" };
        let textlen = piece.chars().count().to_string();
        let index = index.to_string();
        let total = total.to_string();

        let response = self
            .client
            .get(self.endpoint())
            .header("User-Agent", USER_AGENT)
            .header("Referer", format!("https://translate.google.{}/", self.tld))
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.language.as_str()),
                ("q", piece),
                ("ttsspeed", speed),
                ("total", total.as_str()),
                ("idx", index.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| synthesis_error(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(synthesis_error(format!(
                "HTTP {}: {}",
                status.as_u16(),
                error_text.chars().take(200).collect::<String>()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| synthesis_error(format!("Failed to read response: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl Synthesizer for GttsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let pieces = split_for_request(text, MAX_REQUEST_CHARS);
        let mut audio = Vec::new();

        for (index, piece) in pieces.iter().enumerate() {
            audio.extend(self.request(piece, index, pieces.len()).await?);
        }

        Ok(audio)
    }

    fn name(&self) -> &'static str {
        "gtts"
    }
}

fn synthesis_error(message: String) -> PipelineError {
    PipelineError::Synthesis {
        segment: "gtts".to_string(),
        message,
    }
}

/// Split text on word boundaries into pieces of at most `max_chars` characters.
///
/// Words longer than `max_chars` are cut.
fn split_for_request(text: &str, max_chars: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let chars: Vec<char> = word.chars().collect();
            pieces.extend(chars.chunks(max_chars).map(|c| c.iter().collect::<String>()));
        } else if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            pieces.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}
