//! Packing sentences into synthesis-sized chunks.

use super::sentences::SentenceSplitter;
use crate::config::ChunkerConfig;
use crate::error::{PipelineError, Result};
use std::ops::Range;

/// A piece of chapter text small enough for one synthesis request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Set on the second and later slices of a hard-split sentence.
    /// Such slices continue the previous chunk with no separator.
    pub continuation: bool,
}

impl Chunk {
    fn whole(text: String) -> Self {
        Self {
            text,
            continuation: false,
        }
    }

    /// Whether the chunk has anything to speak.
    pub fn is_speakable(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Splits chapter bodies into chunks of at most `max_chars` characters.
#[derive(Debug, Clone)]
pub struct Chunker {
    max_chars: usize,
    splitter: SentenceSplitter,
}

impl Chunker {
    pub fn new(config: &ChunkerConfig) -> Result<Self> {
        if config.max_chars == 0 {
            return Err(PipelineError::Config(
                "chunker.max_chars must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            max_chars: config.max_chars,
            splitter: SentenceSplitter::new(&config.abbreviations),
        })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Greedily pack the sentences of `body` into chunks.
    ///
    /// A packed chunk is a contiguous slice of `body`, so the whitespace
    /// between its sentences is kept as written.
    pub fn split(&self, body: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut pending: Option<Pending> = None;

        for span in self.splitter.spans(body) {
            let sentence = &body[span.clone()];
            let sentence_len = sentence.chars().count();

            if sentence_len > self.max_chars {
                flush(&mut chunks, body, pending.take());
                chunks.extend(
                    hard_split(sentence, self.max_chars)
                        .into_iter()
                        .enumerate()
                        .map(|(i, text)| Chunk {
                            text,
                            continuation: i > 0,
                        }),
                );
                continue;
            }

            pending = match pending {
                Some(open) => {
                    let joined = open.chars + body[open.end..span.start].chars().count() + sentence_len;
                    if joined <= self.max_chars {
                        Some(Pending {
                            end: span.end,
                            chars: joined,
                            ..open
                        })
                    } else {
                        flush(&mut chunks, body, Some(open));
                        Some(Pending::new(span, sentence_len))
                    }
                }
                None => Some(Pending::new(span, sentence_len)),
            };
        }
        flush(&mut chunks, body, pending);

        chunks
    }
}

/// The chunk being packed: a byte range of the body and its length in characters.
#[derive(Debug, Clone, Copy)]
struct Pending {
    start: usize,
    end: usize,
    chars: usize,
}

impl Pending {
    fn new(span: Range<usize>, chars: usize) -> Self {
        Self {
            start: span.start,
            end: span.end,
            chars,
        }
    }
}

fn flush(chunks: &mut Vec<Chunk>, body: &str, pending: Option<Pending>) {
    if let Some(open) = pending {
        chunks.push(Chunk::whole(body[open.start..open.end].to_string()));
    }
}

/// Cut text into consecutive slices of `max_length` characters.
fn hard_split(text: &str, max_length: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_length)
        .map(|slice| slice.iter().collect())
        .collect()
}

/// Rebuild the text a list of chunks was cut from.
#[cfg(test)]
pub fn reassemble(chunks: &[Chunk]) -> String {
    let mut text = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 && !chunk.continuation {
            text.push(' ');
        }
        text.push_str(&chunk.text);
    }
    text
}
