//! Rule-based sentence splitting with an abbreviation list.

use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;

/// Terminal punctuation followed by whitespace: a candidate boundary.
static CANDIDATE_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Splits text on `.`, `!` and `?` when the next sentence visibly starts.
#[derive(Debug, Clone)]
pub struct SentenceSplitter {
    abbreviations: Vec<String>,
}

impl SentenceSplitter {
    pub fn new(abbreviations: &[String]) -> Self {
        Self {
            abbreviations: abbreviations
                .iter()
                .map(|a| a.trim_end_matches('.').to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        }
    }

    /// Byte ranges of the trimmed, non-empty sentences of `text`.
    ///
    /// Punctuation stays with its sentence; the whitespace between
    /// sentences belongs to neither.
    pub fn spans(&self, text: &str) -> Vec<Range<usize>> {
        let mut spans = Vec::new();
        let mut start = 0;

        for m in CANDIDATE_BOUNDARY.find_iter(text) {
            if !starts_sentence(&text[m.end()..]) || self.ends_with_abbreviation(&text[..m.start()]) {
                continue;
            }
            // Punctuation is a single ASCII byte.
            push_span(&mut spans, text, start..m.start() + 1);
            start = m.end();
        }
        push_span(&mut spans, text, start..text.len());

        spans
    }

    fn ends_with_abbreviation(&self, before: &str) -> bool {
        self.abbreviations.iter().any(|abbrev| {
            before.strip_suffix(abbrev.as_str()).is_some_and(|rest| {
                rest.chars()
                    .next_back()
                    .is_none_or(|c| !c.is_alphanumeric())
            })
        })
    }
}

fn push_span(spans: &mut Vec<Range<usize>>, text: &str, span: Range<usize>) {
    let segment = &text[span.clone()];
    let trimmed = segment.trim();
    if !trimmed.is_empty() {
        let start = span.start + (segment.len() - segment.trim_start().len());
        spans.push(start..start + trimmed.len());
    }
}

/// Uppercase letter, digit, or an opening quote/bracket.
fn starts_sentence(rest: &str) -> bool {
    rest.chars().next().is_some_and(|c| {
        c.is_uppercase() || c.is_ascii_digit() || matches!(c, '"' | '\'' | '(' | '[' | '\u{201c}' | '\u{2018}')
    })
}
