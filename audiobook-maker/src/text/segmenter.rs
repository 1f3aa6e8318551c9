//! Heuristic chapter detection over cleaned text.

use crate::config::SegmenterConfig;
use crate::error::{PipelineError, Result};
use regex::Regex;

/// Title given to text that precedes any heading, and to the fallback chapter.
pub const FIRST_CHAPTER_TITLE: &str = "Chapter 1";

/// A titled slice of the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub title: String,
    pub body: String,
}

impl Chapter {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Body length in characters.
    pub fn char_len(&self) -> usize {
        self.body.chars().count()
    }
}

/// Outcome of chapter detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segmentation {
    /// Heading-like lines split the text into these chapters.
    Detected(Vec<Chapter>),
    /// No usable heading was found; the whole text is one chapter.
    Fallback(Chapter),
}

impl Segmentation {
    pub fn chapters(&self) -> &[Chapter] {
        match self {
            Segmentation::Detected(chapters) => chapters,
            Segmentation::Fallback(chapter) => std::slice::from_ref(chapter),
        }
    }

    pub fn into_chapters(self) -> Vec<Chapter> {
        match self {
            Segmentation::Detected(chapters) => chapters,
            Segmentation::Fallback(chapter) => vec![chapter],
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Segmentation::Fallback(_))
    }
}

/// Splits cleaned text on heading-like lines.
#[derive(Debug, Clone)]
pub struct ChapterSegmenter {
    heading: Regex,
    caps_min_len: usize,
    caps_max_len: usize,
}

impl ChapterSegmenter {
    pub fn new(config: &SegmenterConfig) -> Result<Self> {
        let heading = Regex::new(&config.heading_pattern).map_err(|e| {
            PipelineError::Config(format!(
                "invalid segmenter.heading_pattern {:?}: {}",
                config.heading_pattern, e
            ))
        })?;

        Ok(Self {
            heading,
            caps_min_len: config.caps_min_len,
            caps_max_len: config.caps_max_len,
        })
    }

    /// Partition `text` into chapters.
    pub fn segment(&self, text: &str) -> Segmentation {
        let mut chapters = Vec::new();
        let mut title = FIRST_CHAPTER_TITLE.to_string();
        let mut body: Vec<&str> = Vec::new();
        let mut found_heading = false;

        for line in text.lines() {
            let trimmed = line.trim();
            if self.is_heading(trimmed) {
                found_heading = true;
                push_chapter(&mut chapters, &title, &body);
                body.clear();
                title = self.heading_title(trimmed);
            } else {
                body.push(line);
            }
        }
        push_chapter(&mut chapters, &title, &body);

        if !found_heading || chapters.is_empty() {
            Segmentation::Fallback(Chapter::new(FIRST_CHAPTER_TITLE, text))
        } else {
            Segmentation::Detected(chapters)
        }
    }

    /// Whether a trimmed line looks like a chapter heading.
    pub fn is_heading(&self, line: &str) -> bool {
        if line.is_empty() {
            return false;
        }
        if self.heading.is_match(line) {
            return true;
        }
        let len = line.chars().count();
        len >= self.caps_min_len && len <= self.caps_max_len && is_all_caps(line)
    }

    fn heading_title(&self, line: &str) -> String {
        let title = title_case(line);
        if !self.heading.is_match(line) {
            return title;
        }

        // "PART IV" reads better than "Part Iv"
        let mut words = title.splitn(2, ' ');
        match (words.next(), words.next()) {
            (Some(keyword), Some(rest)) if is_roman_numeral(rest.trim_end_matches('.')) => {
                format!("{} {}", keyword, rest.to_uppercase())
            }
            _ => title,
        }
    }
}

fn push_chapter(chapters: &mut Vec<Chapter>, title: &str, body: &[&str]) {
    let text = body.join("\n");
    let text = text.trim();
    if !text.is_empty() {
        chapters.push(Chapter::new(title, text));
    }
}

/// At least one cased letter and no lowercase letters.
fn is_all_caps(line: &str) -> bool {
    let mut has_upper = false;
    for c in line.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_upper = true;
        }
    }
    has_upper
}

fn is_roman_numeral(word: &str) -> bool {
    !word.is_empty()
        && word
            .chars()
            .all(|c| matches!(c.to_ascii_uppercase(), 'I' | 'V' | 'X' | 'L' | 'C' | 'D' | 'M'))
}

/// Capitalize the first letter of every run of letters, lowercase the rest.
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_is_letter = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            result.push(c);
            prev_is_letter = false;
        }
    }

    result
}
