//! Text cleaning and normalization before chapter detection.
//!
//! The passes run in a fixed order and later passes rely on earlier ones:
//! character substitution, page-number removal, header/footer removal,
//! de-hyphenation, footnote-marker removal and whitespace collapsing.

use crate::config::NormalizerConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// A bare number, possibly still carrying footnote markers ("42 [1]", "7^2").
static PAGE_NUMBER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t\r]*\d+(?:[ \t]*\[(?:\d{1,3}|[a-z]{1,3})\]|\^\d{1,3})*[ \t\r]*$").unwrap()
});

static WRAPPED_HYPHEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)-[ \t]*\r?\n[ \t]*(\w)").unwrap());

static BRACKET_FOOTNOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]*\[(?:\d{1,3}|[a-z]{1,3})\]").unwrap());

static CARET_FOOTNOTE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\^\d{1,3}").unwrap());

static HORIZONTAL_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\S\n]+").unwrap());

static SPACE_AROUND_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r" ?\n ?").unwrap());

static BLANK_LINE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Deterministic raw-text cleaner built from a [`NormalizerConfig`].
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    substitutions: Vec<(String, String)>,
    header_threshold: usize,
    header_min_len: usize,
    header_max_len: usize,
}

impl TextNormalizer {
    pub fn new(config: &NormalizerConfig) -> Self {
        let substitutions = config
            .substitutions
            .iter()
            .filter(|(from, _)| !from.is_empty())
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect();

        Self {
            substitutions,
            header_threshold: config.header_threshold,
            header_min_len: config.header_min_len,
            header_max_len: config.header_max_len,
        }
    }

    /// Run every cleaning pass over the raw extracted text.
    pub fn normalize(&self, raw: &str) -> String {
        let text = self.substitute_characters(raw);
        let text = remove_page_numbers(&text);
        let text = self.strip_repeating_lines(&text);
        let text = dehyphenate(&text);
        let text = remove_footnote_markers(&text);
        collapse_whitespace(&text)
    }

    /// Replace ligatures and typographic punctuation with plain equivalents.
    pub fn substitute_characters(&self, text: &str) -> String {
        let mut result = text.to_string();
        for (from, to) in &self.substitutions {
            if result.contains(from.as_str()) {
                result = result.replace(from.as_str(), to);
            }
        }
        result
    }

    /// Remove lines that repeat often enough to be running headers or footers.
    ///
    /// Only lines of `header_min_len..=header_max_len` characters (after
    /// trimming) are candidates. Text without any such line is returned as is.
    pub fn strip_repeating_lines(&self, text: &str) -> String {
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for line in text.lines() {
            let trimmed = line.trim();
            let len = trimmed.chars().count();
            if len >= self.header_min_len && len <= self.header_max_len {
                *freq.entry(trimmed).or_insert(0) += 1;
            }
        }

        let repeated: HashSet<&str> = freq
            .into_iter()
            .filter(|(_, count)| *count >= self.header_threshold)
            .map(|(line, _)| line)
            .collect();

        if repeated.is_empty() {
            return text.to_string();
        }

        text.lines()
            .filter(|line| !repeated.contains(line.trim()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(&NormalizerConfig::default())
    }
}

/// Blank out lines that contain nothing but a page number.
pub fn remove_page_numbers(text: &str) -> String {
    PAGE_NUMBER_LINE.replace_all(text, "").into_owned()
}

/// Join words split across a line wrap: "trans-\nformation" -> "transformation".
pub fn dehyphenate(text: &str) -> String {
    let mut result = text.to_string();
    // Each pass consumes the first letter of the continuation, so chained
    // wraps ("a-\nb-\nc") need another pass.
    while WRAPPED_HYPHEN.is_match(&result) {
        result = WRAPPED_HYPHEN.replace_all(&result, "$1$2").into_owned();
    }
    result
}

/// Drop inline reference markers such as `[12]`, `[a]` and `^3`.
pub fn remove_footnote_markers(text: &str) -> String {
    let text = BRACKET_FOOTNOTE.replace_all(text, "");
    CARET_FOOTNOTE.replace_all(&text, "").into_owned()
}

/// Normalize line endings, squeeze spaces and cap blank lines at one.
pub fn collapse_whitespace(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = SPACE_AROUND_NEWLINE.replace_all(&text, "\n");
    let text = BLANK_LINE_RUN.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn normalizer() -> TextNormalizer {
        TextNormalizer::default()
    }

    #[test]
    fn test_substitute_ligatures_and_punctuation() {
        let text = "\u{fb01}ne \u{fb02}ow\u{2014}e\u{fb03}cient\u{2026}\u{00a0}done";
        assert_eq!(
            normalizer().substitute_characters(text),
            "fine flow-efficient... done"
        );
    }

    #[test]
    fn test_substitute_smart_quotes() {
        let text = "\u{201c}Hello,\u{201d} said John. \u{2018}It\u{2019}s nice.\u{2019}";
        assert_eq!(
            normalizer().substitute_characters(text),
            "\"Hello,\" said John. 'It's nice.'"
        );
    }

    #[test]
    fn test_custom_substitution_table() {
        let mut config = NormalizerConfig::default();
        config.substitutions.clear();
        config.substitutions.insert("&".to_string(), " and ".to_string());
        let normalizer = TextNormalizer::new(&config);
        assert_eq!(normalizer.substitute_characters("salt & pepper"), "salt  and  pepper");
        assert_eq!(normalizer.substitute_characters("\u{fb01}"), "\u{fb01}");
    }

    #[test]
    fn test_remove_page_numbers() {
        let text = "End of page.\n  42  \nStart of next.\n7\nLine 7 stays";
        assert_eq!(
            remove_page_numbers(text),
            "End of page.\n\nStart of next.\n\nLine 7 stays"
        );
    }

    #[test]
    fn test_remove_page_numbers_with_footnote_markers() {
        assert_eq!(remove_page_numbers("Top\n42 [1]\n7^2\n12 [a][b]\nBottom"), "Top\n\n\n\nBottom");
        assert_eq!(remove_page_numbers("42 [note]"), "42 [note]");
    }

    #[test]
    fn test_normalize_marked_page_number_is_idempotent() {
        let normalizer = normalizer();
        let once = normalizer.normalize("End of the page.\n42 [1]\nNext page starts.");
        assert_eq!(once, "End of the page.\n\nNext page starts.");
        assert!(once.lines().all(|line| line.is_empty() || !line.chars().all(|c| c.is_ascii_digit())));
        assert_eq!(normalizer.normalize(&once), once);
    }

    #[test]
    fn test_remove_page_numbers_crlf() {
        let text = "One\r\n12\r\nTwo";
        assert_eq!(remove_page_numbers(text), "One\r\n\nTwo");
    }

    #[test]
    fn test_strip_repeating_lines_removes_header() {
        let mut lines = Vec::new();
        for i in 0..20 {
            lines.push("THE RUNNING HEADER".to_string());
            lines.push(format!("Unique body line number {}.", i));
        }
        let text = lines.join("\n");
        let cleaned = normalizer().strip_repeating_lines(&text);

        assert!(!cleaned.contains("THE RUNNING HEADER"));
        for i in 0..20 {
            assert!(cleaned.contains(&format!("Unique body line number {}.", i)));
        }
    }

    #[test]
    fn test_strip_repeating_lines_below_threshold() {
        let text = vec!["Repeated line"; 14].join("\n");
        assert_eq!(normalizer().strip_repeating_lines(&text), text);
    }

    #[test]
    fn test_strip_repeating_lines_ignores_short_and_long() {
        let short = vec!["abc"; 30].join("\n");
        assert_eq!(normalizer().strip_repeating_lines(&short), short);

        let long_line = "x".repeat(81);
        let long = vec![long_line.as_str(); 30].join("\n");
        assert_eq!(normalizer().strip_repeating_lines(&long), long);
    }

    #[test]
    fn test_strip_repeating_lines_matches_trimmed() {
        let mut text = String::new();
        for i in 0..15 {
            let pad = " ".repeat(i % 3);
            text.push_str(&format!("{}Page Footer{}\nbody {}\n", pad, pad, i));
        }
        let cleaned = normalizer().strip_repeating_lines(&text);
        assert!(!cleaned.contains("Page Footer"));
        assert!(cleaned.contains("body 14"));
    }

    #[test]
    fn test_dehyphenate() {
        assert_eq!(dehyphenate("trans-\nformation"), "transformation");
        assert_eq!(dehyphenate("long-\r\nstanding"), "longstanding");
        assert_eq!(dehyphenate("well- \n  known"), "wellknown");
    }

    #[test]
    fn test_dehyphenate_chained() {
        assert_eq!(dehyphenate("a-\nb-\nc"), "abc");
    }

    #[test]
    fn test_dehyphenate_keeps_inline_hyphens() {
        assert_eq!(dehyphenate("a well-known fact\n- a list item"), "a well-known fact\n- a list item");
    }

    #[test]
    fn test_remove_footnote_markers() {
        assert_eq!(
            remove_footnote_markers("As shown [12], and noted [a]. Also^3 here."),
            "As shown, and noted. Also here."
        );
    }

    #[test]
    fn test_remove_footnote_markers_keeps_long_brackets() {
        assert_eq!(
            remove_footnote_markers("See [1234] and [note]."),
            "See [1234] and [note]."
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        let text = "  Hello   world\t\tagain \r\n\r\n\r\n\r\nNew  paragraph  \n";
        assert_eq!(
            collapse_whitespace(text),
            "Hello world again\n\nNew paragraph"
        );
    }

    #[test]
    fn test_collapse_whitespace_blank_lines_with_spaces() {
        assert_eq!(collapse_whitespace("a\n \n \n \nb"), "a\n\nb");
    }

    #[test]
    fn test_normalize_dehyphenation_scenario() {
        let cleaned = normalizer().normalize("The trans-\nformation was complete.");
        assert!(cleaned.contains("transformation"));
        assert!(!cleaned.contains("trans-"));
        assert!(!cleaned.contains("trans\n"));
    }

    #[test]
    fn test_normalize_full_document() {
        let mut raw = String::new();
        for page in 1..=16 {
            raw.push_str("A Study of Things\n");
            raw.push_str(&format!("Content of page {} with a hyphen-\nated word[{}].\n", page, page));
            raw.push_str(&format!("{}\n\n\n\n", page));
        }
        let cleaned = normalizer().normalize(&raw);

        assert!(!cleaned.contains("A Study of Things"));
        assert!(cleaned.contains("Content of page 3 with a hyphenated word."));
        assert!(!cleaned.contains("\n\n\n"));
        assert!(cleaned.lines().all(|l| !l.trim().chars().all(|c| c.is_ascii_digit()) || l.is_empty()));
        assert_eq!(cleaned, cleaned.trim());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = "CHAPTER ONE\n\n  It was a \u{fb01}ne day\u{2014}or so they said[1].\n\n\n12\n\
                   The com-\nmittee met at 9.\r\nMr. Smith  arrived^2 late\u{2026}\n";
        let once = normalizer().normalize(raw);
        let twice = normalizer().normalize(&once);
        assert_eq!(once, twice);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(
            lines in proptest::collection::vec("[A-Za-z]{1,8}( [A-Za-z]{1,8}){0,6}[.!?]?|[0-9]{1,3}|", 0..40)
        ) {
            let raw = lines.join("\n");
            let once = normalizer().normalize(&raw);
            let twice = normalizer().normalize(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_normalized_text_invariants(raw in "[a-zA-Z0-9 \t\r\n.\\-\\[\\]^]{0,300}") {
            let cleaned = normalizer().normalize(&raw);
            prop_assert_eq!(cleaned.trim(), cleaned.as_str());
            prop_assert!(!cleaned.contains("\n\n\n"));
            prop_assert!(!cleaned.contains('\r'));
        }
    }
}
