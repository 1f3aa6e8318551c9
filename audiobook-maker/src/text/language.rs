//! Language detection over cleaned text.

/// Language reported when detection has nothing to go on.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Characters sampled from the start of the text.
const SAMPLE_CHARS: usize = 10_000;

/// Detect the dominant language of `text` as an ISO 639-1 code.
///
/// Falls back to [`DEFAULT_LANGUAGE`] for empty text, failed detection, or
/// languages without a two-letter code.
pub fn detect_language(text: &str) -> String {
    let sample: String = text.chars().take(SAMPLE_CHARS).collect();

    let code = whatlang::detect(&sample)
        .and_then(|info| iso639_1(info.lang().code()))
        .unwrap_or(DEFAULT_LANGUAGE);

    log::debug!("detected language {} from {} chars", code, sample.chars().count());
    code.to_string()
}

/// Map a three-letter ISO 639-3 code to its two-letter ISO 639-1 form.
fn iso639_1(code: &str) -> Option<&'static str> {
    let two = match code {
        "afr" => "af",
        "aka" => "ak",
        "amh" => "am",
        "ara" => "ar",
        "aze" => "az",
        "bel" => "be",
        "ben" => "bn",
        "bul" => "bg",
        "cat" => "ca",
        "ces" => "cs",
        "cmn" => "zh",
        "dan" => "da",
        "deu" => "de",
        "ell" => "el",
        "eng" => "en",
        "epo" => "eo",
        "est" => "et",
        "fin" => "fi",
        "fra" => "fr",
        "guj" => "gu",
        "heb" => "he",
        "hin" => "hi",
        "hrv" => "hr",
        "hun" => "hu",
        "hye" => "hy",
        "ind" => "id",
        "ita" => "it",
        "jav" => "jv",
        "jpn" => "ja",
        "kan" => "kn",
        "kat" => "ka",
        "khm" => "km",
        "kor" => "ko",
        "lat" => "la",
        "lav" => "lv",
        "lit" => "lt",
        "mal" => "ml",
        "mar" => "mr",
        "mkd" => "mk",
        "mya" => "my",
        "nep" => "ne",
        "nld" => "nl",
        "nob" => "no",
        "ori" => "or",
        "pan" => "pa",
        "pes" => "fa",
        "pol" => "pl",
        "por" => "pt",
        "ron" => "ro",
        "rus" => "ru",
        "sin" => "si",
        "slk" => "sk",
        "slv" => "sl",
        "sna" => "sn",
        "spa" => "es",
        "srp" => "sr",
        "swe" => "sv",
        "tam" => "ta",
        "tel" => "te",
        "tgl" => "tl",
        "tha" => "th",
        "tuk" => "tk",
        "tur" => "tr",
        "ukr" => "uk",
        "urd" => "ur",
        "uzb" => "uz",
        "vie" => "vi",
        "yid" => "yi",
        "zul" => "zu",
        _ => return None,
    };
    Some(two)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_english() {
        let text = "It was the best of times, it was the worst of times, it was the age of \
                    wisdom, it was the age of foolishness, it was the epoch of belief.";
        assert_eq!(detect_language(text), "en");
    }

    #[test]
    fn test_detects_french() {
        let text = "Longtemps, je me suis couché de bonne heure. Parfois, à peine ma bougie \
                    éteinte, mes yeux se fermaient si vite que je n'avais pas le temps de me dire.";
        assert_eq!(detect_language(text), "fr");
    }

    #[test]
    fn test_detects_russian() {
        let text = "Все счастливые семьи похожи друг на друга, каждая несчастливая семья \
                    несчастлива по-своему. Всё смешалось в доме Облонских.";
        assert_eq!(detect_language(text), "ru");
    }

    #[test]
    fn test_empty_text_defaults() {
        assert_eq!(detect_language(""), DEFAULT_LANGUAGE);
    }

    #[test]
    fn test_iso639_mapping() {
        assert_eq!(iso639_1("eng"), Some("en"));
        assert_eq!(iso639_1("cmn"), Some("zh"));
        assert_eq!(iso639_1("xyz"), None);
    }
}
