//! Language detection and naming helpers.

use std::sync::LazyLock;

use regex::Regex;
use whatlang::Lang;

static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").unwrap());

/// Detect the language of `text` as an ISO 639-1 code.
///
/// Undetectable or unmapped text comes back as "en".
pub fn detect(text: &str) -> &'static str {
    match whatlang::detect_lang(text) {
        Some(lang) => iso_639_1(lang),
        None => "en",
    }
}

/// Number of word-character runs in `text`.
pub fn count_words(text: &str) -> usize {
    WORD_PATTERN.find_iter(text).count()
}

/// Full English name for an ISO 639-1 code, used when expanding the
/// language placeholder in assistant prompts. Unknown codes pass through.
pub fn full_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "zh" => "Chinese",
        "ja" => "Japanese",
        "ko" => "Korean",
        "ar" => "Arabic",
        "de" => "German",
        "fr" => "French",
        "es" => "Spanish",
        "pt" => "Portuguese",
        "it" => "Italian",
        "nl" => "Dutch",
        "ru" => "Russian",
        "uk" => "Ukrainian",
        "pl" => "Polish",
        "sv" => "Swedish",
        "da" => "Danish",
        "fi" => "Finnish",
        "tr" => "Turkish",
        "el" => "Greek",
        "he" => "Hebrew",
        "hi" => "Hindi",
        "th" => "Thai",
        "vi" => "Vietnamese",
        "id" => "Indonesian",
        _ => code,
    }
}

fn iso_639_1(lang: Lang) -> &'static str {
    match lang {
        Lang::Eng => "en",
        Lang::Cmn => "zh",
        Lang::Jpn => "ja",
        Lang::Kor => "ko",
        Lang::Ara => "ar",
        Lang::Deu => "de",
        Lang::Fra => "fr",
        Lang::Spa => "es",
        Lang::Por => "pt",
        Lang::Ita => "it",
        Lang::Nld => "nl",
        Lang::Rus => "ru",
        Lang::Ukr => "uk",
        Lang::Pol => "pl",
        Lang::Swe => "sv",
        Lang::Dan => "da",
        Lang::Fin => "fi",
        Lang::Tur => "tr",
        Lang::Ell => "el",
        Lang::Heb => "he",
        Lang::Hin => "hi",
        Lang::Tha => "th",
        Lang::Vie => "vi",
        Lang::Ind => "id",
        _ => "en",
    }
}
