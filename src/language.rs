//! Character-class and dictionary based language detection (C3).
//!
//! Grounded on `examples/original_source/ai/nlp.py` (`LanguageDetector`).

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::models::Language;

const KAZAKH_SPECIFIC_CHARS: &str = "әіңғүұқөһ";

/// Common Kazakh words that don't use special chars but are clearly Kazakh.
/// Verbatim from `ai/nlp.py`'s `_KAZAKH_WORDS` frozenset.
static KAZAKH_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "сәлеметсіз", "сәлем", "рахмет", "өтінем", "беруңіз", "сұраймын",
        "жүйесінде", "болды", "жатыр", "керек", "мүмкін", "ашылмай",
        "ауыстырып", "нөмір", "жаңа", "алмадым", "бар", "ашуға",
        "нөмірімді", "деректерді", "жібересіздер", "ма", "бе",
        "сізге", "маған", "бізге", "оларға", "сіздің", "менің",
        "тіркелу", "верификациядан", "өткен", "өтем",
        "оттим", "жатырмын", "жатырмыз",
        "куалигим", "жеке", "куаліг", "мекенжай",
    ])
});

/// Detects the language of free text among RU/KZ/ENG using a cheap
/// character-class and small-dictionary heuristic — no ML model, no
/// external service.
#[derive(Debug, Default, Clone, Copy)]
pub struct LanguageDetector;

impl LanguageDetector {
    pub fn new() -> Self {
        LanguageDetector
    }

    /// Detection order (spec §4.3): Kazakh-specific characters first, then
    /// a small Kazakh word dictionary, then a Latin-vs-Cyrillic character
    /// ratio (Latin majority ⇒ ENG), defaulting to RU.
    pub fn detect(&self, text: &str) -> Language {
        if text.trim().is_empty() {
            return Language::RU;
        }
        let lowered = text.to_lowercase();

        if lowered.chars().any(|c| KAZAKH_SPECIFIC_CHARS.contains(c)) {
            return Language::KZ;
        }

        let word_hit = lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| KAZAKH_WORDS.contains(word));
        if word_hit {
            return Language::KZ;
        }

        let mut latin = 0usize;
        let mut cyrillic = 0usize;
        for c in lowered.chars() {
            if c.is_ascii_alphabetic() {
                latin += 1;
            } else if ('а'..='я').contains(&c) || c == 'ё' {
                cyrillic += 1;
            }
        }
        if latin > 0 && latin > cyrillic {
            return Language::ENG;
        }

        Language::RU
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_defaults_to_russian() {
        let d = LanguageDetector::new();
        assert_eq!(d.detect(""), Language::RU);
    }

    #[test]
    fn kazakh_specific_character_wins() {
        let d = LanguageDetector::new();
        assert_eq!(d.detect("Қайырлы күн, көмек керек"), Language::KZ);
    }

    #[test]
    fn kazakh_word_without_specific_chars() {
        let d = LanguageDetector::new();
        assert_eq!(d.detect("рахмет сизге"), Language::KZ);
    }

    #[test]
    fn latin_majority_is_english() {
        let d = LanguageDetector::new();
        assert_eq!(
            d.detect("Hello, my application is not working properly"),
            Language::ENG
        );
    }

    #[test]
    fn cyrillic_without_kazakh_markers_is_russian() {
        let d = LanguageDetector::new();
        assert_eq!(
            d.detect("Добрый день, у меня не работает приложение"),
            Language::RU
        );
    }

    #[test]
    fn mixed_text_with_cyrillic_majority_is_russian() {
        let d = LanguageDetector::new();
        assert_eq!(d.detect("Здравствуйте, ok спасибо большое"), Language::RU);
    }
}
