//! Two-pass lexical sentiment scoring (C4).
//!
//! Grounded on `examples/original_source/ai/sentiment.py`.

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::models::Sentiment;

/// Negative tokens count double against positive ones.
const NEG_TOKEN_WEIGHT: i32 = 2;
/// A matched positive phrase (beyond its constituent tokens) adds this bonus.
const POSITIVE_PHRASE_BONUS: i32 = 2;
const MIN_TEXT_LEN: usize = 3;

/// Verbatim from `ai/sentiment.py`'s `_POSITIVE_WORDS` frozenset. Several
/// entries are multi-word and can never match the single-word tokenizer
/// below — kept anyway, matching the original's own dead weight.
static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "хорошо", "отлично", "спасибо", "благодарю", "помогли", "решили",
        "доволен", "довольна", "рад", "рада", "быстро", "удобно",
        "успешно", "замечательно", "прекрасно", "превосходно",
        "всё работает", "все работает", "заработало",
        "thank", "thanks", "thank you", "good", "great", "excellent",
        "perfect", "awesome", "helpful", "resolved", "satisfied", "happy",
        "рахмет", "жақсы", "өте жақсы",
    ])
});

/// Verbatim from `ai/sentiment.py`'s `_NEGATIVE_WORDS` frozenset (same
/// dead-weight multi-word caveat as `POSITIVE_WORDS`).
static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "плохо", "ужасно", "отвратительно", "безобразие", "возмутительно",
        "недоволен", "недовольна", "недовольны", "возмущен", "возмущена",
        "издевательство", "кошмар",
        "проблема", "не работает", "не работают", "ошибка", "сбой", "баг",
        "зависает", "не открывается", "не пускает", "не принимает",
        "не могу войти", "не могу зайти", "не удается войти", "не удаётся войти",
        "смс не приходит", "смс не приходят", "код не приходит",
        "не приходит смс", "пароль не принимает",
        "не получается", "не удаётся", "не удается",
        "не загружается", "не грузится", "сайт не открывается",
        "выкидывает", "постоянно выкидывает",
        "заблокирован", "заблокированы", "заблокировали",
        "верните", "верните деньги", "не пришло", "не поступило",
        "не зачислено", "не на моем счету", "не дошло",
        "списали", "незаконно", "незаконно списали",
        "в суд", "подам в суд", "правоохранительные органы",
        "аннулировать", "дублирующие списания",
        "мошенник", "мошенники", "обман", "обманули",
        "украли", "без моего ведома", "несанкционированный",
        "жертвой мошенников", "взломали", "взлом",
        "жалоба", "жалуюсь", "нарушение", "нарушили", "нарушаете",
        "не имеете права", "без причины", "требую",
        "afsa", "аррфр", "национальный банк", "финансовый регулятор",
        "bad", "terrible", "horrible", "fraud", "scam", "stolen",
        "error", "broken", "issue", "problem", "angry", "blocked",
        "rejected", "cannot", "unable", "hacked",
        "жаман", "нашар",
    ])
});

/// `(phrase, weight)`, scored against the full lowercased text in addition
/// to (not instead of) the token pass. Verbatim from
/// `ai/sentiment.py::_NEGATIVE_PHRASES`.
static NEGATIVE_PHRASES: Lazy<Vec<(&'static str, i32)>> = Lazy::new(|| {
    vec![
        ("не работает", 1),
        ("не работают", 1),
        ("не могу войти", 2),
        ("не могу зайти", 2),
        ("не удается войти", 2),
        ("не удаётся войти", 2),
        ("смс не приходит", 2),
        ("смс не приходят", 2),
        ("код не приходит", 2),
        ("не приходит смс", 2),
        ("пароль не принимает", 2),
        ("не получается", 1),
        ("верните деньги", 3),
        ("не пришло", 1),
        ("не поступило", 1),
        ("не зачислено", 1),
        ("не на моем счету", 2),
        ("не дошло", 1),
        ("незаконно списали", 3),
        ("в суд", 3),
        ("подам в суд", 3),
        ("без моего ведома", 3),
        ("не имеете права", 2),
        ("без причины", 2),
        ("жертвой мошенников", 3),
        ("правоохранительные органы", 3),
        ("заблокировали", 2),
        ("заблокированы", 2),
        ("это издевательство", 3),
        ("ваша компания ведет себя как мошенническая", 4),
        ("дублирующие списания", 2),
        ("аннулировать дублирующие", 2),
        ("инициирую заявление", 3),
        ("взломали", 3),
        ("взлом аккаунта", 3),
        ("не загружается", 1),
        ("не грузится", 1),
        ("сайт не открывается", 2),
        ("выкидывает из приложения", 2),
        ("постоянно выкидывает", 2),
    ]
});

/// Multi-word positive phrases, matched against the full lowercased text.
/// Verbatim from the literal tuple in `ai/sentiment.py::analyze`.
static POSITIVE_PHRASES: Lazy<Vec<&'static str>> =
    Lazy::new(|| vec!["всё работает", "все работает", "заработало", "спасибо большое"]);

/// Lexical sentiment scorer: token pass + weighted phrase pass, net score
/// decides the final bucket.
#[derive(Debug, Default, Clone, Copy)]
pub struct SentimentEngine;

impl SentimentEngine {
    pub fn new() -> Self {
        SentimentEngine
    }

    pub fn analyze(&self, text: &str) -> Sentiment {
        let trimmed = text.trim();
        if trimmed.chars().count() < MIN_TEXT_LEN {
            return Sentiment::NEU;
        }
        let lowered = trimmed.to_lowercase();

        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let pos_tokens = tokens.iter().filter(|w| POSITIVE_WORDS.contains(*w)).count() as i32;
        let neg_tokens = tokens.iter().filter(|w| NEGATIVE_WORDS.contains(*w)).count() as i32;

        let mut pos_score = pos_tokens;
        let mut neg_score = neg_tokens;

        for (phrase, weight) in NEGATIVE_PHRASES.iter() {
            if lowered.contains(phrase) {
                neg_score += weight;
            }
        }
        for phrase in POSITIVE_PHRASES.iter() {
            if lowered.contains(phrase) {
                pos_score += POSITIVE_PHRASE_BONUS;
            }
        }

        let net = pos_score - neg_score * NEG_TOKEN_WEIGHT;
        if net > 0 {
            Sentiment::POS
        } else if net < 0 {
            Sentiment::NEG
        } else {
            Sentiment::NEU
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_or_short_text_is_neutral() {
        let s = SentimentEngine::new();
        assert_eq!(s.analyze(""), Sentiment::NEU);
        assert_eq!(s.analyze("ок"), Sentiment::NEU);
    }

    #[test]
    fn clear_positive_text() {
        let s = SentimentEngine::new();
        assert_eq!(s.analyze("Спасибо большое, отлично решили вопрос"), Sentiment::POS);
    }

    #[test]
    fn clear_negative_text() {
        let s = SentimentEngine::new();
        assert_eq!(
            s.analyze("Это безобразие, мошенники обманули, верните деньги"),
            Sentiment::NEG
        );
    }

    #[test]
    fn single_negative_word_outweighs_no_positives() {
        let s = SentimentEngine::new();
        assert_eq!(s.analyze("Всё плохо"), Sentiment::NEG);
    }

    #[test]
    fn mixed_but_balanced_leans_negative_due_to_double_weight() {
        let s = SentimentEngine::new();
        // one positive token (+1), one negative token (-2) => net -1 => NEG
        assert_eq!(s.analyze("Спасибо, но плохо"), Sentiment::NEG);
    }

    #[test]
    fn fraud_phrase_scores_strongly_negative() {
        let s = SentimentEngine::new();
        // "жертвой мошенников" phrase (+3) plus "мошенники"/"украли" tokens
        assert_eq!(s.analyze("Я стал жертвой мошенников, украли деньги"), Sentiment::NEG);
    }

    #[test]
    fn legal_escalation_phrase_scores_negative() {
        let s = SentimentEngine::new();
        assert_eq!(s.analyze("Подам в суд на вашу компанию"), Sentiment::NEG);
    }
}
