//! Extractive fallback summarizer and rule-based recommendation engine (C5).
//!
//! Used whenever [`crate::llm::LLMAdapter`] is disabled or a call fails.
//! Grounded on `examples/original_source/ai/summarizer.py`
//! (`SimpleSummarizer`, `RecommendationEngine`).

use crate::models::{Category, Sentiment};

const MAX_SUMMARY_LEN: usize = 300;
const MIN_SENTENCE_LEN: usize = 10;

/// Extractive summarizer: picks the first one or two sentences long enough
/// to be informative, truncated to a hard length cap.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryFallback;

impl SummaryFallback {
    pub fn new() -> Self {
        SummaryFallback
    }

    pub fn summarize(&self, text: &str) -> String {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let sentences: Vec<&str> = trimmed
            .split(|c| c == '.' || c == '!' || c == '?' || c == '\n')
            .map(|s| s.trim())
            .filter(|s| s.chars().count() >= MIN_SENTENCE_LEN)
            .collect();

        let picked = if sentences.is_empty() {
            trimmed.to_string()
        } else {
            sentences
                .iter()
                .take(2)
                .cloned()
                .collect::<Vec<_>>()
                .join(". ")
        };

        truncate_chars(&picked, MAX_SUMMARY_LEN)
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// `(category-substring, priority-threshold, sentiment-constraint, text)`,
/// evaluated top-to-bottom — the first rule whose category substring matches
/// `category.as_str()`, whose threshold is met (`priority >= threshold`),
/// and whose sentiment constraint is satisfied (`None` = any) wins.
/// Verbatim from `ai/summarizer.py::_RECOMMENDATION_RULES`.
type Rule = (&'static str, u8, Option<Sentiment>, &'static str);

static RULES: &[Rule] = &[
    (
        "Мошеннические",
        1,
        None,
        "Немедленно заблокируйте счёт клиента и передайте заявку в службу безопасности.",
    ),
    (
        "Претензия",
        7,
        Some(Sentiment::NEG),
        "Приоритетная претензия: свяжитесь с клиентом в течение 1 часа, предложите компенсацию.",
    ),
    (
        "Претензия",
        1,
        None,
        "Рассмотрите претензию в течение 24 часов и предоставьте письменный ответ.",
    ),
    (
        "Жалоба",
        7,
        Some(Sentiment::NEG),
        "Высокоприоритетная жалоба: эскалируйте руководителю и свяжитесь с клиентом сегодня.",
    ),
    (
        "Жалоба",
        1,
        None,
        "Обработайте жалобу в течение рабочего дня, предложите решение проблемы.",
    ),
    (
        "Неработоспособность",
        7,
        None,
        "Критический сбой приложения: передайте в L2-поддержку немедленно.",
    ),
    (
        "Неработоспособность",
        1,
        None,
        "Проверьте техническую проблему и при необходимости передайте в L2-поддержку.",
    ),
    (
        "Смена данных",
        1,
        None,
        "Верифицируйте личность клиента перед внесением изменений.",
    ),
    (
        "Спам",
        1,
        None,
        "Отметьте контакт как спам и при необходимости заблокируйте отправителя.",
    ),
    (
        "Консультация",
        1,
        Some(Sentiment::POS),
        "Предоставьте консультацию и предложите дополнительные продукты.",
    ),
    (
        "Консультация",
        1,
        None,
        "Предоставьте полную консультацию и зафиксируйте результат.",
    ),
];

/// Unreachable under the current fixed set of categories (every one of them
/// has a `priority >= 1, ANY` rule above), kept because the original keeps
/// it too — a future category without its own rule would still fall here.
const DEFAULT_RECOMMENDATION: &str = "Обработайте обращение в стандартные сроки согласно регламенту.";

/// Produces an actionable recommendation from an ordered rule list.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        RecommendationEngine
    }

    pub fn recommend(&self, category: Category, sentiment: Sentiment, priority: u8) -> String {
        for (fragment, min_priority, constraint, text) in RULES {
            let type_match = category.as_str().contains(fragment);
            let priority_match = priority >= *min_priority;
            let sentiment_match = constraint.map_or(true, |required| required == sentiment);
            if type_match && priority_match && sentiment_match {
                return (*text).to_string();
            }
        }
        DEFAULT_RECOMMENDATION.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_summarizes_to_empty() {
        let s = SummaryFallback::new();
        assert_eq!(s.summarize(""), "");
    }

    #[test]
    fn short_sentences_are_skipped() {
        let s = SummaryFallback::new();
        // "Ок." and "Да." are both below MIN_SENTENCE_LEN; the third clears it.
        let out = s.summarize("Ок. Да. У меня не работает приложение уже третий день подряд.");
        assert!(out.contains("не работает приложение"));
    }

    #[test]
    fn long_text_is_truncated() {
        let s = SummaryFallback::new();
        let long = "а".repeat(500);
        let out = s.summarize(&long);
        assert!(out.chars().count() <= MAX_SUMMARY_LEN);
        assert!(out.ends_with('…'));
    }

    #[test]
    fn fraud_always_escalates_regardless_of_sentiment_or_priority() {
        let r = RecommendationEngine::new();
        let rec = r.recommend(Category::Fraud, Sentiment::NEU, 1);
        assert!(rec.contains("безопасности"));
    }

    #[test]
    fn high_priority_negative_complaint_escalates_to_a_supervisor() {
        let r = RecommendationEngine::new();
        let rec = r.recommend(Category::Complaint, Sentiment::NEG, 7);
        assert!(rec.contains("эскалируйте руководителю"));
    }

    #[test]
    fn low_priority_negative_complaint_falls_to_the_plain_complaint_rule() {
        let r = RecommendationEngine::new();
        let rec = r.recommend(Category::Complaint, Sentiment::NEG, 5);
        assert!(rec.contains("в течение рабочего дня"));
    }

    #[test]
    fn high_priority_negative_claim_offers_compensation() {
        let r = RecommendationEngine::new();
        let rec = r.recommend(Category::Claim, Sentiment::NEG, 7);
        assert!(rec.contains("компенсацию"));
    }

    #[test]
    fn low_priority_claim_falls_to_the_plain_claim_rule() {
        let r = RecommendationEngine::new();
        let rec = r.recommend(Category::Claim, Sentiment::NEU, 1);
        assert!(rec.contains("24 часов"));
    }

    #[test]
    fn spam_gets_a_spam_specific_recommendation() {
        let r = RecommendationEngine::new();
        let rec = r.recommend(Category::Spam, Sentiment::NEU, 1);
        assert!(rec.contains("заблокируйте отправителя"));
    }

    #[test]
    fn positive_consultation_gets_an_upsell_recommendation() {
        let r = RecommendationEngine::new();
        let rec = r.recommend(Category::Consultation, Sentiment::POS, 1);
        assert!(rec.contains("дополнительные продукты"));
    }

    #[test]
    fn neutral_consultation_gets_the_plain_consultation_rule() {
        let r = RecommendationEngine::new();
        let rec = r.recommend(Category::Consultation, Sentiment::NEU, 9);
        assert!(rec.contains("зафиксируйте результат"));
    }
}
