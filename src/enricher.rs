//! Orchestrates classification, language/sentiment detection, geocoding, and
//! LLM-or-fallback summarization into one [`Enrichment`] per ticket (C7).
//!
//! Grounded on `examples/original_source/ai/enricher.py` (`TicketEnricher`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classify::TypeClassifier;
use crate::config::PriorityConfig;
use crate::geo::GeoIndex;
use crate::language::LanguageDetector;
use crate::llm::LLMAdapter;
use crate::models::{Category, Enrichment, Sentiment, Ticket};
use crate::sentiment::SentimentEngine;
use crate::summary::{RecommendationEngine, SummaryFallback};

static PARENTHETICAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(.*?\)").unwrap());

const MIN_PRIORITY: i32 = 1;
const MAX_PRIORITY: i32 = 10;

/// Builds an [`Enrichment`] for one [`Ticket`]. Holds no per-call state —
/// safe to share across the bounded-concurrency enrichment fan-out.
pub struct Enricher {
    classifier: TypeClassifier,
    language: LanguageDetector,
    sentiment: SentimentEngine,
    geo: GeoIndex,
    summarizer: SummaryFallback,
    recommender: RecommendationEngine,
    llm: Option<LLMAdapter>,
    priority: PriorityConfig,
}

impl Enricher {
    pub fn new(llm: Option<LLMAdapter>) -> Self {
        Self::with_priority_config(llm, PriorityConfig::default())
    }

    pub fn with_priority_config(llm: Option<LLMAdapter>, priority: PriorityConfig) -> Self {
        Self {
            classifier: TypeClassifier::new(),
            language: LanguageDetector::new(),
            sentiment: SentimentEngine::new(),
            geo: GeoIndex::new(),
            summarizer: SummaryFallback::new(),
            recommender: RecommendationEngine::new(),
            llm,
            priority,
        }
    }

    /// Enrich one ticket. Never fails — every missing or malformed input
    /// field degrades to a documented default rather than propagating an
    /// error (spec §7, "Missing required ticket field").
    #[tracing::instrument(skip(self, ticket), fields(guid = %ticket.guid))]
    pub async fn enrich(&self, ticket: &Ticket) -> Enrichment {
        let text = ticket.text.trim();
        let category = self.classifier.classify(text);
        let language = self.language.detect(text);
        let sentiment = self.sentiment.analyze(text);

        let segment = crate::models::Segment::normalise(&ticket.segment);
        let priority = compute_priority(&self.priority, category, sentiment, segment.is_vip_or_priority());

        let city = clean_city(&ticket.city);
        let region = clean_city(&ticket.region);
        let (lat, lon) = match (ticket.lat, ticket.lon) {
            (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
            _ => match self.geo.geocode(&city, Some(region.as_str())) {
                Some((lat, lon)) => (Some(lat), Some(lon)),
                None => (None, None),
            },
        };

        let (summary, recommendation) = self.summarize(text, category, sentiment, priority).await;

        Enrichment {
            category,
            language,
            sentiment,
            priority: priority as u8,
            summary,
            recommendation,
            lat,
            lon,
        }
    }

    async fn summarize(
        &self,
        text: &str,
        category: Category,
        sentiment: Sentiment,
        priority: i32,
    ) -> (String, String) {
        if let Some(llm) = &self.llm {
            if !text.is_empty() {
                match llm.analyze(text).await {
                    Ok(result) => return (result.summary, result.recommendation),
                    Err(err) => {
                        tracing::warn!(error = %err, "LLM enrichment failed, falling back");
                    }
                }
            }
        }

        let summary = self.summarizer.summarize(text);
        let recommendation = self.recommender.recommend(category, sentiment, priority as u8);
        (summary, recommendation)
    }
}

fn compute_priority(config: &PriorityConfig, category: Category, sentiment: Sentiment, is_vip: bool) -> i32 {
    let mut priority = config.base;
    if category.is_high_priority() {
        priority += config.high_type_bonus;
    }
    if sentiment == Sentiment::NEG {
        priority += config.negative_sentiment_bonus;
    }
    if is_vip {
        priority += config.vip_bonus;
    }
    priority.clamp(MIN_PRIORITY, MAX_PRIORITY)
}

/// Normalises messy city strings, matching `ai/enricher.py::_clean_city`:
/// collapses the closed placeholder set `{NULL, nan, none, -, ""}` to an
/// empty string, otherwise keeps the substring before any `/`, `|`, or `\`
/// and drops parenthetical content — `"Алматы / Астана"` → `"Алматы"`,
/// `"Нур-Султан (Астана)"` → `"Нур-Султан"`.
fn clean_city(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if matches!(trimmed.to_lowercase().as_str(), "null" | "nan" | "none" | "-") {
        return String::new();
    }
    let first_segment = trimmed.split(['/', '|', '\\']).next().unwrap_or("").trim();
    PARENTHETICAL_RE.replace_all(first_segment, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(text: &str, city: &str, segment: &str) -> Ticket {
        Ticket {
            guid: "t-1".to_string(),
            text: text.to_string(),
            city: city.to_string(),
            region: String::new(),
            country: "KZ".to_string(),
            segment: segment.to_string(),
            lat: None,
            lon: None,
        }
    }

    #[tokio::test]
    async fn enrich_without_llm_uses_fallback_summary_and_recommendation() {
        let enricher = Enricher::new(None);
        let t = ticket("Мошенники украли деньги со счёта без моего ведома", "Алматы", "VIP");
        let e = enricher.enrich(&t).await;
        assert_eq!(e.category, Category::Fraud);
        assert!(e.priority >= 8);
        assert_eq!(e.lat, Some(43.2389));
        assert!(!e.recommendation.is_empty());
    }

    #[tokio::test]
    async fn priority_clamped_to_ten() {
        let enricher = Enricher::new(None);
        let t = ticket("Мошенники обманули, это просто безобразие, ужасное обслуживание", "", "VIP");
        let e = enricher.enrich(&t).await;
        assert!(e.priority <= 10);
    }

    #[tokio::test]
    async fn unknown_city_placeholder_yields_no_coordinates() {
        let enricher = Enricher::new(None);
        let t = ticket("Обычный вопрос", "n/a", "MASS");
        let e = enricher.enrich(&t).await;
        assert_eq!(e.lat, None);
        assert_eq!(e.lon, None);
    }

    #[tokio::test]
    async fn custom_priority_config_changes_the_score() {
        let mut priority = PriorityConfig::default();
        priority.base = 1;
        priority.high_type_bonus = 0;
        priority.negative_sentiment_bonus = 0;
        priority.vip_bonus = 0;
        let enricher = Enricher::with_priority_config(None, priority);
        let t = ticket("Мошенники украли деньги", "Алматы", "VIP");
        let e = enricher.enrich(&t).await;
        assert_eq!(e.priority, 1);
    }

    #[test]
    fn clean_city_collapses_placeholders() {
        assert_eq!(clean_city("-"), "");
        assert_eq!(clean_city("nan"), "");
        assert_eq!(clean_city("NULL"), "");
        assert_eq!(clean_city(""), "");
        assert_eq!(clean_city(" Алматы "), "Алматы");
    }

    #[test]
    fn clean_city_keeps_first_segment_before_a_slash() {
        assert_eq!(clean_city("Алматы / Астана"), "Алматы");
    }

    #[test]
    fn clean_city_drops_parenthetical_content() {
        assert_eq!(clean_city("Нур-Султан (Астана)"), "Нур-Султан");
    }
}
