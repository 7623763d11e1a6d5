//! Optional LLM-backed enrichment call with tolerant JSON extraction (C6).
//!
//! Grounded on `examples/electricessence-claw-router/src/backends/openai.rs`
//! for the reqwest client shape, and on
//! `examples/original_source/ai/enricher.py` (`SUMMARY_SYSTEM_PROMPT`,
//! `_get_llm_summary`, `_try_repair_json`) for the prompt, the
//! fence-stripping/brace-extraction/repair pipeline, and the
//! both-fields-non-empty success criterion.

use std::time::Duration;

use anyhow::Context;
use reqwest::{header, Client};
use serde::Deserialize;
use serde_json::json;

const SYSTEM_PROMPT: &str = "Ты — ассистент поддержки банка. По тексту обращения клиента верни \
строго JSON-объект с двумя полями: \"summary\" (краткое изложение сути обращения, не более 250 \
символов) и \"recommendation\" (конкретная рекомендация оператору, не более 300 символов). \
Не добавляй ничего, кроме JSON-объекта.";

const MAX_BODY_CHARS: usize = 2000;
const MAX_SUMMARY_CHARS: usize = 250;
const MAX_RECOMMENDATION_CHARS: usize = 300;

#[derive(Debug, Clone, Deserialize)]
struct LlmResult {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    recommendation: String,
}

/// The validated result of one successful LLM enrichment call.
#[derive(Debug, Clone)]
pub struct LlmEnrichment {
    pub summary: String,
    pub recommendation: String,
}

/// Optional OpenAI-compatible chat-completion backend for ticket enrichment.
///
/// Constructed via [`LLMAdapter::from_env`] — absent credentials mean no
/// adapter is built at all, per spec §4.6.
pub struct LLMAdapter {
    client: Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl LLMAdapter {
    /// Resolve credentials from `OPENROUTER_API_KEY`, falling back to
    /// `OPENAI_API_KEY`. Returns `None` when neither is set — enrichment then
    /// falls back to [`crate::summary::SummaryFallback`] for every ticket.
    pub fn from_env(base_url: &str, model: &str, timeout_ms: u64) -> Option<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()?;
        Some(Self::new(base_url.to_string(), model.to_string(), timeout_ms, api_key))
    }

    fn new(base_url: String, model: String, timeout_ms: u64, api_key: String) -> Self {
        let mut headers = header::HeaderMap::new();
        let value = format!("Bearer {api_key}");
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&value)
                .expect("API key contains invalid Authorization header characters"),
        );

        let timeout = Duration::from_millis(timeout_ms);
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .expect("failed to build reqwest client");

        Self { client, base_url, model, timeout }
    }

    /// Ask the model to summarize `text` and propose a recommendation.
    /// Bounded both by the client-level timeout and an outer
    /// `tokio::time::timeout`, so a hung connection never stalls the
    /// enrichment phase past `timeout_ms`.
    #[tracing::instrument(skip(self, text), fields(model = %self.model))]
    pub async fn analyze(&self, text: &str) -> anyhow::Result<LlmEnrichment> {
        let truncated: String = text.chars().take(MAX_BODY_CHARS).collect();
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": truncated},
            ],
            "temperature": 0.2,
            "max_tokens": 600,
        });

        let url = format!("{}/chat/completions", self.base_url);
        let call = async {
            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .with_context(|| format!("POST {url}"))?;

            let status = response.status();
            let text = response.text().await.context("reading LLM response body")?;
            if !status.is_success() {
                anyhow::bail!("LLM backend returned HTTP {status}: {text}");
            }

            let envelope: serde_json::Value =
                serde_json::from_str(&text).context("parsing chat-completions envelope")?;
            let content = envelope["choices"][0]["message"]["content"]
                .as_str()
                .context("missing choices[0].message.content")?;

            parse_tolerant(content)
        };

        let result = tokio::time::timeout(self.timeout, call)
            .await
            .context("LLM call timed out")??;

        validate(result)
    }
}

/// Extract and parse a JSON object from a possibly-messy model response:
/// strip markdown code fences, take the first (non-greedy) `{...}` span,
/// and attempt a couple of bounded repairs (close an unterminated string,
/// close a missing final brace) before giving up.
///
/// Grounded on `ai/enricher.py::_get_llm_summary` / `_try_repair_json`.
fn parse_tolerant(raw: &str) -> anyhow::Result<LlmResult> {
    let stripped = strip_code_fences(raw);
    let candidate = extract_braces(&stripped).context("no JSON object found in LLM response")?;

    if let Ok(parsed) = serde_json::from_str::<LlmResult>(&candidate) {
        return Ok(parsed);
    }

    let repaired = repair_json(&candidate);
    serde_json::from_str::<LlmResult>(&repaired)
        .context("LLM response JSON could not be parsed or repaired")
}

fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim().to_string();
        }
        return rest.trim().to_string();
    }
    trimmed.to_string()
}

/// Non-greedy, like the original's `r"\{[\s\S]+?\}"`: the first `{` paired
/// with the *nearest* `}` after it, not the last one in the text.
fn extract_braces(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let rest = &text[start..];
    let end_rel = rest.find('}')?;
    Some(rest[..=end_rel].to_string())
}

/// Closes an unterminated trailing string and/or a missing closing brace.
/// Only handles the two specific shapes seen from truncated LLM output —
/// anything stranger is left for `serde_json` to reject.
fn repair_json(text: &str) -> String {
    let mut s = text.to_string();
    let quote_count = s.matches('"').count() - s.matches("\\\"").count();
    if quote_count % 2 != 0 {
        s.push('"');
    }
    let open = s.matches('{').count();
    let close = s.matches('}').count();
    for _ in close..open {
        s.push('}');
    }
    s
}

/// Mirrors the original's `if summary and recommendation: return {...}` —
/// a syntactically valid response with either field empty after trimming
/// is still treated as a failed enrichment, not a degraded success.
fn validate(result: LlmResult) -> anyhow::Result<LlmEnrichment> {
    let summary = result.summary.trim();
    let recommendation = result.recommendation.trim();
    if summary.is_empty() || recommendation.is_empty() {
        anyhow::bail!("LLM response had an empty summary or recommendation field");
    }
    Ok(LlmEnrichment {
        summary: truncate_chars(summary, MAX_SUMMARY_CHARS),
        recommendation: truncate_chars(recommendation, MAX_RECOMMENDATION_CHARS),
    })
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn from_env_returns_none_without_credentials() {
        std::env::remove_var("OPENROUTER_API_KEY");
        std::env::remove_var("OPENAI_API_KEY");
        assert!(LLMAdapter::from_env("http://localhost", "gpt", 1000).is_none());
    }

    #[test]
    fn parse_tolerant_handles_plain_json() {
        let raw = r#"{"summary": "короткое резюме", "recommendation": "перезвонить клиенту"}"#;
        let parsed = parse_tolerant(raw).unwrap();
        assert_eq!(parsed.summary, "короткое резюме");
    }

    #[test]
    fn parse_tolerant_strips_markdown_fences() {
        let raw = "```json\n{\"summary\": \"s\", \"recommendation\": \"r\"}\n```";
        let parsed = parse_tolerant(raw).unwrap();
        assert_eq!(parsed.summary, "s");
        assert_eq!(parsed.recommendation, "r");
    }

    #[test]
    fn parse_tolerant_repairs_missing_closing_brace() {
        let raw = r#"{"summary": "s", "recommendation": "r""#;
        let parsed = parse_tolerant(raw).unwrap();
        assert_eq!(parsed.recommendation, "r");
    }

    #[test]
    fn parse_tolerant_repairs_unterminated_string() {
        let raw = r#"{"summary": "s", "recommendation": "unterminated}"#;
        let parsed = parse_tolerant(raw).unwrap();
        assert!(parsed.recommendation.starts_with("unterminated"));
    }

    #[test]
    fn validate_truncates_overlong_fields() {
        let long = LlmResult {
            summary: "а".repeat(400),
            recommendation: "б".repeat(400),
        };
        let validated = validate(long).unwrap();
        assert_eq!(validated.summary.chars().count(), MAX_SUMMARY_CHARS);
        assert_eq!(validated.recommendation.chars().count(), MAX_RECOMMENDATION_CHARS);
    }

    #[test]
    fn validate_rejects_an_empty_summary_or_recommendation() {
        let empty_summary = LlmResult { summary: "   ".to_string(), recommendation: "ok".to_string() };
        assert!(validate(empty_summary).is_err());

        let empty_recommendation = LlmResult { summary: "ok".to_string(), recommendation: String::new() };
        assert!(validate(empty_recommendation).is_err());
    }

    #[test]
    fn parse_tolerant_accepts_a_syntactically_valid_but_empty_field_response_for_the_caller_to_reject() {
        let raw = r#"{"summary": "", "recommendation": "ok"}"#;
        let parsed = parse_tolerant(raw).unwrap();
        assert!(validate(parsed).is_err());
    }

    #[test]
    fn extract_braces_stops_at_the_first_closing_brace_not_the_last() {
        let raw = r#"{"summary": "s", "recommendation": "r"} trailing junk {"ignored": true}"#;
        let extracted = extract_braces(raw).unwrap();
        assert_eq!(extracted, r#"{"summary": "s", "recommendation": "r"}"#);
    }

    #[tokio::test]
    async fn analyze_round_trips_against_mock_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{
                    "message": {
                        "content": "{\"summary\": \"клиент жалуется\", \"recommendation\": \"перезвонить\"}"
                    }
                }]
            })))
            .mount(&server)
            .await;

        let adapter = LLMAdapter::new(server.uri(), "gpt-test".to_string(), 5000, "key".to_string());
        let result = adapter.analyze("у меня не работает приложение").await.unwrap();
        assert_eq!(result.summary, "клиент жалуется");
        assert_eq!(result.recommendation, "перезвонить");
    }
}
