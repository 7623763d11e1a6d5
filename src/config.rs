//! Configuration for one pipeline run.
//!
//! Loaded once at startup from a TOML file and validated before the
//! pipeline runs. Invalid configs are rejected with a clear error rather
//! than silently falling back to defaults.
//!
//! # Example
//! ```toml
//! [pipeline]
//! worker_count = 20
//!
//! [llm]
//! base_url = "https://openrouter.ai/api/v1"
//! model    = "openai/gpt-4o-mini"
//!
//! [priority]
//! base = 5
//! high_type_bonus = 3
//! negative_sentiment_bonus = 2
//! vip_bonus = 2
//!
//! [routing]
//! rr_spread_threshold = 3
//! fallback_capitals   = ["Алматы", "Астана"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level run configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub priority: PriorityConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        let config: Self =
            toml::from_str(&content).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.pipeline.worker_count == 0 {
            return Err(ConfigError::Invalid {
                reason: "pipeline.worker_count must be at least 1".to_string(),
            });
        }
        if self.routing.fallback_capitals.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "routing.fallback_capitals must name at least one office".to_string(),
            });
        }
        Ok(())
    }

    /// Whether the LLM adapter should even be attempted — the adapter
    /// itself still disables if credentials are absent (spec §4.6).
    pub fn llm_enabled(&self) -> bool {
        self.llm.enabled
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            llm: LlmConfig::default(),
            priority: PriorityConfig::default(),
            routing: RoutingConfig::default(),
        }
    }
}

/// Concurrency and general pipeline settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Bounded concurrency for the enrichment fan-out (default: 20) — mirrors
    /// `original_source/run.py`'s `MAX_WORKERS`.
    #[serde(default = "defaults::worker_count")]
    pub worker_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { worker_count: defaults::worker_count() }
    }
}

/// LLM enrichment backend settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Whether enrichment should even attempt the LLM path (default: true).
    /// The adapter still disables itself if no credentials are found.
    #[serde(default = "defaults::llm_enabled")]
    pub enabled: bool,

    #[serde(default = "defaults::llm_base_url")]
    pub base_url: String,

    #[serde(default = "defaults::llm_model")]
    pub model: String,

    /// Per-call timeout in milliseconds (default: 15000).
    #[serde(default = "defaults::llm_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::llm_enabled(),
            base_url: defaults::llm_base_url(),
            model: defaults::llm_model(),
            timeout_ms: defaults::llm_timeout_ms(),
        }
    }
}

/// Priority-scoring weights (spec §4.7.1).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriorityConfig {
    #[serde(default = "defaults::priority_base")]
    pub base: i32,
    #[serde(default = "defaults::high_type_bonus")]
    pub high_type_bonus: i32,
    #[serde(default = "defaults::negative_sentiment_bonus")]
    pub negative_sentiment_bonus: i32,
    #[serde(default = "defaults::vip_bonus")]
    pub vip_bonus: i32,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            base: defaults::priority_base(),
            high_type_bonus: defaults::high_type_bonus(),
            negative_sentiment_bonus: defaults::negative_sentiment_bonus(),
            vip_bonus: defaults::vip_bonus(),
        }
    }
}

/// Routing / load-balancing tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    /// Load spread above which the fairness override picks the least-loaded
    /// manager instead of alternating the top two (default: 3).
    #[serde(default = "defaults::rr_spread_threshold")]
    pub rr_spread_threshold: i64,

    /// Ordered pair of capitals used by the 50/50 default-office fallback
    /// (spec §4.8.1) when a ticket has no usable city/region at all: the
    /// first entry alternates in as the secondary pick, the second is the
    /// ultimate default office when a ticket's country can't be resolved at
    /// all.
    #[serde(default = "defaults::fallback_capitals")]
    pub fallback_capitals: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            rr_spread_threshold: defaults::rr_spread_threshold(),
            fallback_capitals: defaults::fallback_capitals(),
        }
    }
}

mod defaults {
    pub fn worker_count() -> usize { 20 }
    pub fn llm_enabled() -> bool { true }
    pub fn llm_base_url() -> String { "https://openrouter.ai/api/v1".to_string() }
    pub fn llm_model() -> String { "openai/gpt-4o-mini".to_string() }
    pub fn llm_timeout_ms() -> u64 { 15_000 }
    pub fn priority_base() -> i32 { 5 }
    pub fn high_type_bonus() -> i32 { 3 }
    pub fn negative_sentiment_bonus() -> i32 { 2 }
    pub fn vip_bonus() -> i32 { 2 }
    pub fn rr_spread_threshold() -> i64 { 3 }
    pub fn fallback_capitals() -> Vec<String> {
        vec!["Алматы".to_string(), "Астана".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn minimal_toml_applies_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.pipeline.worker_count, 20);
        assert_eq!(config.routing.rr_spread_threshold, 3);
        assert_eq!(config.routing.fallback_capitals, vec!["Алматы", "Астана"]);
    }

    #[test]
    fn validation_rejects_zero_workers() {
        let mut config = Config::default();
        config.pipeline.worker_count = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validation_rejects_empty_fallback_capitals() {
        let mut config = Config::default();
        config.routing.fallback_capitals.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn overridden_values_round_trip() {
        let config: Config = toml::from_str(
            r#"
            [pipeline]
            worker_count = 5

            [llm]
            enabled = false

            [routing]
            rr_spread_threshold = 10
            "#,
        )
        .unwrap();
        assert_eq!(config.pipeline.worker_count, 5);
        assert!(!config.llm_enabled());
        assert_eq!(config.routing.rr_spread_threshold, 10);
    }
}
