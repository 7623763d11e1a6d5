//! Error types for the CLI boundary.
//!
//! Config loading gets a typed [`ConfigError`] enum (callers sometimes need
//! to match on the variant); everything past that point — input parsing,
//! the pipeline run itself — funnels through `anyhow::Result` at `main`,
//! since no caller needs to match on those failure modes. Per spec §7, no
//! error from inside enrichment or routing ever reaches this boundary —
//! those are always resolved to a default inline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config TOML")]
    Parse {
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {reason}")]
    Invalid { reason: String },
}
