use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

mod classify;
mod config;
mod enricher;
mod error;
mod geo;
mod language;
mod llm;
mod models;
mod pipeline;
mod router;
mod sentiment;
mod stats;
mod summary;

pub use config::Config;
pub use error::ConfigError;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fire_router=info".into()),
        )
        .init();

    let args = CliArgs::parse(std::env::args().skip(1))?;

    let config_path = std::env::var("FIRE_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./fire-router.toml"));

    let config = if config_path.exists() {
        Config::load(&config_path)
            .with_context(|| format!("loading config from {}", config_path.display()))?
    } else {
        info!(path = %config_path.display(), "no config file found, using defaults");
        Config::default()
    };

    info!(worker_count = config.pipeline.worker_count, "fire-router starting");

    let tickets: Vec<models::Ticket> = read_json(&args.tickets_path)
        .with_context(|| format!("reading tickets from {}", args.tickets_path.display()))?;
    let managers: Vec<models::Manager> = read_json(&args.managers_path)
        .with_context(|| format!("reading managers from {}", args.managers_path.display()))?;
    let offices: Vec<models::Office> = read_json(&args.offices_path)
        .with_context(|| format!("reading offices from {}", args.offices_path.display()))?;

    let pipeline = pipeline::Pipeline::new(config);
    let (assignments, summary) = pipeline.run(tickets, managers, offices).await;

    info!(
        total = summary.total_tickets,
        escalated = summary.escalated,
        "pipeline run complete"
    );

    let output = serde_json::to_string_pretty(&assignments).context("serializing assignments")?;
    match args.out_path {
        Some(path) => {
            std::fs::write(&path, output).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "assignments written");
        }
        None => println!("{output}"),
    }

    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Minimal positional-argument CLI: `fire-router <tickets.json> <managers.json> <offices.json> [--out path]`.
struct CliArgs {
    tickets_path: PathBuf,
    managers_path: PathBuf,
    offices_path: PathBuf,
    out_path: Option<PathBuf>,
}

impl CliArgs {
    fn parse(args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut positional = Vec::new();
        let mut out_path = None;
        let mut args = args.peekable();
        while let Some(arg) = args.next() {
            if arg == "--out" {
                out_path = Some(PathBuf::from(
                    args.next().context("--out requires a path argument")?,
                ));
            } else {
                positional.push(arg);
            }
        }

        anyhow::ensure!(
            positional.len() == 3,
            "usage: fire-router <tickets.json> <managers.json> <offices.json> [--out path]"
        );

        Ok(Self {
            tickets_path: PathBuf::from(&positional[0]),
            managers_path: PathBuf::from(&positional[1]),
            offices_path: PathBuf::from(&positional[2]),
            out_path,
        })
    }
}
