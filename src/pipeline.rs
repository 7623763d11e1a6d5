//! Ties enrichment and routing into one end-to-end run (C9).
//!
//! Enrichment fans out with bounded concurrency; routing then runs
//! strictly sequentially over the enriched results, in input order (spec
//! §5). Grounded on `examples/original_source/run.py`'s
//! `ThreadPoolExecutor`-based enrichment fan-out, translated to async
//! bounded concurrency per `examples/electricessence-claw-router`'s use of
//! `futures_util::StreamExt`.

use futures_util::stream::{self, StreamExt};

use crate::config::Config;
use crate::enricher::Enricher;
use crate::llm::LLMAdapter;
use crate::models::{Assignment, Enrichment, Manager, Office, Ticket};
use crate::router::Router;
use crate::stats::RunSummary;

/// One complete pipeline run: enrich every ticket, then route every
/// enriched ticket to a manager.
pub struct Pipeline {
    config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the full pipeline. Returns the final assignments (input order
    /// preserved) and the aggregate [`RunSummary`].
    #[tracing::instrument(skip(self, tickets, managers, offices), fields(tickets = tickets.len()))]
    pub async fn run(
        &self,
        tickets: Vec<Ticket>,
        managers: Vec<Manager>,
        offices: Vec<Office>,
    ) -> (Vec<Assignment>, RunSummary) {
        let llm = if self.config.llm_enabled() {
            LLMAdapter::from_env(&self.config.llm.base_url, &self.config.llm.model, self.config.llm.timeout_ms)
        } else {
            None
        };
        if self.config.llm_enabled() && llm.is_none() {
            tracing::warn!("LLM enrichment enabled in config but no API credentials found — falling back to offline summaries");
        }

        tracing::info!(worker_count = self.config.pipeline.worker_count, "starting enrichment phase");
        let enrichments = self.enrich_all(&tickets, llm).await;

        tracing::info!("starting routing phase");
        let (mut router, warnings) = Router::new(
            managers,
            offices,
            self.config.routing.rr_spread_threshold,
            &self.config.routing.fallback_capitals,
        );
        for warning in &warnings {
            tracing::warn!("{warning}");
        }

        let mut assignments = Vec::with_capacity(tickets.len());
        for (ticket, enrichment) in tickets.iter().zip(enrichments.iter()) {
            assignments.push(router.route(ticket, enrichment));
        }

        let summary = RunSummary::compute(&assignments, &router.manager_loads());
        summary.log();
        (assignments, summary)
    }

    /// Enrichment fan-out: one future per ticket, at most `worker_count`
    /// running concurrently, results collected back in input order.
    async fn enrich_all(&self, tickets: &[Ticket], llm: Option<LLMAdapter>) -> Vec<Enrichment> {
        let enricher = std::sync::Arc::new(Enricher::with_priority_config(llm, self.config.priority.clone()));
        let worker_count = self.config.pipeline.worker_count;

        stream::iter(tickets.iter().cloned().enumerate())
            .map(|(index, ticket)| {
                let enricher = enricher.clone();
                async move { (index, enricher.enrich(&ticket).await) }
            })
            .buffer_unordered(worker_count)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<std::collections::BTreeMap<_, _>>()
            .into_values()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(guid: &str, text: &str) -> Ticket {
        Ticket {
            guid: guid.to_string(),
            text: text.to_string(),
            city: "Алматы".to_string(),
            region: String::new(),
            country: "KZ".to_string(),
            segment: "MASS".to_string(),
            lat: None,
            lon: None,
        }
    }

    fn manager(name: &str, office: &str) -> Manager {
        Manager {
            name: name.to_string(),
            position: "специалист".to_string(),
            office: office.to_string(),
            skills: String::new(),
            load: 0,
            chief: false,
            skill_set: Default::default(),
        }
    }

    fn office(name: &str, lat: f64, lon: f64) -> Office {
        Office { name: name.to_string(), address: None, lat: Some(lat), lon: Some(lon) }
    }

    #[tokio::test]
    async fn pipeline_preserves_input_order_and_routes_every_ticket() {
        let mut config = Config::default();
        config.llm.enabled = false;
        std::env::remove_var("OPENROUTER_API_KEY");
        std::env::remove_var("OPENAI_API_KEY");

        let pipeline = Pipeline::new(config);
        let tickets = vec![
            ticket("t-1", "Спасибо, всё работает отлично"),
            ticket("t-2", "Мошенники украли деньги"),
            ticket("t-3", "У меня не работает приложение"),
        ];
        let managers = vec![manager("Иванов", "Алматы")];
        let offices = vec![office("Алматы", 43.2389, 76.8897)];

        let (assignments, summary) = pipeline.run(tickets, managers, offices).await;
        assert_eq!(assignments.len(), 3);
        assert_eq!(assignments[0].guid, "t-1");
        assert_eq!(assignments[1].guid, "t-2");
        assert_eq!(assignments[2].guid, "t-3");
        assert_eq!(summary.total_tickets, 3);
    }

    #[tokio::test]
    async fn empty_ticket_list_produces_empty_summary() {
        let mut config = Config::default();
        config.llm.enabled = false;
        let pipeline = Pipeline::new(config);
        let (assignments, summary) = pipeline.run(vec![], vec![], vec![office("Алматы", 43.2389, 76.8897)]).await;
        assert!(assignments.is_empty());
        assert_eq!(summary.total_tickets, 0);
        assert_eq!(summary.escalation_rate, 0.0);
    }
}
