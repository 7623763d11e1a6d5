//! Post-run aggregate statistics, logged at completion (ambient, not
//! exposed over any network interface).
//!
//! Grounded on `examples/original_source/analyze.py` (`gini`, `agg_block`).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::Assignment;

/// Gini coefficient over non-negative values. Returns `0.0` for an empty
/// slice or when every value is zero (perfect equality by convention).
pub fn gini(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<i64> = values.iter().map(|v| (*v).max(0)).collect();
    sorted.sort_unstable();
    let n = sorted.len() as f64;
    let sum: i64 = sorted.iter().sum();
    if sum == 0 {
        return 0.0;
    }
    let cumulative: i64 = sorted.iter().enumerate().map(|(i, v)| (i as i64 + 1) * v).sum();
    (2.0 * cumulative as f64) / (n * sum as f64) - (n + 1.0) / n
}

/// Aggregate statistics computed once after a pipeline run completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_tickets: usize,
    pub escalated: usize,
    pub escalation_rate: f64,
    pub average_priority: f64,
    pub category_counts: HashMap<String, usize>,
    pub office_counts: HashMap<String, usize>,
    pub manager_load_gini: f64,
}

impl RunSummary {
    pub fn compute(assignments: &[Assignment], manager_loads: &[i64]) -> Self {
        let total_tickets = assignments.len();
        let escalated = assignments.iter().filter(|a| a.is_escalated()).count();
        let escalation_rate = if total_tickets == 0 {
            0.0
        } else {
            escalated as f64 / total_tickets as f64
        };
        let average_priority = if total_tickets == 0 {
            0.0
        } else {
            assignments.iter().map(|a| a.enrichment.priority as f64).sum::<f64>() / total_tickets as f64
        };

        let mut category_counts: HashMap<String, usize> = HashMap::new();
        let mut office_counts: HashMap<String, usize> = HashMap::new();
        for assignment in assignments {
            *category_counts.entry(assignment.enrichment.category.as_str().to_string()).or_insert(0) += 1;
            *office_counts.entry(assignment.office.clone()).or_insert(0) += 1;
        }

        Self {
            total_tickets,
            escalated,
            escalation_rate,
            average_priority,
            category_counts,
            office_counts,
            manager_load_gini: gini(manager_loads),
        }
    }

    pub fn log(&self) {
        tracing::info!(
            total = self.total_tickets,
            escalated = self.escalated,
            escalation_rate = %format!("{:.3}", self.escalation_rate),
            average_priority = %format!("{:.2}", self.average_priority),
            manager_load_gini = %format!("{:.3}", self.manager_load_gini),
            "run summary"
        );
    }
}
