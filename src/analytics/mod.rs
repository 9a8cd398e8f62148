//! Run statistics for collection results.

use crate::collector::filter::{Predicate, QualityFilter};
use crate::collector::{CollectionResult, TerminalState};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Summary of one run, for logs and reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub keyword: String,
    pub terminal_state: TerminalState,
    pub batches: usize,
    pub raw_count: usize,
    pub passed_count: usize,
    /// Share of raw items that passed, in percent.
    pub pass_rate: f64,
    /// How many raw items failed each predicate, in predicate order.
    pub failures_by_predicate: IndexMap<Predicate, usize>,
    pub distinct_channels: usize,
}

/// Measures a result by re-running the (pure) filter over its raw items.
pub fn summarize(result: &CollectionResult, filter: &QualityFilter) -> RunSummary {
    let mut failures_by_predicate: IndexMap<Predicate, usize> =
        Predicate::ALL.iter().map(|predicate| (*predicate, 0)).collect();

    for item in &result.raw_items {
        for predicate in filter.evaluate(item).failed {
            *failures_by_predicate.entry(predicate).or_insert(0) += 1;
        }
    }

    let distinct_channels = result
        .raw_items
        .iter()
        .map(|item| item.channel_id.as_str())
        .filter(|id| !id.is_empty())
        .collect::<std::collections::HashSet<_>>()
        .len();

    let raw_count = result.raw_items.len();
    let passed_count = result.filtered_items.len();
    let pass_rate = if raw_count == 0 {
        0.0
    } else {
        (passed_count as f64 / raw_count as f64 * 1000.0).round() / 10.0
    };

    RunSummary {
        keyword: result.keyword.clone(),
        terminal_state: result.terminal_state,
        batches: result.batches,
        raw_count,
        passed_count,
        pass_rate,
        failures_by_predicate,
        distinct_channels,
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}': {} after {} batch(es), {}/{} passed ({}%), {} channel(s)",
            self.keyword,
            self.terminal_state,
            self.batches,
            self.passed_count,
            self.raw_count,
            self.pass_rate,
            self.distinct_channels
        )?;
        let failures: Vec<String> = self
            .failures_by_predicate
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(predicate, count)| format!("{}={}", predicate, count))
            .collect();
        if !failures.is_empty() {
            write!(f, "; failures: {}", failures.join(", "))?;
        }
        Ok(())
    }
}
