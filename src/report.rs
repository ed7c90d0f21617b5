use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::types::{SampleStatus, StrategyKind, Verdict};

/// The verdicts of one strategy over a dataset, in dataset order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunOutcome {
    pub strategy: StrategyKind,
    pub verdicts: Vec<Verdict>,
}

impl RunOutcome {
    pub fn correct(&self) -> usize {
        self.verdicts.iter().filter(|v| v.correct).count()
    }

    pub fn failed(&self) -> usize {
        self.verdicts
            .iter()
            .filter(|v| v.status == SampleStatus::Failed)
            .count()
    }

    /// `correct / N`, or `None` when nothing was evaluated.
    pub fn accuracy(&self) -> Option<f64> {
        if self.verdicts.is_empty() {
            return None;
        }
        Some(self.correct() as f64 / self.verdicts.len() as f64)
    }

    /// Every sample ended in the failed state.
    ///
    /// Faulted strategies are dropped from the report. On a one-sample dataset
    /// a single failed sample is therefore enough to drop the strategy.
    pub fn is_faulted(&self) -> bool {
        !self.verdicts.is_empty() && self.failed() == self.verdicts.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyReport {
    pub accuracy: Option<f64>,
    pub correct: usize,
    pub total: usize,
    pub failed: usize,
    pub verdicts: Vec<Verdict>,
}

impl From<RunOutcome> for StrategyReport {
    fn from(outcome: RunOutcome) -> Self {
        Self {
            accuracy: outcome.accuracy(),
            correct: outcome.correct(),
            total: outcome.verdicts.len(),
            failed: outcome.failed(),
            verdicts: outcome.verdicts,
        }
    }
}

/// Per-strategy results of one invocation. Built once, never mutated.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    strategies: BTreeMap<StrategyKind, StrategyReport>,
}

impl RunReport {
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = RunOutcome>) -> Self {
        Self {
            strategies: outcomes
                .into_iter()
                .map(|o| (o.strategy, StrategyReport::from(o)))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn get(&self, strategy: StrategyKind) -> Option<&StrategyReport> {
        self.strategies.get(&strategy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (StrategyKind, &StrategyReport)> {
        self.strategies.iter().map(|(k, v)| (*k, v))
    }

    /// One summary line per strategy, or a single line when nothing ran.
    pub fn summary_lines(&self) -> Vec<String> {
        if self.is_empty() {
            return vec!["No evaluations were run.".to_string()];
        }
        self.iter()
            .map(|(kind, report)| match report.accuracy {
                Some(acc) => format!("[{kind}] Accuracy: {:.2}%", acc * 100.0),
                None => format!("[{kind}] No samples evaluated"),
            })
            .collect()
    }

    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}
