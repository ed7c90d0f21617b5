use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// One dataset row: a question about an image and its reference answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    pub id: usize,
    pub question: String,
    pub image_reference: PathBuf,
    pub ground_truth_answer: String,
}

/// The closed set of answering strategies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    ZeroShot,
    ClassicAgent,
    DlAgent,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::ZeroShot,
        StrategyKind::ClassicAgent,
        StrategyKind::DlAgent,
    ];
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            StrategyKind::ZeroShot => "Zero-Shot",
            StrategyKind::ClassicAgent => "Classic Agent",
            StrategyKind::DlAgent => "DL Agent",
        })
    }
}

/// What a strategy produced for one sample.
///
/// `is_error` marks an answer the strategy could not really produce. It is
/// still a well-formed value and is graded as incorrect without asking the judge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictedAnswer {
    pub sample_id: usize,
    pub strategy: StrategyKind,
    pub text: String,
    pub is_error: bool,
    /// Number of capability calls that were made.
    pub steps: usize,
}

impl PredictedAnswer {
    pub fn answered(sample_id: usize, strategy: StrategyKind, text: String, steps: usize) -> Self {
        Self {
            sample_id,
            strategy,
            text,
            is_error: false,
            steps,
        }
    }

    pub fn error(sample_id: usize, strategy: StrategyKind, reason: String, steps: usize) -> Self {
        Self {
            sample_id,
            strategy,
            text: reason,
            is_error: true,
            steps,
        }
    }
}

/// Terminal state of a (strategy, sample) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleStatus {
    Scored,
    Failed,
}

impl std::fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            SampleStatus::Scored => "scored",
            SampleStatus::Failed => "failed",
        })
    }
}

/// Binary correctness judgment for one (strategy, sample) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub sample_id: usize,
    pub strategy: StrategyKind,
    pub correct: bool,
    pub status: SampleStatus,
}

impl Verdict {
    pub fn scored(sample_id: usize, strategy: StrategyKind, correct: bool) -> Self {
        Self {
            sample_id,
            strategy,
            correct,
            status: SampleStatus::Scored,
        }
    }

    pub fn failed(sample_id: usize, strategy: StrategyKind) -> Self {
        Self {
            sample_id,
            strategy,
            correct: false,
            status: SampleStatus::Failed,
        }
    }
}

/// An infrastructure failure that escaped a strategy or the judge scorer.
///
/// Ordinary per-sample problems never become a `Fault`; they are carried as
/// `is_error` answers or `correct=false` verdicts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage}: {message}")]
pub struct Fault {
    pub stage: String,
    pub message: String,
}

impl Fault {
    pub fn new(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
