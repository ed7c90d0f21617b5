//! Answering strategies.
//!
//! Every strategy shares one failure contract: ordinary problems (unreadable
//! image, failed generation) come back as an `is_error` answer, and only an
//! unusable capability escapes as a [`Fault`].

mod classic;
mod dl;
pub mod prompt;
mod zero_shot;

pub use classic::ClassicAgent;
pub use dl::DlAgent;
pub use zero_shot::ZeroShot;

use crate::config::EvalConfig;
use crate::model::{AnswerCapability, InferenceError};
use crate::types::{Fault, PredictedAnswer, Sample, StrategyKind};

pub enum Strategy {
    ZeroShot(ZeroShot),
    ClassicAgent(ClassicAgent),
    DlAgent(DlAgent),
}

impl Strategy {
    /// Build the strategy for `kind` from validated config.
    pub fn from_config(kind: StrategyKind, config: &EvalConfig) -> Self {
        match kind {
            StrategyKind::ZeroShot => {
                Strategy::ZeroShot(ZeroShot::new(config.model.answer_max_tokens))
            }
            StrategyKind::ClassicAgent => {
                Strategy::ClassicAgent(ClassicAgent::new(config.agents.classic.steps.clone()))
            }
            StrategyKind::DlAgent => Strategy::DlAgent(DlAgent::new(
                config.agents.dl.max_steps,
                config.agents.dl.max_new_tokens,
            )),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::ZeroShot(_) => StrategyKind::ZeroShot,
            Strategy::ClassicAgent(_) => StrategyKind::ClassicAgent,
            Strategy::DlAgent(_) => StrategyKind::DlAgent,
        }
    }

    pub fn answer(
        &self,
        sample: &Sample,
        model: &dyn AnswerCapability,
    ) -> Result<PredictedAnswer, Fault> {
        match self {
            Strategy::ZeroShot(s) => s.answer(sample, model),
            Strategy::ClassicAgent(s) => s.answer(sample, model),
            Strategy::DlAgent(s) => s.answer(sample, model),
        }
    }
}

/// Escalate an unusable capability to a [`Fault`]; pass every other outcome through.
pub(crate) fn escalate(
    result: Result<String, InferenceError>,
    stage: &str,
) -> Result<Result<String, InferenceError>, Fault> {
    match result {
        Err(e) if e.is_infrastructure() => Err(Fault::new(stage, e.to_string())),
        other => Ok(other),
    }
}
