//! Grades a predicted answer against the reference with a second model.

mod prompt;
mod response;

pub use prompt::build_judge_prompt;
pub use response::{classify_reply, JudgeReply};

use crate::logger::EventSink;
use crate::model::AnswerCapability;
use crate::strategy::escalate;
use crate::types::{Fault, PredictedAnswer, Verdict};

/// Outcome of grading one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Judgement {
    pub verdict: Verdict,
    /// `None` when the judge was never asked or produced no reply.
    pub reply: Option<JudgeReply>,
}

pub struct JudgeScorer {
    max_new_tokens: usize,
}

impl JudgeScorer {
    pub fn new(max_new_tokens: usize) -> Self {
        Self { max_new_tokens }
    }

    /// Grade `predicted`. Error answers are never shown to the judge.
    ///
    /// Unparseable or failed judge replies grade as incorrect; only an
    /// unusable judge capability returns a [`Fault`].
    pub fn score(
        &self,
        question: &str,
        ground_truth: &str,
        predicted: &PredictedAnswer,
        judge_model: &dyn AnswerCapability,
        sink: &dyn EventSink,
    ) -> Result<Judgement, Fault> {
        let incorrect = Verdict::scored(predicted.sample_id, predicted.strategy, false);
        if predicted.is_error {
            return Ok(Judgement {
                verdict: incorrect,
                reply: None,
            });
        }

        let prompt = build_judge_prompt(question, ground_truth, &predicted.text);
        let text = match escalate(judge_model.infer(&prompt, None, self.max_new_tokens), "judge")? {
            Ok(text) => text,
            Err(e) => {
                sink.warn(&format!(
                    "[{}] sample {}: judge call failed, grading as incorrect: {e}",
                    predicted.strategy, predicted.sample_id
                ));
                return Ok(Judgement {
                    verdict: incorrect,
                    reply: None,
                });
            }
        };

        let reply = classify_reply(&text);
        if matches!(reply, JudgeReply::Ambiguous | JudgeReply::Unrecognized) {
            sink.warn(&format!(
                "[{}] sample {}: {reply} judge reply, grading as incorrect: {:?}",
                predicted.strategy,
                predicted.sample_id,
                text.trim()
            ));
        }
        Ok(Judgement {
            verdict: Verdict::scored(predicted.sample_id, predicted.strategy, reply.is_correct()),
            reply: Some(reply),
        })
    }
}
