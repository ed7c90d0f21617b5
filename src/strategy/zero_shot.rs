use super::{escalate, prompt};
use crate::model::AnswerCapability;
use crate::types::{Fault, PredictedAnswer, Sample, StrategyKind};

/// One direct call with the image and the question.
pub struct ZeroShot {
    max_new_tokens: usize,
}

impl ZeroShot {
    pub fn new(max_new_tokens: usize) -> Self {
        Self { max_new_tokens }
    }

    pub fn answer(
        &self,
        sample: &Sample,
        model: &dyn AnswerCapability,
    ) -> Result<PredictedAnswer, Fault> {
        let prompt = prompt::render(prompt::ZERO_SHOT_TEMPLATE, &sample.question, "");
        let result = model.infer(
            &prompt,
            Some(sample.image_reference.as_path()),
            self.max_new_tokens,
        );
        Ok(match escalate(result, "zero-shot")? {
            Ok(text) => PredictedAnswer::answered(
                sample.id,
                StrategyKind::ZeroShot,
                prompt::clean_answer(&text),
                1,
            ),
            Err(e) => PredictedAnswer::error(sample.id, StrategyKind::ZeroShot, e.to_string(), 1),
        })
    }
}
