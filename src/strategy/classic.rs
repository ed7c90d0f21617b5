use super::{escalate, prompt};
use crate::config::StepConfig;
use crate::model::AnswerCapability;
use crate::types::{Fault, PredictedAnswer, Sample, StrategyKind};

/// A fixed pipeline of steps, each fed the previous step's output.
///
/// The step list is fixed when the strategy is built and never branches on
/// intermediate content. The first failing step ends the pipeline.
pub struct ClassicAgent {
    steps: Vec<StepConfig>,
}

impl ClassicAgent {
    pub fn new(steps: Vec<StepConfig>) -> Self {
        Self { steps }
    }

    pub fn answer(
        &self,
        sample: &Sample,
        model: &dyn AnswerCapability,
    ) -> Result<PredictedAnswer, Fault> {
        let mut context = String::new();

        for (i, step) in self.steps.iter().enumerate() {
            let prompt = prompt::render(&step.template, &sample.question, &context);
            let image = step.with_image.then_some(sample.image_reference.as_path());
            let stage = format!("classic step '{}'", step.name);
            match escalate(model.infer(&prompt, image, step.max_new_tokens), &stage)? {
                Ok(text) => context = text,
                Err(e) => {
                    return Ok(PredictedAnswer::error(
                        sample.id,
                        StrategyKind::ClassicAgent,
                        format!("{stage} failed: {e}"),
                        i + 1,
                    ));
                }
            }
        }

        Ok(PredictedAnswer::answered(
            sample.id,
            StrategyKind::ClassicAgent,
            prompt::clean_answer(&context),
            self.steps.len(),
        ))
    }
}
