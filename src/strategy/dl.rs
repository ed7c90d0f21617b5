use super::{escalate, prompt};
use crate::model::AnswerCapability;
use crate::types::{Fault, PredictedAnswer, Sample, StrategyKind};

/// What the model said when asked to check the current answer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Review {
    Confident,
    Revise(String),
    Unclear,
}

fn parse_review(reply: &str) -> Review {
    let Some(line) = reply.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return Review::Unclear;
    };
    if line
        .get(..9)
        .is_some_and(|p| p.eq_ignore_ascii_case("confident"))
    {
        return Review::Confident;
    }
    match line.get(..7) {
        Some(p) if p.eq_ignore_ascii_case("revise:") => {
            let answer = prompt::clean_answer(&line[7..]);
            if answer.is_empty() {
                Review::Unclear
            } else {
                Review::Revise(answer)
            }
        }
        _ => Review::Unclear,
    }
}

/// Draft, then self-check and revise until the model is confident, the
/// revision stops changing, or the step bound is reached.
///
/// `max_steps` bounds the total number of capability calls, draft included.
/// Hitting the bound returns the last answer that was produced.
pub struct DlAgent {
    max_steps: usize,
    max_new_tokens: usize,
}

impl DlAgent {
    pub fn new(max_steps: usize, max_new_tokens: usize) -> Self {
        Self {
            max_steps: max_steps.max(1),
            max_new_tokens,
        }
    }

    pub fn answer(
        &self,
        sample: &Sample,
        model: &dyn AnswerCapability,
    ) -> Result<PredictedAnswer, Fault> {
        let image = Some(sample.image_reference.as_path());
        let draft_prompt = prompt::render(prompt::ZERO_SHOT_TEMPLATE, &sample.question, "");
        let mut current = match escalate(
            model.infer(&draft_prompt, image, self.max_new_tokens),
            "dl draft",
        )? {
            Ok(text) => prompt::clean_answer(&text),
            Err(e) => {
                return Ok(PredictedAnswer::error(
                    sample.id,
                    StrategyKind::DlAgent,
                    format!("dl draft failed: {e}"),
                    1,
                ));
            }
        };
        let mut steps = 1;

        while steps < self.max_steps {
            let verify_prompt = prompt::render(prompt::VERIFY_TEMPLATE, &sample.question, &current);
            let reply = escalate(
                model.infer(&verify_prompt, image, self.max_new_tokens),
                "dl review",
            )?;
            steps += 1;
            let reply = match reply {
                Ok(text) => text,
                Err(e) => {
                    return Ok(PredictedAnswer::error(
                        sample.id,
                        StrategyKind::DlAgent,
                        format!("dl review {} failed: {e}", steps - 1),
                        steps,
                    ));
                }
            };
            match parse_review(&reply) {
                Review::Revise(revised) if !revised.eq_ignore_ascii_case(&current) => {
                    current = revised;
                }
                _ => break,
            }
        }

        Ok(PredictedAnswer::answered(
            sample.id,
            StrategyKind::DlAgent,
            current,
            steps,
        ))
    }
}
