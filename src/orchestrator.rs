//! Drives a dataset through strategies and the judge.
//!
//! Each (strategy, sample) pair moves `Pending -> Answered -> Scored`, or
//! `Pending -> Failed` when an infrastructure fault escapes the strategy or the
//! judge. Either way the pair yields exactly one verdict and the run moves on,
//! so a run over N samples always returns N verdicts in dataset order.

use crate::dataset::Dataset;
use crate::judge::JudgeScorer;
use crate::logger::{make_record, EventSink};
use crate::model::AnswerCapability;
use crate::report::{RunOutcome, RunReport};
use crate::strategy::Strategy;
use crate::types::{Sample, Verdict};

pub struct Orchestrator<'a> {
    answer_model: &'a dyn AnswerCapability,
    judge_model: &'a dyn AnswerCapability,
    judge: JudgeScorer,
    sink: &'a dyn EventSink,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        answer_model: &'a dyn AnswerCapability,
        judge_model: &'a dyn AnswerCapability,
        judge: JudgeScorer,
        sink: &'a dyn EventSink,
    ) -> Self {
        Self {
            answer_model,
            judge_model,
            judge,
            sink,
        }
    }

    /// Evaluate one strategy over every sample, strictly in order.
    pub fn run(&self, strategy: &Strategy, dataset: &Dataset) -> RunOutcome {
        let kind = strategy.kind();
        self.sink.info(&format!(
            "[{kind}] evaluating {} samples",
            dataset.len()
        ));

        let verdicts: Vec<Verdict> = dataset
            .samples()
            .iter()
            .map(|sample| self.evaluate_sample(strategy, sample))
            .collect();

        let outcome = RunOutcome {
            strategy: kind,
            verdicts,
        };
        match outcome.accuracy() {
            Some(acc) => self.sink.info(&format!(
                "[{kind}] {}/{} correct ({:.2}%)",
                outcome.correct(),
                outcome.verdicts.len(),
                acc * 100.0
            )),
            None => self.sink.warn(&format!("[{kind}] dataset is empty, nothing evaluated")),
        }
        outcome
    }

    /// Run several strategies over the same dataset.
    ///
    /// A strategy whose every sample failed is logged and left out of the report.
    pub fn run_all(&self, strategies: &[Strategy], dataset: &Dataset) -> RunReport {
        let outcomes = strategies
            .iter()
            .map(|strategy| self.run(strategy, dataset))
            .filter(|outcome| {
                if outcome.is_faulted() {
                    self.sink.error(&format!(
                        "[{}] every sample failed; leaving it out of the report",
                        outcome.strategy
                    ));
                    return false;
                }
                true
            })
            .collect::<Vec<_>>();
        RunReport::from_outcomes(outcomes)
    }

    fn evaluate_sample(&self, strategy: &Strategy, sample: &Sample) -> Verdict {
        let kind = strategy.kind();

        let predicted = match strategy.answer(sample, self.answer_model) {
            Ok(predicted) => predicted,
            Err(fault) => {
                self.sink
                    .error(&format!("[{kind}] sample {} failed: {fault}", sample.id));
                let verdict = Verdict::failed(sample.id, kind);
                self.sink.record(&make_record(sample, None, None, &verdict));
                return verdict;
            }
        };
        if predicted.is_error {
            self.sink.warn(&format!(
                "[{kind}] sample {}: no answer: {}",
                sample.id, predicted.text
            ));
        }

        match self.judge.score(
            &sample.question,
            &sample.ground_truth_answer,
            &predicted,
            self.judge_model,
            self.sink,
        ) {
            Ok(judgement) => {
                self.sink.record(&make_record(
                    sample,
                    Some(&predicted),
                    judgement.reply,
                    &judgement.verdict,
                ));
                judgement.verdict
            }
            Err(fault) => {
                self.sink
                    .error(&format!("[{kind}] sample {} failed: {fault}", sample.id));
                let verdict = Verdict::failed(sample.id, kind);
                self.sink
                    .record(&make_record(sample, Some(&predicted), None, &verdict));
                verdict
            }
        }
    }
}
