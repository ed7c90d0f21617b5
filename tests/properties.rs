//! Orchestrator behavior through the public library API, with scripted models.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::Path;

use vqa_eval::config::EvalConfig;
use vqa_eval::dataset::Dataset;
use vqa_eval::judge::JudgeScorer;
use vqa_eval::logger::{Level, MemorySink};
use vqa_eval::model::{AnswerCapability, InferenceError};
use vqa_eval::orchestrator::Orchestrator;
use vqa_eval::strategy::Strategy;
use vqa_eval::types::{SampleStatus, StrategyKind};

/// Replies from a queue, then repeats the last configured fallback.
struct Scripted {
    replies: RefCell<VecDeque<Result<String, InferenceError>>>,
    fallback: Result<String, InferenceError>,
    calls: Cell<usize>,
}

impl Scripted {
    fn new(replies: Vec<Result<String, InferenceError>>, fallback: Result<String, InferenceError>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            fallback,
            calls: Cell::new(0),
        }
    }

    fn always(reply: &str) -> Self {
        Self::new(Vec::new(), Ok(reply.to_string()))
    }
}

impl AnswerCapability for Scripted {
    fn infer(&self, _: &str, _: Option<&Path>, _: usize) -> Result<String, InferenceError> {
        self.calls.set(self.calls.get() + 1);
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Affirms exactly when the candidate line equals the reference line.
struct ExactMatchJudge {
    calls: Cell<usize>,
}

impl ExactMatchJudge {
    fn new() -> Self {
        Self { calls: Cell::new(0) }
    }
}

impl AnswerCapability for ExactMatchJudge {
    fn infer(&self, prompt: &str, _: Option<&Path>, _: usize) -> Result<String, InferenceError> {
        self.calls.set(self.calls.get() + 1);
        let field = |prefix: &str| {
            prompt
                .lines()
                .find_map(|l| l.strip_prefix(prefix))
                .map(str::to_string)
        };
        let same = field("Reference answer: ") == field("Candidate answer: ");
        Ok(if same { "YES" } else { "NO" }.to_string())
    }
}

fn zero_shot() -> Strategy {
    Strategy::from_config(StrategyKind::ZeroShot, &EvalConfig::default())
}

fn three_samples() -> Dataset {
    Dataset::from_rows([
        ("What animal is this?", "1.jpg", "cat"),
        ("What animal is this?", "2.jpg", "dog"),
        ("What animal is this?", "3.jpg", "horse"),
    ])
}

#[test]
fn test_end_to_end_two_of_three_correct() {
    let answer = Scripted::new(
        vec![Ok("cat".into()), Ok("dog".into()), Ok("zebra".into())],
        Ok(String::new()),
    );
    let judge = ExactMatchJudge::new();
    let sink = MemorySink::new();
    let orch = Orchestrator::new(&answer, &judge, JudgeScorer::new(8), &sink);

    let outcome = orch.run(&zero_shot(), &three_samples());
    let correct: Vec<bool> = outcome.verdicts.iter().map(|v| v.correct).collect();
    assert_eq!(correct, vec![true, true, false]);
    let acc = outcome.accuracy().unwrap();
    assert!((acc - 0.667).abs() < 0.001, "accuracy was {acc}");
}

#[test]
fn test_verdicts_cover_every_sample_in_order_despite_errors() {
    let answer = Scripted::new(
        vec![
            Err(InferenceError::Generation("bad generation".into())),
            Err(InferenceError::Unavailable("backend down".into())),
            Ok("horse".into()),
        ],
        Ok(String::new()),
    );
    let judge = ExactMatchJudge::new();
    let sink = MemorySink::new();
    let orch = Orchestrator::new(&answer, &judge, JudgeScorer::new(8), &sink);

    let outcome = orch.run(&zero_shot(), &three_samples());
    assert_eq!(outcome.verdicts.len(), 3);
    let ids: Vec<usize> = outcome.verdicts.iter().map(|v| v.sample_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(outcome.verdicts[0].status, SampleStatus::Scored);
    assert_eq!(outcome.verdicts[1].status, SampleStatus::Failed);
    assert!(outcome.verdicts[2].correct, "sample after a failure is still processed");
    // Only the real answer reached the judge.
    assert_eq!(judge.calls.get(), 1);
    assert_eq!(sink.count(Level::Error), 1);
}

#[test]
fn test_every_strategy_returns_one_verdict_per_sample() {
    let config = EvalConfig::default();
    for kind in StrategyKind::ALL {
        let answer = Scripted::always("cat");
        let judge = ExactMatchJudge::new();
        let sink = MemorySink::new();
        let orch = Orchestrator::new(&answer, &judge, JudgeScorer::new(8), &sink);
        let outcome = orch.run(&Strategy::from_config(kind, &config), &three_samples());
        assert_eq!(outcome.verdicts.len(), 3, "{kind}");
        assert!(outcome.verdicts[0].correct, "{kind}");
        assert!(!outcome.verdicts[1].correct, "{kind}");
    }
}

#[test]
fn test_empty_dataset_has_no_accuracy() {
    let answer = Scripted::always("cat");
    let judge = ExactMatchJudge::new();
    let sink = MemorySink::new();
    let orch = Orchestrator::new(&answer, &judge, JudgeScorer::new(8), &sink);

    let outcome = orch.run(&zero_shot(), &Dataset::default());
    assert!(outcome.verdicts.is_empty());
    assert_eq!(outcome.accuracy(), None);
    assert_eq!(answer.calls.get(), 0);
    assert_eq!(judge.calls.get(), 0);
}

#[test]
fn test_unparseable_judge_reply_grades_incorrect() {
    let answer = Scripted::always("cat");
    let judge = Scripted::always("¯\\_(ツ)_/¯");
    let sink = MemorySink::new();
    let orch = Orchestrator::new(&answer, &judge, JudgeScorer::new(8), &sink);

    let outcome = orch.run(&zero_shot(), &three_samples());
    assert!(outcome.verdicts.iter().all(|v| !v.correct));
    assert!(outcome
        .verdicts
        .iter()
        .all(|v| v.status == SampleStatus::Scored));
    assert_eq!(sink.count(Level::Warn), 3);
}
