use chrono::Utc;
use serde::Serialize;
use std::cell::RefCell;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::judge::JudgeReply;
use crate::types::{PredictedAnswer, Sample, SampleStatus, StrategyKind, Verdict};

const MAX_LOGGED_TEXT_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Level::Info => "info",
            Level::Warn => "warning",
            Level::Error => "error",
        })
    }
}

/// One line of the per-sample results log.
#[derive(Debug, Clone, Serialize)]
pub struct SampleRecord {
    pub ts: String,
    pub strategy: StrategyKind,
    pub sample_id: usize,
    pub question: String,
    pub ground_truth: String,
    pub predicted: Option<String>,
    pub is_error: bool,
    pub judge_reply: Option<JudgeReply>,
    pub correct: bool,
    pub status: SampleStatus,
}

/// Where core components send diagnostics and per-sample records.
pub trait EventSink {
    fn event(&self, level: Level, message: &str);

    fn record(&self, record: &SampleRecord);

    fn info(&self, message: &str) {
        self.event(Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.event(Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.event(Level::Error, message);
    }
}

/// Process sink: diagnostics to stderr, records to an optional JSONL file.
pub struct StderrSink {
    results_log: Option<PathBuf>,
    verbose: bool,
}

impl StderrSink {
    pub fn new(results_log: Option<PathBuf>, verbose: bool) -> Self {
        Self {
            results_log,
            verbose,
        }
    }
}

impl EventSink for StderrSink {
    fn event(&self, level: Level, message: &str) {
        if level == Level::Info && !self.verbose {
            return;
        }
        eprintln!("vqa-eval: {level}: {message}");
    }

    fn record(&self, record: &SampleRecord) {
        if let Some(path) = &self.results_log {
            append_record_to(record, path);
        }
    }
}

/// Collects everything in memory. Used by tests and callers embedding the library.
#[derive(Default)]
pub struct MemorySink {
    events: RefCell<Vec<(Level, String)>>,
    records: RefCell<Vec<SampleRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<(Level, String)> {
        self.events.borrow().clone()
    }

    pub fn records(&self) -> Vec<SampleRecord> {
        self.records.borrow().clone()
    }

    pub fn count(&self, level: Level) -> usize {
        self.events.borrow().iter().filter(|(l, _)| *l == level).count()
    }
}

impl EventSink for MemorySink {
    fn event(&self, level: Level, message: &str) {
        self.events.borrow_mut().push((level, message.to_string()));
    }

    fn record(&self, record: &SampleRecord) {
        self.records.borrow_mut().push(record.clone());
    }
}

/// Append a record to a JSONL file. Errors are printed to stderr but do not fail the run.
pub fn append_record_to(record: &SampleRecord, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                eprintln!("vqa-eval: failed to create log directory: {e}");
                return;
            }
        }
    }

    let json = match serde_json::to_string(record) {
        Ok(j) => j,
        Err(e) => {
            eprintln!("vqa-eval: failed to serialize results record: {e}");
            return;
        }
    };

    let mut file = match OpenOptions::new().create(true).append(true).open(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("vqa-eval: failed to open results log: {e}");
            return;
        }
    };

    if let Err(e) = writeln!(file, "{json}") {
        eprintln!("vqa-eval: failed to write results record: {e}");
    }
}

fn truncate(text: &str) -> String {
    if text.len() <= MAX_LOGGED_TEXT_BYTES {
        return text.to_string();
    }
    let mut end = MAX_LOGGED_TEXT_BYTES;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Create a record from the outcome of one (strategy, sample) pair.
pub fn make_record(
    sample: &Sample,
    predicted: Option<&PredictedAnswer>,
    judge_reply: Option<JudgeReply>,
    verdict: &Verdict,
) -> SampleRecord {
    SampleRecord {
        ts: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        strategy: verdict.strategy,
        sample_id: sample.id,
        question: sample.question.clone(),
        ground_truth: sample.ground_truth_answer.clone(),
        predicted: predicted.map(|p| truncate(&p.text)),
        is_error: predicted.is_some_and(|p| p.is_error),
        judge_reply,
        correct: verdict.correct,
        status: verdict.status,
    }
}
