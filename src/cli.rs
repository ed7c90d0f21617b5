use clap::Parser as ClapParser;
use std::path::PathBuf;
use std::sync::Arc;

use vqa_eval::config::{self, EvalConfig};
use vqa_eval::dataset;
use vqa_eval::judge::JudgeScorer;
use vqa_eval::logger::{EventSink, StderrSink};
use vqa_eval::model::{device_lock, AnswerCapability, CommandModel, ModelError, Serialized};
use vqa_eval::orchestrator::Orchestrator;
use vqa_eval::strategy::Strategy;
use vqa_eval::types::StrategyKind;

const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-VL-3B-Instruct";

#[derive(ClapParser)]
#[command(
    name = "vqa-eval",
    version,
    about = "Evaluate VQA answering strategies with a model judge"
)]
struct Cli {
    /// Evaluation mode to run
    #[arg(long, value_enum)]
    mode: Mode,

    /// Path to the VQA dataset CSV file
    #[arg(long, value_name = "FILE", default_value = "data/vqa_dataset.csv")]
    data_csv: PathBuf,

    /// Directory containing the dataset images
    #[arg(long, value_name = "DIR", default_value = "data/images")]
    images_dir: PathBuf,

    /// Model identifier substituted for {model} in the backend command
    #[arg(long, value_name = "NAME", default_value = DEFAULT_MODEL)]
    model_name: String,

    /// Index of the sample to show in show-sample mode
    #[arg(long, value_name = "N", default_value_t = 0)]
    sample_index: usize,

    /// Path to config YAML file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Append one JSON line per evaluated sample to FILE
    #[arg(long, value_name = "FILE")]
    results_log: Option<PathBuf>,

    /// Write the full report as JSON to FILE
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print a per-sample verdict table after the report
    #[arg(long)]
    details: bool,

    /// Log progress messages to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum Mode {
    #[value(alias = "zero_shot")]
    ZeroShot,
    Classic,
    Dl,
    All,
    #[value(alias = "show_sample")]
    ShowSample,
}

impl Mode {
    fn strategies(self) -> Vec<StrategyKind> {
        match self {
            Mode::ZeroShot => vec![StrategyKind::ZeroShot],
            Mode::Classic => vec![StrategyKind::ClassicAgent],
            Mode::Dl => vec![StrategyKind::DlAgent],
            Mode::All => StrategyKind::ALL.to_vec(),
            Mode::ShowSample => Vec::new(),
        }
    }
}

/// Main entry point. Returns the process exit code.
pub fn run() -> i32 {
    yansi::whenever(yansi::Condition::TTY_AND_COLOR);

    let cli = Cli::parse();
    let sink = StderrSink::new(cli.results_log.clone(), cli.verbose);
    sink.info(&format!("starting in mode {:?}", cli.mode));

    let config = match config::load_config(cli.config.as_deref(), &sink) {
        Ok(c) => c,
        Err(e) => {
            sink.error(&e.to_string());
            return 2;
        }
    };
    if let Err(e) = config.validate() {
        sink.error(&e.to_string());
        return 2;
    }

    let dataset = match dataset::load(&cli.data_csv, &cli.images_dir) {
        Ok(d) => d,
        Err(e) => {
            sink.error(&format!("failed to load dataset: {e}. Exiting."));
            return 1;
        }
    };
    sink.info(&format!("loaded {} samples", dataset.len()));

    if cli.mode == Mode::ShowSample {
        return run_show_sample(&dataset, cli.sample_index, &sink);
    }

    let strategies: Vec<Strategy> = cli
        .mode
        .strategies()
        .into_iter()
        .map(|kind| Strategy::from_config(kind, &config))
        .collect();

    let (answer_model, judge_model) = match load_models(&config, &cli.model_name, &sink) {
        Ok(models) => models,
        Err(e) => {
            sink.error(&format!("failed to load models: {e}. Exiting."));
            return 2;
        }
    };

    let orchestrator = Orchestrator::new(
        answer_model.as_ref(),
        judge_model.as_ref(),
        JudgeScorer::new(config.model.judge_max_tokens),
        &sink,
    );
    let report = orchestrator.run_all(&strategies, &dataset);

    crate::output::print_report(&report);
    if cli.details && !report.is_empty() {
        println!("{}", crate::output::details_table(&report));
    }

    if let Some(path) = &cli.output {
        if let Err(e) = report.write_json(path) {
            sink.error(&format!("failed to write report {}: {e}", path.display()));
            return 1;
        }
    }

    0
}

/// Print one sample. Never touches a model.
fn run_show_sample(dataset: &dataset::Dataset, index: usize, sink: &dyn EventSink) -> i32 {
    match dataset.get(index) {
        Some(sample) => {
            println!("{}", dataset::describe(sample));
            0
        }
        None => {
            sink.error(&format!(
                "sample index {index} is out of range (dataset has {} samples)",
                dataset.len()
            ));
            1
        }
    }
}

type ModelPair = (Box<dyn AnswerCapability>, Box<dyn AnswerCapability>);

/// Load the answering and judging handles. Both must load or the run aborts.
fn load_models(
    config: &EvalConfig,
    model_name: &str,
    sink: &dyn EventSink,
) -> Result<ModelPair, ModelError> {
    sink.info("loading answering model");
    let answer = CommandModel::load(&config.model.command, model_name, &config.model)?;
    sink.info("loading judge model");
    let judge = CommandModel::load(config.judge_command(), model_name, &config.model)?;

    if config.model.shared_device {
        let lock = device_lock();
        return Ok((
            Box::new(Serialized::new(answer, Arc::clone(&lock))),
            Box::new(Serialized::new(judge, lock)),
        ));
    }
    Ok((Box::new(answer), Box::new(judge)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_mode() {
        assert!(Cli::try_parse_from(["vqa-eval"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["vqa-eval", "--mode", "few-shot"]).is_err());
    }

    #[test]
    fn test_cli_accepts_underscore_aliases() {
        let cli = Cli::try_parse_from(["vqa-eval", "--mode", "zero_shot"]).unwrap();
        assert_eq!(cli.mode, Mode::ZeroShot);
        let cli = Cli::try_parse_from(["vqa-eval", "--mode", "show_sample"]).unwrap();
        assert_eq!(cli.mode, Mode::ShowSample);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["vqa-eval", "--mode", "all"]).unwrap();
        assert_eq!(cli.data_csv, PathBuf::from("data/vqa_dataset.csv"));
        assert_eq!(cli.images_dir, PathBuf::from("data/images"));
        assert_eq!(cli.model_name, DEFAULT_MODEL);
        assert_eq!(cli.sample_index, 0);
    }

    #[test]
    fn test_mode_strategy_selection() {
        assert_eq!(Mode::All.strategies(), StrategyKind::ALL.to_vec());
        assert_eq!(Mode::Dl.strategies(), vec![StrategyKind::DlAgent]);
        assert!(Mode::ShowSample.strategies().is_empty());
    }
}
