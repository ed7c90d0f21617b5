use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logger::EventSink;
use crate::strategy::prompt;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_norway::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvalConfig {
    #[serde(default)]
    pub model: ModelConfig,
    /// Separate backend for the judge. Defaults to the answering backend.
    #[serde(default)]
    pub judge: Option<JudgeBackendConfig>,
    #[serde(default)]
    pub agents: AgentsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default = "default_image_flag")]
    pub image_flag: String,
    #[serde(default = "default_token_args")]
    pub token_args: Vec<String>,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Both handles run on one device; serialize their calls.
    #[serde(default)]
    pub shared_device: bool,
    #[serde(default = "default_answer_max_tokens")]
    pub answer_max_tokens: usize,
    #[serde(default = "default_judge_max_tokens")]
    pub judge_max_tokens: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            image_flag: default_image_flag(),
            token_args: default_token_args(),
            timeout: default_timeout(),
            shared_device: false,
            answer_max_tokens: default_answer_max_tokens(),
            judge_max_tokens: default_judge_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JudgeBackendConfig {
    pub command: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AgentsConfig {
    #[serde(default)]
    pub classic: ClassicConfig,
    #[serde(default)]
    pub dl: DlConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassicConfig {
    #[serde(default = "default_classic_steps")]
    pub steps: Vec<StepConfig>,
}

impl Default for ClassicConfig {
    fn default() -> Self {
        Self {
            steps: default_classic_steps(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StepConfig {
    pub name: String,
    pub template: String,
    #[serde(default)]
    pub with_image: bool,
    #[serde(default = "default_step_max_tokens")]
    pub max_new_tokens: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DlConfig {
    #[serde(default = "default_dl_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_answer_max_tokens")]
    pub max_new_tokens: usize,
}

impl Default for DlConfig {
    fn default() -> Self {
        Self {
            max_steps: default_dl_max_steps(),
            max_new_tokens: default_answer_max_tokens(),
        }
    }
}

fn default_command() -> String {
    "llm -m {model}".to_string()
}

fn default_image_flag() -> String {
    "-a".to_string()
}

fn default_token_args() -> Vec<String> {
    vec!["-o".into(), "max_tokens".into(), "{max_tokens}".into()]
}

fn default_timeout() -> u64 {
    120
}

fn default_answer_max_tokens() -> usize {
    128
}

fn default_judge_max_tokens() -> usize {
    16
}

fn default_step_max_tokens() -> usize {
    256
}

fn default_dl_max_steps() -> usize {
    4
}

fn default_classic_steps() -> Vec<StepConfig> {
    vec![
        StepConfig {
            name: "perceive".into(),
            template: prompt::PERCEIVE_TEMPLATE.into(),
            with_image: true,
            max_new_tokens: 256,
        },
        StepConfig {
            name: "reason".into(),
            template: prompt::REASON_TEMPLATE.into(),
            with_image: false,
            max_new_tokens: 256,
        },
        StepConfig {
            name: "answer".into(),
            template: prompt::ANSWER_TEMPLATE.into(),
            with_image: false,
            max_new_tokens: default_answer_max_tokens(),
        },
    ]
}

impl EvalConfig {
    /// Check agent and budget settings. Runs before any model is loaded.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.answer_max_tokens == 0 || self.model.judge_max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "model token budgets must be greater than zero".into(),
            ));
        }

        let steps = &self.agents.classic.steps;
        if steps.is_empty() {
            return Err(ConfigError::Invalid(
                "agents.classic.steps must not be empty".into(),
            ));
        }
        for (i, step) in steps.iter().enumerate() {
            if !step.template.contains("{question}") {
                return Err(ConfigError::Invalid(format!(
                    "classic step '{}' template is missing {{question}}",
                    step.name
                )));
            }
            if i > 0 && !step.template.contains("{context}") {
                return Err(ConfigError::Invalid(format!(
                    "classic step '{}' template is missing {{context}}",
                    step.name
                )));
            }
            if step.max_new_tokens == 0 {
                return Err(ConfigError::Invalid(format!(
                    "classic step '{}' has a zero token budget",
                    step.name
                )));
            }
        }

        if self.agents.dl.max_steps == 0 {
            return Err(ConfigError::Invalid(
                "agents.dl.max_steps must be at least 1".into(),
            ));
        }
        if self.agents.dl.max_new_tokens == 0 {
            return Err(ConfigError::Invalid(
                "agents.dl.max_new_tokens must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Command used for the judge handle.
    pub fn judge_command(&self) -> &str {
        self.judge
            .as_ref()
            .map(|j| j.command.as_str())
            .unwrap_or(self.model.command.as_str())
    }
}

fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home)
        .join(".config")
        .join("vqa-eval")
        .join("config.yaml")
}

/// Load config with fallback: explicit path (must be valid) > default path > built-in defaults.
pub fn load_config(
    explicit_path: Option<&Path>,
    sink: &dyn EventSink,
) -> Result<EvalConfig, ConfigError> {
    if let Some(path) = explicit_path {
        return load_config_from_path(path);
    }

    let path = default_config_path();
    if !path.exists() {
        return Ok(EvalConfig::default());
    }
    match load_config_from_path(&path) {
        Ok(config) => Ok(config),
        Err(e) => {
            sink.warn(&format!("{e}; using defaults"));
            Ok(EvalConfig::default())
        }
    }
}

fn load_config_from_path(path: &Path) -> Result<EvalConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_norway::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
