//! The answer capability: a black box that turns a prompt (and optionally an
//! image) into generated text.
//!
//! Two independent handles are used per run, one to answer and one to judge.

mod command;
mod shared;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use command::CommandModel;
pub use shared::{device_lock, Serialized};

/// Why a single capability call produced no text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    #[error("could not read image {}: {reason}", path.display())]
    ImageUnreadable { path: PathBuf, reason: String },
    #[error("generation failed: {0}")]
    Generation(String),
    /// The backend itself is unusable. Everything else is a per-sample problem.
    #[error("model unavailable: {0}")]
    Unavailable(String),
}

impl InferenceError {
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, InferenceError::Unavailable(_))
    }
}

/// Model-loading failure. Fatal: the run aborts before any sample is processed.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model command is empty")]
    EmptyCommand,
    #[error("model executable not found: {0}")]
    NotFound(String),
}

pub trait AnswerCapability {
    fn infer(
        &self,
        prompt: &str,
        image: Option<&Path>,
        max_new_tokens: usize,
    ) -> Result<String, InferenceError>;
}

impl<T: AnswerCapability + ?Sized> AnswerCapability for Box<T> {
    fn infer(
        &self,
        prompt: &str,
        image: Option<&Path>,
        max_new_tokens: usize,
    ) -> Result<String, InferenceError> {
        (**self).infer(prompt, image, max_new_tokens)
    }
}

impl<T: AnswerCapability + ?Sized> AnswerCapability for &T {
    fn infer(
        &self,
        prompt: &str,
        image: Option<&Path>,
        max_new_tokens: usize,
    ) -> Result<String, InferenceError> {
        (**self).infer(prompt, image, max_new_tokens)
    }
}
