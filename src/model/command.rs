use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::{AnswerCapability, InferenceError, ModelError};
use crate::config::ModelConfig;

/// A capability backed by an external generation command.
///
/// The prompt is passed as the final argument and the answer is read from
/// stdout, e.g. `llm -m <model> -a image.jpg -o max_tokens 128 "<prompt>"`.
#[derive(Debug, Clone)]
pub struct CommandModel {
    program: String,
    args: Vec<String>,
    image_flag: String,
    token_args: Vec<String>,
    timeout: Duration,
}

impl CommandModel {
    /// Resolve the backend command. `{model}` in the command is replaced by `model_name`.
    pub fn load(
        command: &str,
        model_name: &str,
        config: &ModelConfig,
    ) -> Result<Self, ModelError> {
        let parts: Vec<String> = command
            .replace("{model}", model_name)
            .split_whitespace()
            .map(String::from)
            .collect();
        let Some((program, args)) = parts.split_first() else {
            return Err(ModelError::EmptyCommand);
        };
        if resolve_executable(program).is_none() {
            return Err(ModelError::NotFound(program.clone()));
        }
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            image_flag: config.image_flag.clone(),
            token_args: config.token_args.clone(),
            timeout: Duration::from_secs(config.timeout),
        })
    }

    fn build_args(&self, prompt: &str, image: Option<&Path>, max_new_tokens: usize) -> Vec<String> {
        let mut args = self.args.clone();
        if let Some(path) = image {
            if !self.image_flag.is_empty() {
                args.push(self.image_flag.clone());
            }
            args.push(path.to_string_lossy().to_string());
        }
        let budget = max_new_tokens.to_string();
        args.extend(
            self.token_args
                .iter()
                .map(|a| a.replace("{max_tokens}", &budget)),
        );
        args.push(prompt.to_string());
        args
    }
}

/// Find `program` either as a path or on `PATH`.
fn resolve_executable(program: &str) -> Option<PathBuf> {
    if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
        let path = PathBuf::from(program);
        return path.is_file().then_some(path);
    }
    let search = std::env::var_os("PATH")?;
    std::env::split_paths(&search)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

fn check_image(path: &Path) -> Result<(), InferenceError> {
    File::open(path)
        .map(|_| ())
        .map_err(|e| InferenceError::ImageUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

impl AnswerCapability for CommandModel {
    fn infer(
        &self,
        prompt: &str,
        image: Option<&Path>,
        max_new_tokens: usize,
    ) -> Result<String, InferenceError> {
        if let Some(path) = image {
            check_image(path)?;
        }

        let args = self.build_args(prompt, image, max_new_tokens);
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                InferenceError::Unavailable(format!("failed to run {}: {e}", self.program))
            })?;

        // Drain both pipes while waiting so a chatty backend cannot block on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match wait_with_timeout(&mut child, self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(InferenceError::Generation(format!(
                    "timed out after {}s",
                    self.timeout.as_secs()
                )));
            }
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(InferenceError::Unavailable(format!(
                    "failed to wait for {}: {e}",
                    self.program
                )));
            }
        };

        let stdout = collect(stdout);
        if !status.success() {
            let stderr = collect(stderr);
            return Err(InferenceError::Generation(format!(
                "{} exited with {status}: {}",
                self.program,
                stderr.trim()
            )));
        }
        let text = stdout.trim().to_string();
        if text.is_empty() {
            return Err(InferenceError::Generation("empty output".to_string()));
        }
        Ok(text)
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Poll until the child exits. `Ok(None)` means the timeout elapsed first.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|buf| String::from_utf8_lossy(&buf).into_owned())
        .unwrap_or_default()
}
