//! Shared test harness for vqa-eval integration tests.
//!
//! `TestEnv` builds an isolated HOME with a dataset, image files and fake
//! model backends (shell scripts) that append to a call log on every
//! invocation, so tests can assert how often each model was used.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

// ---------------------------------------------------------------------------
// RunResult
// ---------------------------------------------------------------------------

/// Captures exit code, stdout, and stderr from a vqa-eval invocation.
pub struct RunResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    /// Assert that stdout contains `substring`.
    pub fn assert_stdout_contains(&self, substring: &str) {
        assert!(
            self.stdout.contains(substring),
            "Expected stdout to contain '{}'\nstdout: {}\nstderr: {}",
            substring,
            self.stdout,
            self.stderr
        );
    }

    pub fn assert_exit(&self, expected: i32) {
        assert_eq!(
            self.exit_code, expected,
            "Unexpected exit code\nstdout: {}\nstderr: {}",
            self.stdout, self.stderr
        );
    }
}

// ---------------------------------------------------------------------------
// Fake model backends
// ---------------------------------------------------------------------------

/// Answers "cat" for picture 1, "dog" for picture 2, "bird" otherwise.
const ANSWER_SCRIPT: &str = r#"#!/bin/sh
for last; do :; done
echo answer >> "{calls}"
case "$last" in
  *"picture 1"*) echo "cat" ;;
  *"picture 2"*) echo "dog" ;;
  *) echo "bird" ;;
esac
"#;

/// Affirms only when the candidate equals the reference answer.
const JUDGE_SCRIPT: &str = r#"#!/bin/sh
for last; do :; done
echo judge >> "{calls}"
ref=$(printf '%s\n' "$last" | sed -n 's/^Reference answer: //p')
cand=$(printf '%s\n' "$last" | sed -n 's/^Candidate answer: //p')
if [ "$ref" = "$cand" ]; then echo "YES"; else echo "NO"; fi
"#;

/// Answers once, then removes itself so later calls cannot spawn.
const VANISHING_SCRIPT: &str = r#"#!/bin/sh
echo answer >> "{calls}"
rm -f "$0"
echo "cat"
"#;

fn write_executable(path: &Path, contents: &str, executable: bool) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, contents).unwrap();
    std::fs::File::open(path).unwrap().sync_all().unwrap();
    let mut perms = std::fs::metadata(path).unwrap().permissions();
    perms.set_mode(if executable { 0o755 } else { 0o644 });
    std::fs::set_permissions(path, perms).unwrap();
}

/// Which answering backend the environment uses.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum AnswerBackend {
    Scripted,
    Vanishing,
    NotExecutable,
    Missing,
}

// ---------------------------------------------------------------------------
// TestEnv builder
// ---------------------------------------------------------------------------

pub struct TestEnvBuilder {
    rows: Vec<(String, String, String)>,
    missing_images: Vec<String>,
    backend: AnswerBackend,
    shared_device: bool,
    extra_config: String,
}

/// An isolated environment. Temp directories are cleaned up on drop.
pub struct TestEnv {
    root: tempfile::TempDir,
}

impl TestEnv {
    /// Start building a new test environment with the default 3-sample dataset:
    /// samples 1 and 2 are answered correctly, sample 3 is not.
    pub fn new() -> TestEnvBuilder {
        TestEnvBuilder {
            rows: vec![
                ("p1.jpg".into(), "What animal is in picture 1?".into(), "cat".into()),
                ("p2.jpg".into(), "What animal is in picture 2?".into(), "dog".into()),
                ("p3.jpg".into(), "What animal is in picture 3?".into(), "horse".into()),
            ],
            missing_images: Vec::new(),
            backend: AnswerBackend::Scripted,
            shared_device: false,
            extra_config: String::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn csv_path(&self) -> PathBuf {
        self.root().join("vqa.csv")
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root().join("images")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.yaml")
    }

    fn calls_path(&self) -> PathBuf {
        self.root().join("calls.log")
    }

    /// Number of times the answering backend was invoked.
    pub fn answer_calls(&self) -> usize {
        self.count_calls("answer")
    }

    /// Number of times the judge backend was invoked.
    pub fn judge_calls(&self) -> usize {
        self.count_calls("judge")
    }

    fn count_calls(&self, who: &str) -> usize {
        std::fs::read_to_string(self.calls_path())
            .map(|s| s.lines().filter(|l| *l == who).count())
            .unwrap_or(0)
    }

    /// Run vqa-eval with the environment's dataset and config plus `args`.
    pub fn run(&self, args: &[&str]) -> RunResult {
        let csv = self.csv_path().to_string_lossy().to_string();
        let images = self.images_dir().to_string_lossy().to_string();
        let config = self.config_path().to_string_lossy().to_string();
        let mut full_args = vec![
            "--data-csv",
            &csv,
            "--images-dir",
            &images,
            "--config",
            &config,
        ];
        full_args.extend_from_slice(args);
        self.run_raw(&full_args)
    }

    /// Run vqa-eval with exactly `args` and this environment's HOME.
    pub fn run_raw(&self, args: &[&str]) -> RunResult {
        let output = Command::new(vqa_eval_bin())
            .args(args)
            .env("HOME", self.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .expect("Failed to spawn vqa-eval");
        RunResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

impl TestEnvBuilder {
    /// Replace the dataset rows: (image, question, answer).
    pub fn with_rows(mut self, rows: &[(&str, &str, &str)]) -> Self {
        self.rows = rows
            .iter()
            .map(|(i, q, a)| (i.to_string(), q.to_string(), a.to_string()))
            .collect();
        self
    }

    /// Leave this image file out of the images directory.
    pub fn without_image(mut self, image: &str) -> Self {
        self.missing_images.push(image.to_string());
        self
    }

    pub fn with_backend(mut self, backend: AnswerBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Run both model handles behind one device lock.
    pub fn with_shared_device(mut self) -> Self {
        self.shared_device = true;
        self
    }

    /// Extra YAML appended to the generated config.
    pub fn with_config(mut self, yaml: &str) -> Self {
        self.extra_config = yaml.to_string();
        self
    }

    pub fn build(self) -> TestEnv {
        let root = tempfile::TempDir::new().expect("Failed to create temp dir");
        let env = TestEnv { root };

        let mut csv = String::from("image,question,answer\n");
        for (image, question, answer) in &self.rows {
            csv.push_str(&format!("{image},{question},{answer}\n"));
        }
        std::fs::write(env.csv_path(), csv).unwrap();

        std::fs::create_dir_all(env.images_dir()).unwrap();
        for (image, _, _) in &self.rows {
            if !self.missing_images.contains(image) {
                std::fs::write(env.images_dir().join(image), b"\x89PNG fake").unwrap();
            }
        }

        let calls = env.calls_path().to_string_lossy().to_string();
        let answer_path = env.root().join("answer.sh");
        let judge_path = env.root().join("judge.sh");
        match self.backend {
            AnswerBackend::Scripted => {
                write_executable(&answer_path, &ANSWER_SCRIPT.replace("{calls}", &calls), true)
            }
            AnswerBackend::Vanishing => write_executable(
                &answer_path,
                &VANISHING_SCRIPT.replace("{calls}", &calls),
                true,
            ),
            AnswerBackend::NotExecutable => {
                write_executable(&answer_path, &ANSWER_SCRIPT.replace("{calls}", &calls), false)
            }
            AnswerBackend::Missing => {}
        }
        write_executable(&judge_path, &JUDGE_SCRIPT.replace("{calls}", &calls), true);

        let config = format!(
            "model:\n  command: {}\n  image_flag: --image\n  token_args: []\n  timeout: 10\n  shared_device: {}\njudge:\n  command: {}\n{}",
            answer_path.display(),
            self.shared_device,
            judge_path.display(),
            self.extra_config
        );
        std::fs::write(env.config_path(), config).unwrap();

        env
    }
}

/// Path to the compiled vqa-eval binary.
pub fn vqa_eval_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_vqa-eval"))
}
