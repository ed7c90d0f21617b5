use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::Sample;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read dataset {}: {source}", path.display())]
    Csv { path: PathBuf, source: csv::Error },
    #[error("dataset {} is missing required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: &'static str },
}

/// A CSV row. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct Row {
    #[serde(alias = "image_path", alias = "image_name", alias = "image_id", alias = "image_file")]
    image: String,
    question: String,
    #[serde(alias = "ground_truth")]
    answer: String,
}

const IMAGE_COLUMNS: &[&str] = &["image", "image_path", "image_name", "image_id", "image_file"];
const ANSWER_COLUMNS: &[&str] = &["answer", "ground_truth"];

/// Ordered, read-only samples. Sample ids are their positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    samples: Vec<Sample>,
}

impl Dataset {
    /// Build from `(question, image, ground truth)` rows, numbering them in order.
    pub fn from_rows<I, Q, P, A>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Q, P, A)>,
        Q: Into<String>,
        P: Into<PathBuf>,
        A: Into<String>,
    {
        let samples = rows
            .into_iter()
            .enumerate()
            .map(|(id, (question, image, answer))| Sample {
                id,
                question: question.into(),
                image_reference: image.into(),
                ground_truth_answer: answer.into(),
            })
            .collect();
        Self { samples }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn has_column(headers: &csv::StringRecord, names: &[&str]) -> bool {
    headers.iter().any(|h| names.contains(&h.trim()))
}

/// Load a dataset from a CSV file with `image`, `question` and `answer` columns.
///
/// Image paths are resolved against `images_dir` but not checked; a missing
/// image is a per-sample problem, not a load failure.
pub fn load(csv_path: &Path, images_dir: &Path) -> Result<Dataset, DatasetError> {
    if !csv_path.is_file() {
        return Err(DatasetError::NotFound(csv_path.to_path_buf()));
    }
    let csv_err = |source| DatasetError::Csv {
        path: csv_path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(csv_path)
        .map_err(csv_err)?;

    let headers = reader.headers().map_err(csv_err)?.clone();
    for (column, names) in [
        ("image", IMAGE_COLUMNS),
        ("question", &["question"][..]),
        ("answer", ANSWER_COLUMNS),
    ] {
        if !has_column(&headers, names) {
            return Err(DatasetError::MissingColumn {
                path: csv_path.to_path_buf(),
                column,
            });
        }
    }

    let rows = reader
        .deserialize::<Row>()
        .map(|row| row.map(|r| (r.question, images_dir.join(r.image), r.answer)))
        .collect::<Result<Vec<_>, _>>()
        .map_err(csv_err)?;

    Ok(Dataset::from_rows(rows))
}

/// Human-readable view of one sample for inspection.
pub fn describe(sample: &Sample) -> String {
    let image_state = if sample.image_reference.is_file() {
        "found"
    } else {
        "missing"
    };
    format!(
        "Sample {}\n  Question:     {}\n  Ground truth: {}\n  Image:        {} ({image_state})",
        sample.id,
        sample.question,
        sample.ground_truth_answer,
        sample.image_reference.display()
    )
}
