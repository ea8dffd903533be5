//! Subprocess classifier.
//!
//! Runs an external model runner once per window. The runner receives one
//! JSON line on stdin and is expected to print a line such as
//! `{"result": {"classification": {"normal": 0.9, "fault": 0.1}}}` among any
//! other output.

use super::{ClassScores, Classifier, ClassifierError};
use crate::core::pipeline::FeatureVector;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Serialize)]
struct RunnerInput<'a> {
    id: i64,
    values: &'a [f64],
}

#[derive(Deserialize)]
struct RunnerOutput {
    result: Option<serde_json::Value>,
}

/// Scores from the first line of runner stdout that carries a `result`.
///
/// That line must hold a `result.classification` map; later lines are not
/// consulted.
pub fn parse_runner_output(stdout: &str) -> Result<ClassScores, ClassifierError> {
    let result = stdout
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('{'))
        .find_map(|line| {
            serde_json::from_str::<RunnerOutput>(line)
                .ok()
                .and_then(|output| output.result)
                .filter(|result| !result.is_null())
        })
        .ok_or(ClassifierError::MalformedOutput)?;

    result
        .get("classification")
        .cloned()
        .and_then(|classification| serde_json::from_value(classification).ok())
        .ok_or(ClassifierError::MalformedOutput)
}

/// Spawns `program args...` for every classification.
#[derive(Debug, Clone)]
pub struct ProcessClassifier {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessClassifier {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

#[async_trait]
impl Classifier for ProcessClassifier {
    async fn classify(&self, features: &FeatureVector) -> Result<ClassScores, ClassifierError> {
        let mut input = serde_json::to_vec(&RunnerInput {
            id: Utc::now().timestamp_millis(),
            values: features.as_slice(),
        })?;
        input.push(b'\n');

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ClassifierError::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        // Feed stdin while draining stdout and stderr so neither pipe can stall the other
        let stdin = child.stdin.take();
        let write_input = async move {
            if let Some(mut stdin) = stdin {
                // A runner that exits without reading is judged by its exit status
                if let Err(e) = stdin.write_all(&input).await {
                    tracing::debug!(error = %e, "Classifier closed stdin early");
                }
            }
        };
        let ((), output) = tokio::join!(write_input, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            return Err(ClassifierError::Exit {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_runner_output(&String::from_utf8_lossy(&output.stdout))
    }
}
