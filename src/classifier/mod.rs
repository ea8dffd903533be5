//! Classifier capability.
//!
//! The agent is agnostic to how a feature vector gets classified: an
//! embedded runtime, a subprocess or a remote call all sit behind
//! [`Classifier`].

pub mod process;

pub use process::{parse_runner_output, ProcessClassifier};

use crate::core::pipeline::FeatureVector;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Label → score, as reported by the model.
pub type ClassScores = BTreeMap<String, f64>;

/// Classifies one feature vector.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, features: &FeatureVector) -> Result<ClassScores, ClassifierError>;
}

/// Reasons a classification attempt produced no result.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("Failed to spawn classifier '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Classifier I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode classifier input: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Classifier exited with {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("No classification found in classifier output")]
    MalformedOutput,

    #[error("Classifier returned no scores")]
    EmptyScores,

    #[error("Classification timed out after {0:?}")]
    Timeout(Duration),

    #[error("Completion for window {0} does not match the classification in flight")]
    Stale(Uuid),

    #[error("{0}")]
    Other(String),
}
