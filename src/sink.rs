//! Result publishing.
//!
//! Results leave the agent as status payloads of the form
//! `{label, confidence, timestamp, classifications}`, tagged with the status
//! topic they belong on.

use crate::classifier::{ClassScores, ClassifierError};
use crate::core::controller::ClassificationResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

/// Status payload for one classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusPayload {
    pub label: String,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
    pub classifications: ClassScores,
}

impl From<&ClassificationResult> for StatusPayload {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            label: result.label.clone(),
            confidence: result.confidence,
            timestamp: result.classified_at,
            classifications: result.all_scores.clone(),
        }
    }
}

/// A status payload addressed to a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub topic: String,
    pub payload: StatusPayload,
}

/// Receives classification results and failures.
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn publish(&self, result: &ClassificationResult) -> Result<(), SinkError>;

    /// Report a failed classification cycle.
    async fn report_error(&self, error: &ClassifierError) {
        tracing::warn!(error = %error, "Classification failed");
    }
}

/// Writes one [`StatusMessage`] per line.
pub struct JsonLinesSink {
    topic: String,
    writer: Mutex<Box<dyn AsyncWrite + Send + Unpin>>,
}

impl JsonLinesSink {
    pub fn new(topic: impl Into<String>, writer: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        Self {
            topic: topic.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Sink writing to stdout.
    pub fn stdout(topic: impl Into<String>) -> Self {
        Self::new(topic, Box::new(tokio::io::stdout()))
    }

    /// Sink appending to `path`, creating it if needed.
    pub async fn create(topic: impl Into<String>, path: &Path) -> Result<Self, SinkError> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Self::new(topic, Box::new(file)))
    }
}

#[async_trait]
impl ResultSink for JsonLinesSink {
    async fn publish(&self, result: &ClassificationResult) -> Result<(), SinkError> {
        let message = StatusMessage {
            topic: self.topic.clone(),
            payload: StatusPayload::from(result),
        };
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// Result publishing errors.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
