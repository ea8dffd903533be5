//! Window readiness and single-flight classification state.
//!
//! The controller owns the sample buffer and decides when a window is handed
//! to the classifier:
//!
//! ```text
//!            ingest (window ready)
//!   ┌──────┐ ─────────────────────▶ ┌──────┐
//!   │ Idle │                        │ Busy │ ◀── ingest: append only
//!   └──────┘ ◀───────────────────── └──────┘
//!        complete: success → keep last target/2 samples
//!                  failure → keep buffer as is
//! ```
//!
//! The controller is synchronous and never awaits; the caller runs the
//! classifier for the returned [`ClassificationJob`] and reports back through
//! [`WindowingController::complete`].

use crate::classifier::{ClassScores, ClassifierError};
use crate::config::{Config, ConfigError, WindowingConfig};
use crate::core::pipeline::{FeatureVector, SpectralFeaturePipeline};
use crate::core::sample::{flatten, Sample, CHANNEL_COUNT};
use crate::core::window::SampleWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether a classification is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Idle,
    Busy,
}

/// A window handed off for classification.
#[derive(Debug, Clone)]
pub struct ClassificationJob {
    /// Correlates the job with its completion
    pub window_id: Uuid,
    pub features: FeatureVector,
    /// Samples that went into the window
    pub sample_count: usize,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

/// Outcome of one successful classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub window_id: Uuid,
    /// Highest-scoring label
    pub label: String,
    /// Score of `label`
    pub confidence: f64,
    /// Every label reported by the classifier
    pub all_scores: ClassScores,
    pub window_end: DateTime<Utc>,
    pub classified_at: DateTime<Utc>,
}

impl ClassificationResult {
    /// Pick the top label from a score map.
    ///
    /// Ties go to the label that sorts first. Returns `None` for an empty map.
    pub fn from_scores(
        window_id: Uuid,
        scores: ClassScores,
        window_end: DateTime<Utc>,
    ) -> Option<Self> {
        let (label, confidence) = scores
            .iter()
            .fold(None::<(&String, f64)>, |best, (label, &score)| match best {
                Some((_, best_score)) if best_score >= score => best,
                _ => Some((label, score)),
            })
            .map(|(label, score)| (label.clone(), score))?;

        Some(Self {
            window_id,
            label,
            confidence,
            all_scores: scores,
            window_end,
            classified_at: Utc::now(),
        })
    }
}

/// Buffers samples and gates classification to one window at a time.
pub struct WindowingController {
    window: SampleWindow,
    pipeline: SpectralFeaturePipeline,
    target_size: usize,
    state: ControllerState,
    /// Window currently being classified
    in_flight: Option<(Uuid, DateTime<Utc>)>,
}

impl WindowingController {
    /// Create a controller around a pipeline.
    ///
    /// Samples carry exactly nine channels, so the pipeline must be configured
    /// for nine axes.
    pub fn new(
        pipeline: SpectralFeaturePipeline,
        windowing: &WindowingConfig,
    ) -> Result<Self, ConfigError> {
        windowing.validate()?;
        if pipeline.config().axis_count != CHANNEL_COUNT {
            return Err(ConfigError::invalid(
                "dsp.axis_count",
                format!(
                    "must be {CHANNEL_COUNT} for 9-axis samples, got {}",
                    pipeline.config().axis_count
                ),
            ));
        }

        Ok(Self {
            window: SampleWindow::new(windowing.target_size),
            pipeline,
            target_size: windowing.target_size,
            state: ControllerState::Idle,
            in_flight: None,
        })
    }

    /// Build the pipeline and controller from a full configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let pipeline = SpectralFeaturePipeline::new(config.dsp.clone())?;
        Self::new(pipeline, &config.windowing)
    }

    /// Append a sample and, when idle with a full window, start a classification.
    pub fn ingest(&mut self, sample: Sample) -> Option<ClassificationJob> {
        let dropped = self.window.append(sample);
        if dropped > 0 {
            tracing::debug!(
                dropped,
                buffered = self.window.len(),
                "Sample buffer hit its ceiling"
            );
        }

        if self.state == ControllerState::Busy || !self.window.is_ready(self.target_size) {
            return None;
        }

        let samples = self.window.last_n(self.target_size);
        let (window_start, window_end) = match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => (first.timestamp, last.timestamp),
            _ => return None,
        };

        let features = self.pipeline.extract(&flatten(&samples));
        let window_id = Uuid::new_v4();

        self.state = ControllerState::Busy;
        self.in_flight = Some((window_id, window_end));

        Some(ClassificationJob {
            window_id,
            features,
            sample_count: samples.len(),
            window_start,
            window_end,
        })
    }

    /// Finish the in-flight classification.
    ///
    /// On success the buffer keeps its most recent `target_size / 2` samples
    /// and the result is returned. On failure, or when the scores are empty,
    /// the buffer is left untouched. Either way the controller returns to
    /// [`ControllerState::Idle`]. A completion for any other window is
    /// rejected as stale and changes nothing.
    pub fn complete(
        &mut self,
        window_id: Uuid,
        outcome: Result<ClassScores, ClassifierError>,
    ) -> Result<ClassificationResult, ClassifierError> {
        let window_end = match self.in_flight {
            Some((id, end)) if id == window_id => end,
            _ => return Err(ClassifierError::Stale(window_id)),
        };

        self.in_flight = None;
        self.state = ControllerState::Idle;

        let scores = outcome?;
        let result = ClassificationResult::from_scores(window_id, scores, window_end)
            .ok_or(ClassifierError::EmptyScores)?;

        self.window.retain_last(self.retained_after_classification());
        Ok(result)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    /// Samples kept after a successful classification.
    pub fn retained_after_classification(&self) -> usize {
        self.target_size / 2
    }

    pub fn window(&self) -> &SampleWindow {
        &self.window
    }

    pub fn pipeline(&self) -> &SpectralFeaturePipeline {
        &self.pipeline
    }
}
