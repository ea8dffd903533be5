//! Async driver around the windowing controller.
//!
//! One task owns the controller, so samples are ingested strictly in the
//! order they leave the queue. Classification runs on a spawned task under a
//! timeout; its outcome comes back through a completion channel while the
//! driver keeps buffering new samples.

use crate::classifier::{ClassScores, Classifier, ClassifierError};
use crate::core::controller::{ClassificationJob, ControllerState, WindowingController};
use crate::core::sample::Sample;
use crate::sink::ResultSink;
use crate::stats::SharedPipelineStats;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

type Completion = (Uuid, Result<ClassScores, ClassifierError>);

/// Totals for one call to [`PipelineRuntime::run`].
pub struct RunSummary {
    pub samples_ingested: u64,
    pub windows_classified: u64,
    pub classification_failures: u64,
    /// Controller as it stood when the input ended
    pub controller: WindowingController,
}

/// Feeds samples to a controller and drives its classifications.
pub struct PipelineRuntime {
    controller: WindowingController,
    classifier: Arc<dyn Classifier>,
    sink: Arc<dyn ResultSink>,
    stats: SharedPipelineStats,
    timeout: Duration,
    samples_ingested: u64,
    windows_classified: u64,
    classification_failures: u64,
}

impl PipelineRuntime {
    pub fn new(
        controller: WindowingController,
        classifier: Arc<dyn Classifier>,
        sink: Arc<dyn ResultSink>,
        stats: SharedPipelineStats,
        timeout: Duration,
    ) -> Self {
        Self {
            controller,
            classifier,
            sink,
            stats,
            timeout,
            samples_ingested: 0,
            windows_classified: 0,
            classification_failures: 0,
        }
    }

    /// Consume samples until the queue closes.
    ///
    /// A classification still in flight when the queue closes is awaited
    /// before returning.
    pub async fn run(mut self, mut samples: mpsc::Receiver<Sample>) -> RunSummary {
        let (done_tx, mut done_rx) = mpsc::channel::<Completion>(1);
        let mut input_open = true;

        tracing::info!(
            target_size = self.controller.target_size(),
            timeout_ms = self.timeout.as_millis() as u64,
            "Pipeline runtime started"
        );

        loop {
            tokio::select! {
                next = samples.recv(), if input_open => match next {
                    Some(sample) => self.ingest(sample, &done_tx),
                    None => {
                        tracing::debug!("Sample queue closed");
                        input_open = false;
                    }
                },
                Some((window_id, outcome)) = done_rx.recv() => {
                    self.finish(window_id, outcome).await;
                }
                else => break,
            }

            if !input_open && self.controller.state() == ControllerState::Idle {
                break;
            }
        }

        tracing::info!(
            samples = self.samples_ingested,
            classified = self.windows_classified,
            failures = self.classification_failures,
            "Pipeline runtime stopped"
        );

        RunSummary {
            samples_ingested: self.samples_ingested,
            windows_classified: self.windows_classified,
            classification_failures: self.classification_failures,
            controller: self.controller,
        }
    }

    fn ingest(&mut self, sample: Sample, done: &mpsc::Sender<Completion>) {
        self.samples_ingested += 1;
        self.stats.record_sample_ingested();

        if let Some(job) = self.controller.ingest(sample) {
            self.spawn_classification(job, done.clone());
        }
    }

    fn spawn_classification(&self, job: ClassificationJob, done: mpsc::Sender<Completion>) {
        tracing::debug!(
            window_id = %job.window_id,
            samples = job.sample_count,
            features = job.features.len(),
            "Starting classification"
        );

        let classifier = Arc::clone(&self.classifier);
        let timeout = self.timeout;

        tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, classifier.classify(&job.features)).await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ClassifierError::Timeout(timeout)),
            };
            // The driver only drops the receiver after this window completes
            let _ = done.send((job.window_id, outcome)).await;
        });
    }

    async fn finish(&mut self, window_id: Uuid, outcome: Result<ClassScores, ClassifierError>) {
        match self.controller.complete(window_id, outcome) {
            Ok(result) => {
                self.windows_classified += 1;
                self.stats.record_window_classified();
                tracing::info!(
                    label = %result.label,
                    confidence = result.confidence,
                    buffered = self.controller.window().len(),
                    "Window classified"
                );

                match self.sink.publish(&result).await {
                    Ok(()) => self.stats.record_result_published(),
                    Err(e) => tracing::warn!(error = %e, "Failed to publish result"),
                }
            }
            Err(ClassifierError::Stale(id)) => {
                tracing::warn!(window_id = %id, "Ignoring stale classification");
            }
            Err(e) => {
                self.classification_failures += 1;
                self.stats.record_classification_failure();
                self.sink.report_error(&e).await;
            }
        }
    }
}
