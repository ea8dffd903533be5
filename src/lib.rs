//! IIoT Vibration Agent - windowed spectral features for vibration classification.
//!
//! This library turns a stream of 9-axis vibration samples (two
//! accelerometers and one gyroscope) into fixed-length feature vectors and
//! drives an external classifier over them, one window at a time.
//!
//! # Guarantees
//!
//! - **Fixed input width**: every feature vector has exactly
//!   `expected_feature_count` values, whatever the window holds
//! - **Single flight**: at most one classification runs per controller
//! - **No degenerate values**: constant or silent signals yield zeros, never NaN
//! - **Explicit configuration**: nothing defaults silently
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    IIoT Vibration Agent                       │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │   Ingest    │──▶│  Windowing  │──▶│  Features   │         │
//! │  │  (fusion)   │   │ (controller)│   │ (pipeline)  │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! │         │                 ▲                 │                │
//! │         ▼                 │                 ▼                │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐         │
//! │  │    Stats    │   │    Sink     │◀──│ Classifier  │         │
//! │  │             │   │  (status)   │   │ (runner)    │         │
//! │  └─────────────┘   └─────────────┘   └─────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use iiot_vibration_agent::{config::Config, core::WindowingController};
//!
//! let config = Config::load().expect("Failed to load config");
//! let mut controller = WindowingController::from_config(&config).expect("Invalid config");
//!
//! // Feed samples with controller.ingest(sample); a returned job carries
//! // the feature vector to classify.
//! ```

pub mod classifier;
pub mod config;
pub mod core;
pub mod ingest;
pub mod runtime;
pub mod sink;
pub mod stats;

// Re-export key types at crate root for convenience
pub use classifier::{ClassScores, Classifier, ClassifierError, ProcessClassifier};
pub use config::{Config, ConfigError, DspConfig, TopicConfig, WindowingConfig};
pub use core::{
    ClassificationJob, ClassificationResult, ControllerState, FeatureExtractor, FeatureVector,
    Sample, SampleWindow, SpectralFeaturePipeline, WindowingController,
};
pub use ingest::{IngestError, SensorFusion};
pub use runtime::{PipelineRuntime, RunSummary};
pub use sink::{JsonLinesSink, ResultSink, SinkError, StatusPayload};
pub use stats::{PipelineStats, SharedPipelineStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
