//! Core signal processing for the vibration agent.
//!
//! This module contains:
//! - Nine-channel samples and the bounded sample window
//! - Per-axis time, frequency and statistical feature extraction
//! - Multi-axis feature vector assembly
//! - The single-flight windowing controller

pub mod controller;
pub mod features;
pub mod pipeline;
pub mod sample;
pub mod window;

// Re-export commonly used types
pub use controller::{
    ClassificationJob, ClassificationResult, ControllerState, WindowingController,
};
pub use features::{AxisFeatures, FeatureExtractor, FEATURES_PER_AXIS};
pub use pipeline::{FeatureVector, SpectralFeaturePipeline};
pub use sample::{Axis, Sample, CHANNEL_COUNT};
pub use window::SampleWindow;
