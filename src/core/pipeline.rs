//! Multi-axis feature vector assembly.
//!
//! The pipeline turns one flat, interleaved window of raw values into a
//! feature vector of exactly `expected_feature_count` values. Short or
//! malformed windows are never an error: every length mismatch is resolved
//! with zero padding or truncation so the classifier input contract holds.

use crate::config::{ConfigError, DspConfig};
use crate::core::features::{AxisFeatures, FeatureExtractor, FEATURES_PER_AXIS};
use serde::{Deserialize, Serialize};

/// Fixed-length classifier input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }

    /// The 33-value block belonging to the axis at `axis_index`, clipped to
    /// the vector length.
    pub fn axis_block(&self, axis_index: usize) -> &[f64] {
        let start = (axis_index * FEATURES_PER_AXIS).min(self.0.len());
        let end = (start + FEATURES_PER_AXIS).min(self.0.len());
        &self.0[start..end]
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(values: Vec<f64>) -> Self {
        Self(values)
    }
}

/// Copy `series` into a vector of exactly `len` values, keeping the first
/// `min(series.len(), len)` values and zero-filling the rest.
pub fn pad_or_truncate(series: &[f64], len: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(len);
    out.extend(series.iter().take(len).copied());
    out.resize(len, 0.0);
    out
}

/// Split a flat interleaved array into `axis_count` per-axis series.
///
/// A trailing partial time-step contributes only to the axes it covers.
pub fn deinterleave(flat: &[f64], axis_count: usize) -> Vec<Vec<f64>> {
    let mut axes = vec![Vec::with_capacity(flat.len() / axis_count.max(1) + 1); axis_count];
    if axis_count == 0 {
        return axes;
    }
    for step in flat.chunks(axis_count) {
        for (axis, &value) in axes.iter_mut().zip(step) {
            axis.push(value);
        }
    }
    axes
}

/// Runs the per-axis extractor over a whole window.
pub struct SpectralFeaturePipeline {
    config: DspConfig,
    extractor: FeatureExtractor,
}

impl SpectralFeaturePipeline {
    /// Build a pipeline from a validated DSP configuration.
    pub fn new(config: DspConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let derived = config.derived_feature_count();
        if derived != config.expected_feature_count {
            tracing::warn!(
                derived,
                expected = config.expected_feature_count,
                "Feature count differs from model input; vector will be padded or truncated"
            );
        }

        let extractor = FeatureExtractor::new(config.sample_rate, config.fft_length);
        Ok(Self { config, extractor })
    }

    pub fn config(&self) -> &DspConfig {
        &self.config
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Features for each axis, in axis order.
    pub fn extract_axes(&self, flat: &[f64]) -> Vec<AxisFeatures> {
        deinterleave(flat, self.config.axis_count)
            .iter()
            .map(|series| {
                let framed = pad_or_truncate(series, self.config.frame_length);
                self.extractor.extract(&framed)
            })
            .collect()
    }

    /// Feature vector of exactly `expected_feature_count` values.
    pub fn extract(&self, flat: &[f64]) -> FeatureVector {
        let mut features = Vec::with_capacity(
            self.config
                .expected_feature_count
                .max(self.config.derived_feature_count()),
        );
        for axis in self.extract_axes(flat) {
            axis.extend_into(&mut features);
        }
        features.resize(self.config.expected_feature_count, 0.0);
        FeatureVector(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::features::TIME_DOMAIN_FEATURES;

    fn dsp(frame_length: usize, fft_length: usize, expected: usize) -> DspConfig {
        DspConfig {
            sample_rate: 10.0,
            frame_length,
            fft_length,
            axis_count: 9,
            expected_feature_count: expected,
        }
    }

    #[test]
    fn test_pad_or_truncate_lengths() {
        for len in [0usize, 1, 5, 16, 40] {
            let series: Vec<f64> = (1..=len).map(|v| v as f64).collect();
            let out = pad_or_truncate(&series, 16);

            assert_eq!(out.len(), 16);
            let kept = len.min(16);
            assert_eq!(&out[..kept], &series[..kept]);
            assert!(out[kept..].iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn test_deinterleave_preserves_time_order() {
        let flat: Vec<f64> = (0..27).map(|v| v as f64).collect();
        let axes = deinterleave(&flat, 9);

        assert_eq!(axes.len(), 9);
        assert_eq!(axes[0], vec![0.0, 9.0, 18.0]);
        assert_eq!(axes[8], vec![8.0, 17.0, 26.0]);
    }

    #[test]
    fn test_deinterleave_partial_step() {
        let flat: Vec<f64> = (0..11).map(|v| v as f64).collect();
        let axes = deinterleave(&flat, 9);

        assert_eq!(axes[0], vec![0.0, 9.0]);
        assert_eq!(axes[1], vec![1.0, 10.0]);
        assert_eq!(axes[2], vec![2.0]);
    }

    #[test]
    fn test_extract_length_is_exact() {
        let cases = [(16, 16, 297), (16, 16, 100), (16, 16, 9729)];
        for (frame, fft, expected) in cases {
            let pipeline = SpectralFeaturePipeline::new(dsp(frame, fft, expected)).unwrap();
            for input_len in [0usize, 1, 9, 50, 9 * 16, 9 * 40 + 3] {
                let flat: Vec<f64> = (0..input_len).map(|v| (v as f64).sin()).collect();
                assert_eq!(pipeline.extract(&flat).len(), expected);
            }
        }
    }

    #[test]
    fn test_extract_is_deterministic() {
        let pipeline = SpectralFeaturePipeline::new(dsp(32, 32, 297)).unwrap();
        let flat: Vec<f64> = (0..9 * 32).map(|v| (v as f64 * 0.11).cos()).collect();

        let first = pipeline.extract(&flat);
        let second = pipeline.extract(&flat);
        assert_eq!(first, second);
    }

    #[test]
    fn test_padding_zeros_trail_feature_blocks() {
        let pipeline = SpectralFeaturePipeline::new(dsp(8, 8, 400)).unwrap();
        let flat = vec![1.0; 9 * 8];
        let vector = pipeline.extract(&flat);

        assert_eq!(vector.len(), 400);
        assert!(vector.as_slice()[297..].iter().all(|&v| v == 0.0));
        // Constant 1.0 axis: mean lands first in each block
        assert_eq!(vector.axis_block(4)[0], 1.0);
    }

    #[test]
    fn test_axis_order_in_vector() {
        let pipeline = SpectralFeaturePipeline::new(dsp(4, 8, 297)).unwrap();
        // Each axis holds its own constant value
        let flat: Vec<f64> = (0..4)
            .flat_map(|_| (0..9).map(|axis| axis as f64))
            .collect();
        let vector = pipeline.extract(&flat);

        for axis in 0..9 {
            let block = vector.axis_block(axis);
            assert_eq!(block.len(), FEATURES_PER_AXIS);
            assert_eq!(block[0], axis as f64, "mean of axis {axis}");
            assert_eq!(block[TIME_DOMAIN_FEATURES - 1], 0.0, "skewness of axis {axis}");
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(SpectralFeaturePipeline::new(dsp(16, 12, 297)).is_err());
        assert!(SpectralFeaturePipeline::new(dsp(0, 16, 297)).is_err());
    }
}
