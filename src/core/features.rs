//! Feature computation for a single axis series.
//!
//! Each axis yields 33 features in a fixed order that forms the input schema
//! of the downstream classifier:
//!
//! | Group       | Count | Features                                                        |
//! |-------------|-------|-----------------------------------------------------------------|
//! | Time domain | 8     | mean, rms, std, min, max, peak-to-peak, excess kurtosis, skewness |
//! | Frequency   | 22    | centroid, energy, entropy, dominant frequency, top 10 magnitudes, 8 band powers |
//! | Statistical | 3     | zero-crossing rate, mean absolute deviation, interquartile range |
//!
//! All functions are pure: the input series is never mutated.

use crate::core::pipeline::pad_or_truncate;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::sync::Arc;

/// Number of time-domain features per axis.
pub const TIME_DOMAIN_FEATURES: usize = 8;

/// Number of largest spectral magnitudes reported.
pub const TOP_MAGNITUDES: usize = 10;

/// Number of equal-width frequency bands.
pub const FREQUENCY_BANDS: usize = 8;

/// Number of frequency-domain features per axis.
pub const FREQUENCY_FEATURES: usize = 4 + TOP_MAGNITUDES + FREQUENCY_BANDS;

/// Number of statistical features per axis.
pub const STATISTICAL_FEATURES: usize = 3;

/// Total features per axis.
pub const FEATURES_PER_AXIS: usize = TIME_DOMAIN_FEATURES + FREQUENCY_FEATURES + STATISTICAL_FEATURES;

/// Amplitude summary of the raw series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeDomainFeatures {
    pub mean: f64,
    /// Root mean square
    pub rms: f64,
    /// Population standard deviation (divides by N)
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
    /// Fourth standardized moment minus 3 (0 for a constant series)
    pub kurtosis: f64,
    /// Third standardized moment (0 for a constant series)
    pub skewness: f64,
}

impl TimeDomainFeatures {
    pub fn to_array(&self) -> [f64; TIME_DOMAIN_FEATURES] {
        [
            self.mean,
            self.rms,
            self.std_dev,
            self.min,
            self.max,
            self.peak_to_peak,
            self.kurtosis,
            self.skewness,
        ]
    }
}

/// Summary of the one-sided magnitude spectrum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrequencyFeatures {
    /// Magnitude-weighted mean bin index
    pub spectral_centroid: f64,
    /// Sum of squared magnitudes
    pub spectral_energy: f64,
    /// Shannon entropy (bits) of the normalized magnitude distribution
    pub spectral_entropy: f64,
    /// Frequency of the strongest bin in Hz
    pub dominant_frequency: f64,
    /// Largest magnitudes in descending order, zero-filled
    pub top_magnitudes: [f64; TOP_MAGNITUDES],
    /// Power in each of the equal-width bands
    pub band_powers: [f64; FREQUENCY_BANDS],
}

impl FrequencyFeatures {
    pub fn to_array(&self) -> [f64; FREQUENCY_FEATURES] {
        let mut out = [0.0; FREQUENCY_FEATURES];
        out[0] = self.spectral_centroid;
        out[1] = self.spectral_energy;
        out[2] = self.spectral_entropy;
        out[3] = self.dominant_frequency;
        out[4..4 + TOP_MAGNITUDES].copy_from_slice(&self.top_magnitudes);
        out[4 + TOP_MAGNITUDES..].copy_from_slice(&self.band_powers);
        out
    }
}

/// Distribution statistics of the raw series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatisticalFeatures {
    /// Sign changes per sample
    pub zero_crossing_rate: f64,
    /// Mean absolute deviation around the mean
    pub mean_abs_deviation: f64,
    /// Nearest-rank Q3 - Q1
    pub interquartile_range: f64,
}

impl StatisticalFeatures {
    pub fn to_array(&self) -> [f64; STATISTICAL_FEATURES] {
        [
            self.zero_crossing_rate,
            self.mean_abs_deviation,
            self.interquartile_range,
        ]
    }
}

/// All features computed for one axis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisFeatures {
    pub time: TimeDomainFeatures,
    pub frequency: FrequencyFeatures,
    pub statistical: StatisticalFeatures,
}

impl AxisFeatures {
    /// Append this axis' features to `out` in schema order.
    pub fn extend_into(&self, out: &mut Vec<f64>) {
        out.extend_from_slice(&self.time.to_array());
        out.extend_from_slice(&self.frequency.to_array());
        out.extend_from_slice(&self.statistical.to_array());
    }

    pub fn to_vec(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(FEATURES_PER_AXIS);
        self.extend_into(&mut out);
        out
    }
}

/// Computes per-axis features. The FFT plan is built once and reused.
pub struct FeatureExtractor {
    sample_rate: f64,
    fft_length: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl FeatureExtractor {
    /// Create an extractor for series sampled at `sample_rate` Hz, using an
    /// FFT of `fft_length` points.
    pub fn new(sample_rate: f64, fft_length: usize) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(fft_length);
        Self {
            sample_rate,
            fft_length,
            fft,
        }
    }

    pub fn fft_length(&self) -> usize {
        self.fft_length
    }

    /// Width of one FFT bin in Hz.
    pub fn bin_width(&self) -> f64 {
        self.sample_rate / self.fft_length as f64
    }

    /// Compute all three feature groups for one axis.
    pub fn extract(&self, series: &[f64]) -> AxisFeatures {
        AxisFeatures {
            time: Self::time_domain(series),
            frequency: self.frequency(series),
            statistical: Self::statistical(series),
        }
    }

    /// Time-domain features. An empty series yields all zeros.
    pub fn time_domain(series: &[f64]) -> TimeDomainFeatures {
        if series.is_empty() {
            return TimeDomainFeatures::default();
        }

        let n = series.len() as f64;
        let mean = series.iter().mean();
        let std_dev = series.iter().population_std_dev();
        let min = Statistics::min(series.iter());
        let max = Statistics::max(series.iter());
        let rms = (series.iter().map(|v| v * v).sum::<f64>() / n).sqrt();

        let (kurtosis, skewness) = if std_dev == 0.0 {
            (0.0, 0.0)
        } else {
            let m3 = series.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
            let m4 = series.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / n;
            (
                finite_or_zero(m4 / std_dev.powi(4) - 3.0),
                finite_or_zero(m3 / std_dev.powi(3)),
            )
        };

        TimeDomainFeatures {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak: max - min,
            kurtosis,
            skewness,
        }
    }

    /// One-sided magnitude spectrum of the series padded or truncated to
    /// `fft_length` points (bins `0..fft_length / 2`).
    pub fn magnitude_spectrum(&self, series: &[f64]) -> Vec<f64> {
        let mut buffer: Vec<Complex<f64>> = pad_or_truncate(series, self.fft_length)
            .into_iter()
            .map(|v| Complex::new(v, 0.0))
            .collect();

        self.fft.process(&mut buffer);

        buffer[..self.fft_length / 2]
            .iter()
            .map(|c| c.norm())
            .collect()
    }

    /// Frequency-domain features.
    pub fn frequency(&self, series: &[f64]) -> FrequencyFeatures {
        let magnitudes = self.magnitude_spectrum(series);

        let total_magnitude: f64 = magnitudes.iter().sum();
        let weighted: f64 = magnitudes
            .iter()
            .enumerate()
            .map(|(i, m)| i as f64 * m)
            .sum();
        let spectral_centroid = if total_magnitude > 0.0 {
            weighted / total_magnitude
        } else {
            0.0
        };

        let spectral_energy: f64 = magnitudes.iter().map(|m| m * m).sum();

        let spectral_entropy = if total_magnitude > 0.0 {
            -magnitudes
                .iter()
                .map(|m| m / total_magnitude)
                .filter(|&p| p > 0.0)
                .map(|p| p * p.log2())
                .sum::<f64>()
        } else {
            0.0
        };

        // First strictly-greater magnitude wins, so a flat zero spectrum reports bin 0
        let mut dominant_bin = 0;
        let mut dominant_magnitude = 0.0;
        for (i, &m) in magnitudes.iter().enumerate() {
            if m > dominant_magnitude {
                dominant_magnitude = m;
                dominant_bin = i;
            }
        }
        let dominant_frequency = dominant_bin as f64 * self.bin_width();

        let mut sorted = magnitudes.clone();
        sorted.sort_by(|a, b| b.total_cmp(a));
        let mut top_magnitudes = [0.0; TOP_MAGNITUDES];
        for (slot, &m) in top_magnitudes.iter_mut().zip(sorted.iter()) {
            *slot = m;
        }

        // Remainder bins past FREQUENCY_BANDS × band_size are dropped
        let band_size = magnitudes.len() / FREQUENCY_BANDS;
        let mut band_powers = [0.0; FREQUENCY_BANDS];
        for (band, power) in band_powers.iter_mut().enumerate() {
            let start = band * band_size;
            *power = magnitudes[start..start + band_size]
                .iter()
                .map(|m| m * m)
                .sum();
        }

        FrequencyFeatures {
            spectral_centroid,
            spectral_energy,
            spectral_entropy,
            dominant_frequency,
            top_magnitudes,
            band_powers,
        }
    }

    /// Statistical features. An empty series yields all zeros.
    pub fn statistical(series: &[f64]) -> StatisticalFeatures {
        if series.is_empty() {
            return StatisticalFeatures::default();
        }

        let n = series.len() as f64;

        let crossings = series
            .windows(2)
            .filter(|pair| (pair[1] >= 0.0) != (pair[0] >= 0.0))
            .count();

        let mean = series.iter().sum::<f64>() / n;
        let mean_abs_deviation = series.iter().map(|v| (v - mean).abs()).sum::<f64>() / n;

        let mut sorted = series.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let q1 = sorted[(n * 0.25).floor() as usize];
        let q3 = sorted[(n * 0.75).floor() as usize];

        StatisticalFeatures {
            zero_crossing_rate: crossings as f64 / n,
            mean_abs_deviation,
            interquartile_range: q3 - q1,
        }
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_feature_count_constant() {
        assert_eq!(FREQUENCY_FEATURES, 22);
        assert_eq!(FEATURES_PER_AXIS, 33);

        let extractor = FeatureExtractor::new(10.0, 16);
        let features = extractor.extract(&[0.5; 16]);
        assert_eq!(features.to_vec().len(), FEATURES_PER_AXIS);
    }

    #[test]
    fn test_time_domain_constant_series() {
        let features = FeatureExtractor::time_domain(&[3.0; 32]);

        assert_eq!(features.mean, 3.0);
        assert!(approx(features.rms, 3.0));
        assert_eq!(features.std_dev, 0.0);
        assert_eq!(features.min, 3.0);
        assert_eq!(features.max, 3.0);
        assert_eq!(features.peak_to_peak, 0.0);
        assert_eq!(features.kurtosis, 0.0);
        assert_eq!(features.skewness, 0.0);
    }

    #[test]
    fn test_time_domain_known_values() {
        let series = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let features = FeatureExtractor::time_domain(&series);

        assert!(approx(features.mean, 5.0));
        // Population standard deviation of this set is exactly 2
        assert!(approx(features.std_dev, 2.0));
        assert_eq!(features.min, 2.0);
        assert_eq!(features.max, 9.0);
        assert_eq!(features.peak_to_peak, 7.0);

        // m3 = 42 / 8, m4 = 356 / 8
        assert!(approx(features.skewness, (42.0 / 8.0) / 8.0));
        assert!(approx(features.kurtosis, (356.0 / 8.0) / 16.0 - 3.0));
    }

    #[test]
    fn test_symmetric_series_has_zero_skew() {
        let features = FeatureExtractor::time_domain(&[-1.0, 1.0, -1.0, 1.0]);
        assert!(approx(features.mean, 0.0));
        assert!(approx(features.rms, 1.0));
        assert!(approx(features.skewness, 0.0));
        // Two-point distribution: kurtosis 1, excess -2
        assert!(approx(features.kurtosis, -2.0));
    }

    #[test]
    fn test_all_zero_spectrum_is_guarded() {
        let extractor = FeatureExtractor::new(10.0, 16);
        let features = extractor.frequency(&[0.0; 16]);

        assert_eq!(features.spectral_centroid, 0.0);
        assert_eq!(features.spectral_energy, 0.0);
        assert_eq!(features.spectral_entropy, 0.0);
        assert_eq!(features.dominant_frequency, 0.0);
        assert!(features.top_magnitudes.iter().all(|&m| m == 0.0));
        assert!(features.band_powers.iter().all(|&p| p == 0.0));
    }

    #[test]
    fn test_dominant_frequency_of_sine() {
        let sample_rate = 100.0;
        let fft_length = 256;
        let freq = 10.0;
        let series: Vec<f64> = (0..fft_length)
            .map(|i| (2.0 * PI * freq * i as f64 / sample_rate).sin())
            .collect();

        let extractor = FeatureExtractor::new(sample_rate, fft_length);
        let features = extractor.frequency(&series);

        assert!(
            (features.dominant_frequency - freq).abs() <= extractor.bin_width(),
            "dominant {} not within one bin of {}",
            features.dominant_frequency,
            freq
        );
    }

    #[test]
    fn test_top_magnitudes_zero_filled_for_short_spectrum() {
        // 16-point FFT leaves 8 one-sided bins
        let extractor = FeatureExtractor::new(10.0, 16);
        let series: Vec<f64> = (0..16).map(|i| (i % 3) as f64).collect();
        let features = extractor.frequency(&series);

        for pair in features.top_magnitudes[..8].windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        assert_eq!(features.top_magnitudes[8], 0.0);
        assert_eq!(features.top_magnitudes[9], 0.0);
    }

    #[test]
    fn test_band_powers_sum_to_energy_when_evenly_divisible() {
        let extractor = FeatureExtractor::new(50.0, 64);
        let series: Vec<f64> = (0..64).map(|i| (i as f64 * 0.37).cos()).collect();
        let features = extractor.frequency(&series);

        // 32 bins split evenly into 8 bands of 4
        let band_total: f64 = features.band_powers.iter().sum();
        assert!((band_total - features.spectral_energy).abs() < 1e-6);
    }

    #[test]
    fn test_impulse_has_flat_spectrum() {
        let extractor = FeatureExtractor::new(10.0, 16);
        let mut series = vec![0.0; 16];
        series[0] = 1.0;
        let features = extractor.frequency(&series);

        // Every bin has magnitude 1: entropy is log2(8) and centroid is the mean index
        assert!(approx(features.spectral_entropy, 3.0));
        assert!(approx(features.spectral_centroid, 3.5));
        assert!(approx(features.spectral_energy, 8.0));
        assert_eq!(features.dominant_frequency, 0.0);
    }

    #[test]
    fn test_statistical_features() {
        let series = [-1.0, 1.0, -1.0, 1.0, 2.0, 3.0, -4.0, 0.0];
        let features = FeatureExtractor::statistical(&series);

        // Sign changes at 1, 2, 3, 6, 7
        assert!(approx(features.zero_crossing_rate, 5.0 / 8.0));

        // sorted: [-4, -1, -1, 0, 1, 1, 2, 3] -> q1 = sorted[2], q3 = sorted[6]
        assert!(approx(features.interquartile_range, 2.0 - (-1.0)));

        let mean = series.iter().sum::<f64>() / 8.0;
        let mad = series.iter().map(|v| (v - mean).abs()).sum::<f64>() / 8.0;
        assert!(approx(features.mean_abs_deviation, mad));
    }

    #[test]
    fn test_zero_counts_as_non_negative_for_crossings() {
        let features = FeatureExtractor::statistical(&[0.0, 0.0, -0.5, 0.0]);
        assert!(approx(features.zero_crossing_rate, 2.0 / 4.0));
    }

    #[test]
    fn test_empty_series() {
        assert_eq!(FeatureExtractor::time_domain(&[]), TimeDomainFeatures::default());
        assert_eq!(FeatureExtractor::statistical(&[]), StatisticalFeatures::default());
    }

    #[test]
    fn test_extract_does_not_mutate_input() {
        let extractor = FeatureExtractor::new(10.0, 16);
        let series = vec![3.0, -2.0, 5.0, 1.0];
        let before = series.clone();
        let first = extractor.extract(&series);
        let second = extractor.extract(&series);

        assert_eq!(series, before);
        assert_eq!(first, second);
    }
}
