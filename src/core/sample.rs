//! Nine-channel vibration samples.
//!
//! A sample is one synchronized reading of two 3-axis accelerometers and one
//! 3-axis gyroscope. Channel order is fixed and shared by every flattened
//! representation in the crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of scalar channels carried by every sample.
pub const CHANNEL_COUNT: usize = 9;

/// One scalar channel of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    Ax1,
    Ay1,
    Az1,
    Ax2,
    Ay2,
    Az2,
    Gx,
    Gy,
    Gz,
}

impl Axis {
    /// All axes in interleaving order.
    pub const ALL: [Axis; CHANNEL_COUNT] = [
        Axis::Ax1,
        Axis::Ay1,
        Axis::Az1,
        Axis::Ax2,
        Axis::Ay2,
        Axis::Az2,
        Axis::Gx,
        Axis::Gy,
        Axis::Gz,
    ];

    /// Position of this axis within a flattened time-step.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Ax1 => "ax1",
            Axis::Ay1 => "ay1",
            Axis::Az1 => "az1",
            Axis::Ax2 => "ax2",
            Axis::Ay2 => "ay2",
            Axis::Az2 => "az2",
            Axis::Gx => "gx",
            Axis::Gy => "gy",
            Axis::Gz => "gz",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A synchronized 9-axis reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// When the sample was assembled
    pub timestamp: DateTime<Utc>,
    /// Accelerometer-only device
    pub ax1: f64,
    pub ay1: f64,
    pub az1: f64,
    /// Accelerometer of the combined device
    pub ax2: f64,
    pub ay2: f64,
    pub az2: f64,
    /// Gyroscope of the combined device
    pub gx: f64,
    pub gy: f64,
    pub gz: f64,
}

impl Sample {
    /// Build a sample from channel values in [`Axis::ALL`] order.
    pub fn new(timestamp: DateTime<Utc>, values: [f64; CHANNEL_COUNT]) -> Self {
        let [ax1, ay1, az1, ax2, ay2, az2, gx, gy, gz] = values;
        Self {
            timestamp,
            ax1,
            ay1,
            az1,
            ax2,
            ay2,
            az2,
            gx,
            gy,
            gz,
        }
    }

    /// Channel values in [`Axis::ALL`] order.
    pub fn values(&self) -> [f64; CHANNEL_COUNT] {
        [
            self.ax1, self.ay1, self.az1, self.ax2, self.ay2, self.az2, self.gx, self.gy, self.gz,
        ]
    }

    pub fn value(&self, axis: Axis) -> f64 {
        self.values()[axis.index()]
    }
}

/// Flatten samples into one interleaved array: `[ax1, ay1, ..., gz, ax1, ...]`.
pub fn flatten(samples: &[Sample]) -> Vec<f64> {
    let mut flat = Vec::with_capacity(samples.len() * CHANNEL_COUNT);
    for sample in samples {
        flat.extend_from_slice(&sample.values());
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: [f64; CHANNEL_COUNT]) -> Sample {
        Sample::new(Utc::now(), values)
    }

    #[test]
    fn test_values_follow_axis_order() {
        let s = sample([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        for axis in Axis::ALL {
            assert_eq!(s.value(axis), (axis.index() + 1) as f64);
        }
        assert_eq!(s.gz, 9.0);
        assert_eq!(s.ax2, 4.0);
    }

    #[test]
    fn test_flatten_interleaves_time_steps() {
        let a = sample([1.0; CHANNEL_COUNT]);
        let b = sample([2.0; CHANNEL_COUNT]);
        let flat = flatten(&[a, b]);

        assert_eq!(flat.len(), 2 * CHANNEL_COUNT);
        assert!(flat[..CHANNEL_COUNT].iter().all(|&v| v == 1.0));
        assert!(flat[CHANNEL_COUNT..].iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_axis_names() {
        let names: Vec<&str> = Axis::ALL.iter().map(|a| a.name()).collect();
        assert_eq!(
            names,
            vec!["ax1", "ay1", "az1", "ax2", "ay2", "az2", "gx", "gy", "gz"]
        );
    }
}
