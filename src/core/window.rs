//! Bounded sample buffer feeding classification windows.
//!
//! Samples are appended at the tail and dropped from the front. The buffer
//! targets a window of `W` samples and never holds more than `2 × W`: when an
//! append would exceed that ceiling, only the most recent `W` are kept.

use crate::core::sample::Sample;
use std::collections::VecDeque;

/// Ordered buffer of the most recent samples.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: VecDeque<Sample>,
    /// Target window size `W`
    capacity: usize,
}

impl SampleWindow {
    /// Create an empty window targeting `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.saturating_mul(2)),
            capacity,
        }
    }

    /// Target window size.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Hard ceiling on buffered samples.
    pub fn ceiling(&self) -> usize {
        self.capacity.saturating_mul(2)
    }

    /// Append a sample at the tail.
    ///
    /// Returns how many samples were dropped from the front to respect the
    /// ceiling (zero in the common case).
    pub fn append(&mut self, sample: Sample) -> usize {
        self.samples.push_back(sample);

        if self.samples.len() > self.ceiling() {
            let excess = self.samples.len() - self.capacity;
            self.samples.drain(..excess);
            excess
        } else {
            0
        }
    }

    /// Whether at least `target` samples are buffered.
    pub fn is_ready(&self, target: usize) -> bool {
        self.samples.len() >= target
    }

    /// The most recent `n` samples in arrival order (all of them if fewer exist).
    pub fn last_n(&self, n: usize) -> Vec<Sample> {
        let skip = self.samples.len().saturating_sub(n);
        self.samples.iter().skip(skip).copied().collect()
    }

    /// Keep only the most recent `k` samples.
    pub fn retain_last(&mut self, k: usize) {
        let excess = self.samples.len().saturating_sub(k);
        self.samples.drain(..excess);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }
}
