//! Merges the two sensor streams into nine-channel samples.
//!
//! Every inbound message produces one sample carrying the latest known
//! reading of both devices, even if the other device has not reported
//! recently. Both readings start at zero.

use super::types::{AccelReading, CombinedReading, SensorMessage};
use super::IngestError;
use crate::config::TopicConfig;
use crate::core::sample::Sample;
use chrono::{DateTime, Utc};

/// Latest-value merge of the accelerometer and combined device streams.
#[derive(Debug, Clone)]
pub struct SensorFusion {
    accel_topic: String,
    combined_topic: String,
    latest_accel: AccelReading,
    latest_combined: CombinedReading,
}

impl SensorFusion {
    pub fn new(topics: &TopicConfig) -> Self {
        Self {
            accel_topic: topics.accel.clone(),
            combined_topic: topics.combined.clone(),
            latest_accel: AccelReading::default(),
            latest_combined: CombinedReading::default(),
        }
    }

    /// Apply a message and emit a sample stamped with the current time.
    pub fn on_message(&mut self, topic: &str, payload: &str) -> Result<Sample, IngestError> {
        self.on_message_at(topic, payload, Utc::now())
    }

    /// Apply a message and emit a sample stamped with `timestamp`.
    ///
    /// A payload that is valid JSON but lacks the device's fields leaves that
    /// device's reading unchanged; a sample is still emitted.
    pub fn on_message_at(
        &mut self,
        topic: &str,
        payload: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Sample, IngestError> {
        let is_accel = topic == self.accel_topic;
        if !is_accel && topic != self.combined_topic {
            return Err(IngestError::UnknownTopic(topic.to_string()));
        }

        let value: serde_json::Value = serde_json::from_str(payload)?;

        if is_accel {
            match serde_json::from_value::<AccelReading>(value) {
                Ok(reading) => self.latest_accel = reading,
                Err(e) => tracing::debug!(topic, error = %e, "Keeping previous accelerometer reading"),
            }
        } else {
            match serde_json::from_value::<CombinedReading>(value) {
                Ok(reading) => self.latest_combined = reading,
                Err(e) => tracing::debug!(topic, error = %e, "Keeping previous combined reading"),
            }
        }

        Ok(self.current_sample(timestamp))
    }

    /// Convenience wrapper over [`Self::on_message`].
    pub fn on_sensor_message(&mut self, message: &SensorMessage) -> Result<Sample, IngestError> {
        self.on_message(&message.topic, &message.payload)
    }

    /// Sample built from the latest readings of both devices.
    pub fn current_sample(&self, timestamp: DateTime<Utc>) -> Sample {
        let a = self.latest_accel;
        let c = self.latest_combined;
        Sample::new(
            timestamp,
            [
                a.ax, a.ay, a.az, c.accel.x, c.accel.y, c.accel.z, c.gyro.x, c.gyro.y, c.gyro.z,
            ],
        )
    }
}
