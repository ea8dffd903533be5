//! Payload types for the two vibration sensor streams.
//!
//! The accelerometer-only device publishes `{ax, ay, az}`. The combined
//! device publishes `{accel: {x, y, z}, gyro: {x, y, z}}`.

use serde::{Deserialize, Serialize};

/// Reading from the accelerometer-only device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AccelReading {
    pub ax: f64,
    pub ay: f64,
    pub az: f64,
}

/// A 3-axis vector as sent by the combined device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Reading from the accelerometer + gyroscope device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedReading {
    pub accel: Vector3,
    pub gyro: Vector3,
}

/// One inbound message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorMessage {
    pub topic: String,
    /// Raw JSON payload
    pub payload: String,
}

impl SensorMessage {
    pub fn new(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
        }
    }
}
