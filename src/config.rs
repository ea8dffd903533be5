//! Configuration for the vibration agent.
//!
//! Every field is required. A missing value is a parse error and an
//! out-of-range value is a validation error.

use crate::core::features::FEATURES_PER_AXIS;
use crate::core::sample::CHANNEL_COUNT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Main configuration for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Feature extraction parameters
    pub dsp: DspConfig,

    /// Window sizing and classification timing
    pub windowing: WindowingConfig,

    /// Sensor and status topic names
    pub topics: TopicConfig,

    /// Path for persisted pipeline statistics
    pub data_path: PathBuf,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::config_path())
    }

    /// Load and validate configuration from `path`.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the default configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("iiot-vibration-agent")
            .join("config.json")
    }

    /// Check every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dsp.validate()?;
        self.windowing.validate()?;
        self.topics.validate()?;
        Ok(())
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }
}

/// Parameters of the spectral feature pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DspConfig {
    /// Sampling rate of the sensor stream in Hz
    pub sample_rate: f64,
    /// Samples per axis fed to the extractor
    pub frame_length: usize,
    /// FFT size (power of two)
    pub fft_length: usize,
    /// Number of interleaved axes in a window
    pub axis_count: usize,
    /// Exact length of the classifier input vector
    pub expected_feature_count: usize,
}

impl DspConfig {
    /// Feature count produced before padding or truncation.
    pub fn derived_feature_count(&self) -> usize {
        self.axis_count * FEATURES_PER_AXIS
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(ConfigError::invalid(
                "dsp.sample_rate",
                format!("must be a positive number, got {}", self.sample_rate),
            ));
        }
        if self.frame_length == 0 {
            return Err(ConfigError::invalid("dsp.frame_length", "must be at least 1"));
        }
        if self.fft_length < 2 || !self.fft_length.is_power_of_two() {
            return Err(ConfigError::invalid(
                "dsp.fft_length",
                format!("must be a power of two >= 2, got {}", self.fft_length),
            ));
        }
        if self.axis_count == 0 || self.axis_count > CHANNEL_COUNT {
            return Err(ConfigError::invalid(
                "dsp.axis_count",
                format!("must be between 1 and {CHANNEL_COUNT}, got {}", self.axis_count),
            ));
        }
        if self.expected_feature_count == 0 {
            return Err(ConfigError::invalid(
                "dsp.expected_feature_count",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Window sizing and classifier timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowingConfig {
    /// Samples per classification window
    pub target_size: usize,

    /// Upper bound on a single classification
    #[serde(rename = "classify_timeout_ms", with = "duration_ms")]
    pub classify_timeout: Duration,
}

impl WindowingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_size == 0 {
            return Err(ConfigError::invalid(
                "windowing.target_size",
                "must be at least 1",
            ));
        }
        if self.classify_timeout.is_zero() {
            return Err(ConfigError::invalid(
                "windowing.classify_timeout_ms",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Samples kept after a successful classification.
    pub fn retained_after_classification(&self) -> usize {
        self.target_size / 2
    }
}

/// Topic names for the two sensor streams and the status output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicConfig {
    /// Accelerometer-only device (`{ax, ay, az}`)
    pub accel: String,
    /// Accelerometer + gyroscope device (`{accel:{x,y,z}, gyro:{x,y,z}}`)
    pub combined: String,
    /// Destination of classification results
    pub status: String,
}

impl TopicConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("topics.accel", &self.accel),
            ("topics.combined", &self.combined),
            ("topics.status", &self.status),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::invalid(field, "must not be empty"));
            }
        }
        if self.accel == self.combined {
            return Err(ConfigError::invalid(
                "topics.combined",
                "must differ from topics.accel",
            ));
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Serde support for millisecond durations.
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CONFIG: &str = r#"{
        "dsp": {
            "sample_rate": 10.0,
            "frame_length": 270,
            "fft_length": 256,
            "axis_count": 9,
            "expected_feature_count": 297
        },
        "windowing": { "target_size": 270, "classify_timeout_ms": 5000 },
        "topics": {
            "accel": "iiot/sensors/adxl345",
            "combined": "iiot/sensors/mpu6050",
            "status": "iiot/motor/status"
        },
        "data_path": "/tmp/iiot-vibration-agent"
    }"#;

    fn sample_config() -> Config {
        serde_json::from_str(SAMPLE_CONFIG).unwrap()
    }

    #[test]
    fn test_parse_and_validate() {
        let config = sample_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.windowing.classify_timeout, Duration::from_millis(5000));
        assert_eq!(config.dsp.derived_feature_count(), 297);
        assert_eq!(config.windowing.retained_after_classification(), 135);
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let json = SAMPLE_CONFIG.replace("\"sample_rate\": 10.0,", "");
        let result: Result<Config, _> = serde_json::from_str(&json);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_non_power_of_two_fft() {
        let mut config = sample_config();
        config.dsp.fft_length = 270;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "dsp.fft_length", .. })
        ));
    }

    #[test]
    fn test_rejects_bad_rates_and_sizes() {
        let mut config = sample_config();
        config.dsp.sample_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.dsp.sample_rate = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.dsp.axis_count = 10;
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.windowing.target_size = 0;
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.topics.combined = config.topics.accel.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = sample_config();

        config.save_to(&path).unwrap();
        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_not_defaulted() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load_from(dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }
}
