//! Line-oriented message source.
//!
//! Reads the `topic payload` lines printed by `mosquitto_sub -v` from a file
//! or stdin, so recorded sessions can be replayed and a live subscriber can be
//! piped straight into the agent.

use super::fusion::SensorFusion;
use super::types::SensorMessage;
use super::IngestError;
use crate::core::sample::Sample;
use crate::stats::SharedPipelineStats;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::mpsc;

/// Parse one input line.
///
/// Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<SensorMessage>, IngestError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    match line.split_once(char::is_whitespace) {
        Some((topic, payload)) if !payload.trim().is_empty() => {
            Ok(Some(SensorMessage::new(topic, payload.trim())))
        }
        _ => Err(IngestError::MalformedLine(line.to_string())),
    }
}

/// Reads [`SensorMessage`]s from any async byte stream.
pub struct LineSource<R> {
    lines: Lines<BufReader<R>>,
    malformed: u64,
}

impl<R: AsyncRead + Unpin> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            malformed: 0,
        }
    }

    /// Next well-formed message, or `None` at end of input.
    ///
    /// Malformed lines are logged, counted and skipped.
    pub async fn next_message(&mut self) -> Result<Option<SensorMessage>, IngestError> {
        while let Some(line) = self.lines.next_line().await? {
            match parse_line(&line) {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => continue,
                Err(e) => {
                    self.malformed += 1;
                    tracing::warn!(error = %e, "Dropping malformed input line");
                }
            }
        }
        Ok(None)
    }

    /// Lines skipped because they had no payload.
    pub fn malformed_count(&self) -> u64 {
        self.malformed
    }
}

/// Boxed reader for file or stdin input.
pub type DynLineSource = LineSource<Box<dyn AsyncRead + Send + Unpin>>;

/// Open `path`, or stdin when `path` is `-`.
pub async fn open_source(path: &Path) -> Result<DynLineSource, IngestError> {
    let reader: Box<dyn AsyncRead + Send + Unpin> = if path == Path::new("-") {
        Box::new(tokio::io::stdin())
    } else {
        Box::new(tokio::fs::File::open(path).await?)
    };
    Ok(LineSource::new(reader))
}

/// Fuse every message from `source` into samples and forward them in order.
///
/// Messages that cannot be fused are dropped with a warning. Returns the
/// number of samples forwarded; stops early if the receiver goes away.
pub async fn forward_samples<R: AsyncRead + Unpin>(
    source: &mut LineSource<R>,
    fusion: &mut SensorFusion,
    tx: &mpsc::Sender<Sample>,
    stats: &SharedPipelineStats,
) -> Result<u64, IngestError> {
    let mut forwarded = 0;

    loop {
        let malformed_before = source.malformed_count();
        let next = source.next_message().await?;
        stats.record_messages_dropped(source.malformed_count() - malformed_before);

        let Some(message) = next else { break };

        let sample = match fusion.on_sensor_message(&message) {
            Ok(sample) => sample,
            Err(e) => {
                stats.record_message_dropped();
                tracing::warn!(topic = %message.topic, error = %e, "Dropping sensor message");
                continue;
            }
        };

        if tx.send(sample).await.is_err() {
            tracing::debug!("Sample receiver closed, stopping input");
            break;
        }
        forwarded += 1;
    }

    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TopicConfig;
    use crate::stats::create_shared_stats;

    #[test]
    fn test_parse_line() {
        let msg = parse_line("iiot/sensors/adxl345 {\"ax\": 1, \"ay\": 2, \"az\": 3}")
            .unwrap()
            .unwrap();
        assert_eq!(msg.topic, "iiot/sensors/adxl345");
        assert_eq!(msg.payload, "{\"ax\": 1, \"ay\": 2, \"az\": 3}");

        assert!(parse_line("   ").unwrap().is_none());
        assert!(parse_line("# recorded 2024-01-01").unwrap().is_none());
        assert!(parse_line("topic-without-payload").is_err());
    }

    #[tokio::test]
    async fn test_line_source_skips_malformed() {
        let input = "a {\"x\":1}\n\nbroken\n# note\nb {\"y\":2}\n";
        let mut source = LineSource::new(input.as_bytes());

        assert_eq!(source.next_message().await.unwrap().unwrap().topic, "a");
        assert_eq!(source.next_message().await.unwrap().unwrap().topic, "b");
        assert!(source.next_message().await.unwrap().is_none());
        assert_eq!(source.malformed_count(), 1);
    }

    #[tokio::test]
    async fn test_forward_samples_counts_drops() {
        let topics = TopicConfig {
            accel: "acc".to_string(),
            combined: "imu".to_string(),
            status: "status".to_string(),
        };
        let input = concat!(
            "acc {\"ax\": 1, \"ay\": 1, \"az\": 1}\n",
            "unknown {\"ax\": 1}\n",
            "acc not-json\n",
            "garbage\n",
            "imu {\"accel\": {\"x\": 2, \"y\": 2, \"z\": 2}, \"gyro\": {\"x\": 3, \"y\": 3, \"z\": 3}}\n",
        );
        let mut source = LineSource::new(input.as_bytes());
        let mut fusion = SensorFusion::new(&topics);
        let stats = create_shared_stats();
        let (tx, mut rx) = mpsc::channel(16);

        let forwarded = forward_samples(&mut source, &mut fusion, &tx, &stats)
            .await
            .unwrap();
        drop(tx);

        assert_eq!(forwarded, 2);
        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.ax1, 1.0);
        assert_eq!(second.values(), [1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0]);

        let snapshot = stats.stats();
        assert_eq!(snapshot.messages_dropped, 3);
    }
}
