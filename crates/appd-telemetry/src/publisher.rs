//! Telemetry publisher client

use appd_api::TelemetrySample;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

use crate::TelemetryResult;

/// Writes samples to a running telemetry server
pub struct TelemetryPublisher {
    stream: UnixStream,
}

impl TelemetryPublisher {
    pub async fn connect(socket_path: impl AsRef<Path>) -> TelemetryResult<Self> {
        let stream = UnixStream::connect(socket_path).await?;
        Ok(Self { stream })
    }

    /// Send one sample as a single NDJSON line
    pub async fn publish(&mut self, sample: &TelemetrySample) -> TelemetryResult<()> {
        let mut json = serde_json::to_string(sample)?;
        json.push('\n');
        self.stream.write_all(json.as_bytes()).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Close the write side so the server sees EOF
    pub async fn close(mut self) -> TelemetryResult<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
