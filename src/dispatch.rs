use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OnceCell};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{info, warn};

use crate::config::CONFIG;
use crate::error::MissionError;
use crate::mission::waypoint::Waypoint;

static DISPATCH: OnceCell<DispatchLink> = OnceCell::const_new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Connected,
    Unconnected,
}

/// Owns the serial channel to the flight controller.
///
/// The handle lives behind a mutex, so `connect` and `transmit` are
/// serialized: at most one transmission is in flight at a time and nothing
/// else in the process can write to the port. Hardware absence is an
/// expected condition (bench runs without the vehicle attached) and is
/// reported as a result, never a panic.
pub struct DispatchLink {
    port_name: String,
    baud_rate: u32,
    conn: Mutex<Option<SerialStream>>,
}

impl DispatchLink {
    pub fn new(port_name: &str, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.to_string(),
            baud_rate,
            conn: Mutex::new(None),
        }
    }

    pub async fn instance() -> &'static Self {
        DISPATCH
            .get_or_init(|| async { Self::new(&CONFIG.dispatch.port, CONFIG.dispatch.baud_rate) })
            .await
    }

    /// Opens the channel. Idempotent: already connected is a no-op success.
    pub async fn connect(&self) -> Result<(), MissionError> {
        let mut conn = self.conn.lock().await;
        self.open_locked(&mut conn)
    }

    fn open_locked(&self, conn: &mut Option<SerialStream>) -> Result<(), MissionError> {
        if conn.is_some() {
            return Ok(());
        }
        let stream = tokio_serial::new(&self.port_name, self.baud_rate)
            .open_native_async()
            .map_err(|e| {
                MissionError::DispatchUnavailable(format!(
                    "cannot open {} at {} baud: {e}",
                    self.port_name, self.baud_rate
                ))
            })?;
        info!("Connected to {} at {} baud", self.port_name, self.baud_rate);
        *conn = Some(stream);
        Ok(())
    }

    /// Transmits an ordered path as one framed message.
    ///
    /// If the link is down, exactly one reconnection is attempted before
    /// giving up; retrying the transmission itself is the caller's decision.
    /// A write failure discards the stale handle and resets the link to
    /// Unconnected.
    pub async fn transmit(&self, path: &[Waypoint]) -> Result<(), MissionError> {
        let frame = encode_frame(path)?;

        let mut conn = self.conn.lock().await;
        if conn.is_none() {
            warn!("Link down before transmit, attempting reconnect");
            self.open_locked(&mut conn)?;
        }
        let stream = conn.as_mut().ok_or_else(|| {
            MissionError::DispatchUnavailable("no open connection".to_string())
        })?;

        let result = async {
            stream.write_all(&frame).await?;
            stream.flush().await
        }
        .await;

        if let Err(e) = result {
            *conn = None;
            return Err(MissionError::DispatchUnavailable(format!(
                "write to {} failed: {e}",
                self.port_name
            )));
        }

        info!(
            "Transmitted {} waypoints ({} bytes) to {}",
            path.len(),
            frame.len(),
            self.port_name
        );
        Ok(())
    }

    pub async fn status(&self) -> LinkStatus {
        if self.conn.lock().await.is_some() {
            LinkStatus::Connected
        } else {
            LinkStatus::Unconnected
        }
    }

    #[cfg(test)]
    async fn install(&self, stream: SerialStream) {
        *self.conn.lock().await = Some(stream);
    }
}

/// Encodes an ordered path as a self-describing framed message: a
/// `MISSION <count>` header line, then the waypoints as one JSON array line.
/// Textual on purpose, so serial captures stay readable in the field.
pub fn encode_frame(path: &[Waypoint]) -> Result<Vec<u8>, MissionError> {
    let body = serde_json::to_string(path)
        .map_err(|e| MissionError::PlanningDefect(format!("unencodable path: {e}")))?;
    Ok(format!("MISSION {}\n{}\n", path.len(), body).into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;

    fn sample_path() -> Vec<Waypoint> {
        vec![
            Waypoint {
                lat: 33.6844,
                lng: 73.0479,
                alt: 50.0,
            },
            Waypoint {
                lat: 33.6901,
                lng: 73.0551,
                alt: 60.0,
            },
        ]
    }

    #[test]
    fn test_encode_frame() -> anyhow::Result<()> {
        let frame = encode_frame(&sample_path())?;
        let text = String::from_utf8(frame)?;
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("MISSION 2"));

        let body: serde_json::Value = serde_json::from_str(lines.next().unwrap())?;
        assert_eq!(body[0]["lat"], 33.6844);
        assert_eq!(body[0]["lng"], 73.0479);
        assert_eq!(body[1]["altitude"], 60.0);
        Ok(())
    }

    #[test]
    fn test_encode_empty_frame() -> anyhow::Result<()> {
        let frame = encode_frame(&[])?;
        assert_eq!(String::from_utf8(frame)?, "MISSION 0\n[]\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_connect_without_hardware_fails_cleanly() {
        let link = DispatchLink::new("/dev/skyroute-test-missing", 115200);
        assert!(link.connect().await.is_err());
        assert_eq!(link.status().await, LinkStatus::Unconnected);
    }

    #[tokio::test]
    async fn test_transmit_without_hardware_reports_unavailable() {
        let link = DispatchLink::new("/dev/skyroute-test-missing", 115200);
        let result = link.transmit(&sample_path()).await;
        assert!(matches!(
            result,
            Err(MissionError::DispatchUnavailable(_))
        ));
        // The single reconnect attempt failed; state must stay Unconnected.
        assert_eq!(link.status().await, LinkStatus::Unconnected);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_when_connected() -> anyhow::Result<()> {
        let (ours, mut theirs) = SerialStream::pair()?;
        let link = DispatchLink::new("/dev/skyroute-test-pty", 115200);
        link.install(ours).await;

        // Connecting again must keep the existing handle, not open a new one.
        link.connect().await?;
        assert_eq!(link.status().await, LinkStatus::Connected);

        let path = sample_path();
        let expected = encode_frame(&path)?;
        link.transmit(&path).await?;

        let mut received = vec![0u8; expected.len()];
        tokio::time::timeout(Duration::from_secs(2), theirs.read_exact(&mut received)).await??;
        assert_eq!(received, expected);
        Ok(())
    }

    #[tokio::test]
    async fn test_transmit_frames_ordered_path() -> anyhow::Result<()> {
        let (ours, mut theirs) = SerialStream::pair()?;
        let link = DispatchLink::new("/dev/skyroute-test-pty", 115200);
        link.install(ours).await;

        let path = sample_path();
        let expected = encode_frame(&path)?;
        link.transmit(&path).await?;
        assert_eq!(link.status().await, LinkStatus::Connected);

        let mut received = vec![0u8; expected.len()];
        tokio::time::timeout(Duration::from_secs(2), theirs.read_exact(&mut received)).await??;
        assert_eq!(received, expected);
        Ok(())
    }
}
