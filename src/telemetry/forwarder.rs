//! UDP forwarder for scanned payloads
//!
//! Fire-and-forget: one datagram per payload, no acknowledgement and no
//! retry. Failures are logged and the payload is dropped.

use scout_shared::{codec, codec::CodecError, endpoints, OperatingMode};
use thiserror::Error;
use tokio::net::UdpSocket;
use tracing::{error, info};

/// Forwarder configuration
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    /// Microcontroller receiving the payloads
    pub peer: String,
    /// Local bind address for the sending socket
    pub local_bind: String,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            peer: endpoints::SCAN_PEER_ADDR.into(),
            local_bind: "0.0.0.0:0".into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ForwardError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Send failed: {0}")]
    Io(#[from] std::io::Error),
}

pub struct TelemetryForwarder {
    config: ForwarderConfig,
    socket: UdpSocket,
}

impl TelemetryForwarder {
    pub async fn bind(config: ForwarderConfig) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(config.local_bind.as_str()).await?;
        info!("[TELEMETRY] Forwarding scans to {}", config.peer);
        Ok(Self { config, socket })
    }

    /// Tag and send a payload, logging any failure
    ///
    /// Returns true if a datagram was sent.
    pub async fn forward(&self, payload: &str, mode: OperatingMode) -> bool {
        match self.try_forward(payload, mode).await {
            Ok(sent) => {
                info!("[TELEMETRY] Sent {} bytes to {} ({})", sent, self.config.peer, mode);
                true
            }
            Err(ForwardError::Codec(e)) => {
                error!("[TELEMETRY] Invalid JSON payload: {}", e);
                false
            }
            Err(e) => {
                error!("[TELEMETRY] Error sending data: {}", e);
                false
            }
        }
    }

    pub async fn try_forward(&self, payload: &str, mode: OperatingMode) -> Result<usize, ForwardError> {
        let datagram = codec::encode(payload, mode)?;
        let sent = self.socket.send_to(&datagram, self.config.peer.as_str()).await?;
        Ok(sent)
    }
}
