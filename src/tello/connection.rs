//! Flight Controller Connection
//!
//! Request/response session with a Tello over UDP. Every command is sent as a
//! single datagram and blocks until the drone answers or the response timeout
//! elapses.

use async_trait::async_trait;
use scout_shared::{endpoints, timing};
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::commands::FlightCommand;

/// Configuration for the flight controller connection
#[derive(Debug, Clone)]
pub struct TelloConfig {
    /// Drone command endpoint
    pub address: String,
    /// Local address the drone replies to
    pub local_bind: String,
    /// Attempts for the SDK-mode handshake
    pub handshake_retries: u32,
    /// Attempts for every other command
    pub command_retries: u32,
    /// How long to wait for each reply
    pub response_timeout: Duration,
}

impl Default for TelloConfig {
    fn default() -> Self {
        Self {
            address: endpoints::DRONE_COMMAND_ADDR.into(),
            local_bind: endpoints::LOCAL_COMMAND_BIND.into(),
            handshake_retries: timing::HANDSHAKE_RETRIES,
            command_retries: timing::COMMAND_RETRIES,
            response_timeout: Duration::from_millis(timing::RESPONSE_TIMEOUT_MS),
        }
    }
}

/// Errors returned by flight commands
#[derive(Error, Debug)]
pub enum FlightError {
    #[error("No reply to '{command}' after {attempts} attempt(s)")]
    Timeout { command: String, attempts: u32 },

    #[error("Drone rejected '{command}': {reply}")]
    Rejected { command: String, reply: String },

    #[error("Unexpected reply to '{command}': {reply}")]
    BadReply { command: String, reply: String },

    #[error("Flight link I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FlightError {
    /// The drone is unreachable, as opposed to reachable but unwilling
    pub fn is_link_loss(&self) -> bool {
        matches!(self, FlightError::Timeout { .. } | FlightError::Io(_))
    }
}

/// Anything that can carry flight commands to a drone
#[async_trait]
pub trait FlightLink: Send + Sync {
    /// Send a command and wait for its reply
    async fn execute(&self, command: &FlightCommand) -> Result<String, FlightError>;

    /// Query the battery percentage
    async fn battery(&self) -> Result<u8, FlightError> {
        let command = FlightCommand::QueryBattery;
        let reply = self.execute(&command).await?;
        reply.trim().parse::<u8>().map_err(|_| FlightError::BadReply {
            command: command.to_sdk(),
            reply,
        })
    }
}

/// UDP session with a Tello
pub struct TelloClient {
    config: TelloConfig,
    socket: UdpSocket,
    peer: SocketAddr,
    /// One command in flight at a time
    exchange_lock: Mutex<()>,
}

impl TelloClient {
    /// Bind the local command port
    pub async fn bind(config: TelloConfig) -> Result<Self, FlightError> {
        let peer = tokio::net::lookup_host(config.address.as_str())
            .await?
            .next()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    format!("cannot resolve {}", config.address),
                )
            })?;
        let socket = UdpSocket::bind(config.local_bind.as_str()).await?;

        debug!("[TELLO] Bound {} -> {}", socket.local_addr()?, peer);

        Ok(Self {
            config,
            socket,
            peer,
            exchange_lock: Mutex::new(()),
        })
    }

    fn attempts_for(&self, command: &FlightCommand) -> u32 {
        let attempts = match command {
            FlightCommand::EnterSdk => self.config.handshake_retries,
            _ => self.config.command_retries,
        };
        attempts.max(1)
    }

    /// Discard replies that arrived after an earlier command timed out
    fn drain_stale(&self, buf: &mut [u8]) -> Result<(), FlightError> {
        loop {
            match self.socket.try_recv_from(buf) {
                Ok((n, from)) => {
                    debug!("[TELLO] Dropping stale reply from {}: {:?}", from, &buf[..n]);
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// One send and one wait, no retries
    async fn exchange(&self, text: &str, buf: &mut [u8]) -> Result<Option<String>, FlightError> {
        self.drain_stale(buf)?;
        self.socket.send_to(text.as_bytes(), self.peer).await?;

        match timeout(self.config.response_timeout, self.recv_reply(buf)).await {
            Ok(Ok(reply)) => Ok(Some(reply)),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Ok(None),
        }
    }

    async fn recv_reply(&self, buf: &mut [u8]) -> std::io::Result<String> {
        loop {
            let (n, from) = self.socket.recv_from(buf).await?;
            if from == self.peer {
                return Ok(String::from_utf8_lossy(&buf[..n]).trim().to_string());
            }
            debug!("[TELLO] Ignoring datagram from {}", from);
        }
    }
}

#[async_trait]
impl FlightLink for TelloClient {
    async fn execute(&self, command: &FlightCommand) -> Result<String, FlightError> {
        let _guard = self.exchange_lock.lock().await;
        let text = command.to_sdk();
        let attempts = self.attempts_for(command);
        let mut buf = vec![0u8; 1024];

        for attempt in 1..=attempts {
            debug!("[TELLO] -> {} (attempt {}/{})", text, attempt, attempts);

            match self.exchange(&text, &mut buf).await? {
                Some(reply) => {
                    debug!("[TELLO] <- {}", reply);
                    return classify_reply(command, reply);
                }
                None => {
                    warn!("[TELLO] No reply to '{}' (attempt {}/{})", text, attempt, attempts);
                }
            }
        }

        Err(FlightError::Timeout {
            command: text,
            attempts,
        })
    }
}

/// Map a raw SDK reply onto success or rejection
fn classify_reply(command: &FlightCommand, reply: String) -> Result<String, FlightError> {
    let lowered = reply.to_ascii_lowercase();
    let refused = lowered.starts_with("error")
        || lowered.starts_with("out of range")
        || lowered.starts_with("unknown command");

    if refused {
        return Err(FlightError::Rejected {
            command: command.to_sdk(),
            reply,
        });
    }

    if !command.is_query() && lowered != "ok" {
        return Err(FlightError::BadReply {
            command: command.to_sdk(),
            reply,
        });
    }

    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tello::Direction;

    fn test_config(address: SocketAddr) -> TelloConfig {
        TelloConfig {
            address: address.to_string(),
            local_bind: "127.0.0.1:0".into(),
            handshake_retries: 3,
            command_retries: 2,
            response_timeout: Duration::from_millis(100),
        }
    }

    /// Fake drone that answers each received command via `reply`
    async fn spawn_fake_drone(reply: fn(&str) -> Option<&'static str>) -> SocketAddr {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; 256];
            loop {
                let (n, from) = socket.recv_from(&mut buf).await.unwrap();
                let text = std::str::from_utf8(&buf[..n]).unwrap().to_string();
                if let Some(answer) = reply(&text) {
                    socket.send_to(answer.as_bytes(), from).await.unwrap();
                }
            }
        });

        addr
    }

    #[test]
    fn test_default_config() {
        let config = TelloConfig::default();
        assert_eq!(config.address, "192.168.10.1:8889");
        assert_eq!(config.handshake_retries, 25);
        assert_eq!(config.response_timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_classify_reply() {
        let land = FlightCommand::Land;
        assert!(classify_reply(&land, "ok".into()).is_ok());
        assert!(matches!(
            classify_reply(&land, "error Motor stop".into()),
            Err(FlightError::Rejected { .. })
        ));
        assert!(matches!(
            classify_reply(&land, "87".into()),
            Err(FlightError::BadReply { .. })
        ));
        assert_eq!(
            classify_reply(&FlightCommand::QueryBattery, "87".into()).unwrap(),
            "87"
        );
    }

    #[test]
    fn test_link_loss_classification() {
        let timeout = FlightError::Timeout { command: "land".into(), attempts: 3 };
        let rejected = FlightError::Rejected { command: "land".into(), reply: "error".into() };
        assert!(timeout.is_link_loss());
        assert!(!rejected.is_link_loss());
    }

    #[tokio::test]
    async fn test_command_and_battery() {
        let drone = spawn_fake_drone(|cmd| match cmd {
            "battery?" => Some("87\r\n"),
            _ => Some("ok"),
        })
        .await;

        let client = TelloClient::bind(test_config(drone)).await.unwrap();

        let reply = client
            .execute(&FlightCommand::Move { direction: Direction::Up, cm: 20 })
            .await
            .unwrap();
        assert_eq!(reply, "ok");
        assert_eq!(client.battery().await.unwrap(), 87);
    }

    #[tokio::test]
    async fn test_silent_drone_times_out() {
        let drone = spawn_fake_drone(|_| None).await;
        let client = TelloClient::bind(test_config(drone)).await.unwrap();

        let err = client.execute(&FlightCommand::Takeoff).await.unwrap_err();
        assert!(matches!(err, FlightError::Timeout { attempts: 2, .. }));

        let err = client.execute(&FlightCommand::EnterSdk).await.unwrap_err();
        assert!(matches!(err, FlightError::Timeout { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let drone = spawn_fake_drone(|_| Some("error Not joystick")).await;
        let client = TelloClient::bind(test_config(drone)).await.unwrap();

        let err = client.execute(&FlightCommand::Takeoff).await.unwrap_err();
        assert!(matches!(err, FlightError::Rejected { .. }));
        assert!(!err.is_link_loss());
    }
}
