//! QR-Scout Shared Types
//!
//! This crate provides the types shared between the teleoperation process and
//! the bench receiver: the operating mode, the scan payload codec and the
//! flight-link state machine.

pub mod codec;
pub mod state_machine;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Timing parameters for the system
pub mod timing {
    /// Dispatcher polling period
    pub const DISPATCH_CYCLE_MS: u64 = 500;

    /// Delay before the next reconnection attempt after a failed verify
    pub const RECONNECT_DELAY_MS: u64 = 5000;

    /// Debounce window for takeoff and land
    pub const FLIGHT_TRIGGER_DEBOUNCE_MS: u64 = 1000;

    /// Debounce window for the mode toggle
    pub const MODE_TOGGLE_DEBOUNCE_MS: u64 = 500;

    /// Back-off after a failed frame acquisition
    pub const FRAME_RETRY_DELAY_MS: u64 = 1000;

    /// How long to wait for a reply from the drone
    pub const RESPONSE_TIMEOUT_MS: u64 = 7000;

    /// Attempts for the SDK-mode handshake at startup
    pub const HANDSHAKE_RETRIES: u32 = 25;

    /// Attempts for every other flight command
    pub const COMMAND_RETRIES: u32 = 3;
}

/// Network endpoints baked into the build
pub mod endpoints {
    /// Drone command port
    pub const DRONE_COMMAND_ADDR: &str = "192.168.10.1:8889";

    /// Local port the drone replies to
    pub const LOCAL_COMMAND_BIND: &str = "0.0.0.0:8889";

    /// H.264 video stream pushed by the drone after `streamon`
    pub const VIDEO_STREAM_URL: &str = "udp://0.0.0.0:11111";

    /// Microcontroller receiving scanned payloads
    pub const SCAN_PEER_ADDR: &str = "10.0.0.71:8889";
}

/// What a scanned code is being used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    Sales,
    #[default]
    Inventory,
}

impl OperatingMode {
    /// The other mode
    pub fn toggled(self) -> Self {
        match self {
            OperatingMode::Sales => OperatingMode::Inventory,
            OperatingMode::Inventory => OperatingMode::Sales,
        }
    }

    /// Wire representation used in forwarded payloads
    pub fn as_str(self) -> &'static str {
        match self {
            OperatingMode::Sales => "sales",
            OperatingMode::Inventory => "inventory",
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperatingMode {
    type Err = codec::CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales" => Ok(OperatingMode::Sales),
            "inventory" => Ok(OperatingMode::Inventory),
            other => Err(codec::CodecError::UnknownMode(other.to_string())),
        }
    }
}
