//! Scan telemetry
//!
//! Tags scanned payloads with the operating mode and pushes them to the
//! downstream microcontroller.

mod forwarder;

pub use forwarder::{ForwarderConfig, TelemetryForwarder};
