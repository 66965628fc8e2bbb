//! Tello Bridge Module
//!
//! Provides the command session with a Tello-class drone via its text SDK.

mod commands;
mod connection;

pub use commands::{Direction, FlightCommand, Rotation};
pub use connection::{FlightError, FlightLink, TelloClient, TelloConfig};

#[cfg(test)]
pub(crate) mod fake;
