//! Drone connection management
//!
//! This module handles:
//! - The SDK-mode handshake and the battery verification that follows it
//! - Tracking whether the link is up, and whether it was ever up
//! - Landing and stopping the stream on shutdown

mod manager;

pub use manager::ConnectionManager;
