//! Gamepad command dispatch
//!
//! This module handles:
//! - Reconnecting to the drone when the link is down
//! - Debounced takeoff, land and mode toggle
//! - Mapping the D-pad and face buttons onto fixed-size moves
//! - Forwarding the last scanned code on capture

mod debounce;
mod dispatcher;

pub use dispatcher::{CommandDispatcher, DispatchConfig};
