//! Operator input
//!
//! This module handles:
//! - Opening the first connected gamepad
//! - Sampling buttons, triggers and sticks into a plain snapshot per cycle

mod gamepad;
mod snapshot;

pub use gamepad::GamepadInput;
pub use snapshot::{ControlInput, ControlSnapshot, DPad};

#[cfg(test)]
pub(crate) use snapshot::scripted::ScriptedInput;
