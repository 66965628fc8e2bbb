//! Tello SDK Command Translation
//!
//! Translates gamepad-level actions into Tello SDK text commands.

use std::fmt;

/// Linear movement directions understood by the SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    Forward,
    Back,
}

impl Direction {
    fn keyword(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Forward => "forward",
            Direction::Back => "back",
        }
    }
}

/// Yaw rotation sense
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Clockwise,
    CounterClockwise,
}

/// A single command for the flight controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlightCommand {
    /// Enter SDK mode; must be the first command of a session
    EnterSdk,
    Takeoff,
    Land,
    StreamOn,
    StreamOff,
    /// Remaining battery, replied as a bare percentage
    QueryBattery,
    /// Move in a straight line (20..=500 cm)
    Move { direction: Direction, cm: u32 },
    /// Rotate in place (1..=360 degrees)
    Rotate { rotation: Rotation, degrees: u32 },
    /// Fly to a point relative to the current position (x forward, y left, z up)
    Go { x: i32, y: i32, z: i32, speed: u32 },
}

impl FlightCommand {
    /// Render the command as SDK text
    pub fn to_sdk(&self) -> String {
        match self {
            FlightCommand::EnterSdk => "command".to_string(),
            FlightCommand::Takeoff => "takeoff".to_string(),
            FlightCommand::Land => "land".to_string(),
            FlightCommand::StreamOn => "streamon".to_string(),
            FlightCommand::StreamOff => "streamoff".to_string(),
            FlightCommand::QueryBattery => "battery?".to_string(),
            FlightCommand::Move { direction, cm } => format!("{} {}", direction.keyword(), cm),
            FlightCommand::Rotate { rotation, degrees } => match rotation {
                Rotation::Clockwise => format!("cw {}", degrees),
                Rotation::CounterClockwise => format!("ccw {}", degrees),
            },
            FlightCommand::Go { x, y, z, speed } => format!("go {} {} {} {}", x, y, z, speed),
        }
    }

    /// Queries reply with a value instead of `ok`
    pub fn is_query(&self) -> bool {
        matches!(self, FlightCommand::QueryBattery)
    }
}

impl fmt::Display for FlightCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sdk())
    }
}
