//! Control state captured once per dispatcher cycle

/// Directional pad buttons
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DPad {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl DPad {
    #[cfg(test)]
    pub fn is_idle(&self) -> bool {
        !(self.up || self.down || self.left || self.right)
    }
}

/// Analog stick positions in [-1.0, 1.0]
///
/// Read every cycle and reported at startup, but not mapped to flight
/// commands: the D-pad and face buttons issue fixed-size moves.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sticks {
    pub left_right: f32,
    pub forward_back: f32,
    pub up_down: f32,
    pub yaw: f32,
}

/// Everything the dispatcher reads from the gamepad in one cycle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlSnapshot {
    pub dpad: DPad,
    pub sticks: Sticks,
    /// Square: rotate counter-clockwise
    pub square: bool,
    /// Circle: rotate clockwise
    pub circle: bool,
    /// Cross: descend
    pub cross: bool,
    /// Triangle: climb
    pub triangle: bool,
    /// Right shoulder
    pub takeoff: bool,
    /// Left shoulder
    pub land: bool,
    /// Left trigger travel in [0.0, 1.0]; toggles the operating mode
    pub mode_trigger: f32,
    /// Right trigger travel in [0.0, 1.0]; forwards the last scan
    pub capture_trigger: f32,
}

/// Source of control snapshots
pub trait ControlInput {
    /// Refresh device state; `None` when no gamepad is connected
    fn poll(&mut self) -> Option<ControlSnapshot>;
}
