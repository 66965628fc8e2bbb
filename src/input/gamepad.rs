//! Physical gamepad via gilrs
//!
//! Only the first gamepad enumerated at startup is used. The mapping is fixed
//! (PlayStation layout names, gilrs positional buttons).

use anyhow::{anyhow, Result};
use gilrs::{Axis, Button, Gamepad, GamepadId, Gilrs};
use tracing::{error, info, warn};

use super::snapshot::{ControlInput, ControlSnapshot, DPad, Sticks};

/// Axes reported by `report`
const REPORTED_AXES: [Axis; 6] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
    Axis::LeftZ,
    Axis::RightZ,
];

/// The operator's gamepad
pub struct GamepadInput {
    gilrs: Gilrs,
    id: GamepadId,
    disconnected_logged: bool,
}

impl GamepadInput {
    /// Open the first connected gamepad
    pub fn open() -> Result<Self> {
        let gilrs = Gilrs::new().map_err(|e| anyhow!("Gamepad support unavailable: {}", e))?;

        let (id, name) = gilrs
            .gamepads()
            .next()
            .map(|(id, pad)| (id, pad.name().to_string()))
            .ok_or_else(|| anyhow!("No joystick connected"))?;

        info!("Gamepad detected: {}", name);

        Ok(Self {
            gilrs,
            id,
            disconnected_logged: false,
        })
    }

    /// Log every axis the pad exposes and its resting value
    pub fn report(&self) {
        let Some(pad) = self.gilrs.connected_gamepad(self.id) else {
            warn!("Gamepad disconnected before report");
            return;
        };

        let present: Vec<Axis> = REPORTED_AXES
            .into_iter()
            .filter(|axis| pad.axis_data(*axis).is_some())
            .collect();
        info!("Number of axes: {}", present.len());

        for axis in REPORTED_AXES {
            match pad.axis_data(axis) {
                Some(data) => info!("Axis {:?} value: {}", axis, data.value()),
                None => error!("Axis {:?} does not exist on this gamepad, reading 0", axis),
            }
        }
    }
}

impl ControlInput for GamepadInput {
    fn poll(&mut self) -> Option<ControlSnapshot> {
        // Drain the event queue so cached state is current
        while self.gilrs.next_event().is_some() {}

        let Some(pad) = self.gilrs.connected_gamepad(self.id) else {
            if !self.disconnected_logged {
                warn!("Gamepad disconnected");
                self.disconnected_logged = true;
            }
            return None;
        };
        self.disconnected_logged = false;

        Some(snapshot(&pad))
    }
}

fn snapshot(pad: &Gamepad<'_>) -> ControlSnapshot {
    ControlSnapshot {
        dpad: DPad {
            up: pad.is_pressed(Button::DPadUp),
            down: pad.is_pressed(Button::DPadDown),
            left: pad.is_pressed(Button::DPadLeft),
            right: pad.is_pressed(Button::DPadRight),
        },
        sticks: Sticks {
            left_right: read_axis(pad, Axis::LeftStickX),
            forward_back: read_axis(pad, Axis::LeftStickY),
            up_down: read_axis(pad, Axis::RightStickX),
            yaw: read_axis(pad, Axis::RightStickY),
        },
        square: pad.is_pressed(Button::West),
        circle: pad.is_pressed(Button::East),
        cross: pad.is_pressed(Button::South),
        triangle: pad.is_pressed(Button::North),
        takeoff: pad.is_pressed(Button::RightTrigger),
        land: pad.is_pressed(Button::LeftTrigger),
        mode_trigger: trigger_travel(pad, Button::LeftTrigger2),
        capture_trigger: trigger_travel(pad, Button::RightTrigger2),
    }
}

/// Missing axes read as centred
fn read_axis(pad: &Gamepad<'_>, axis: Axis) -> f32 {
    pad.axis_data(axis).map(|data| data.value()).unwrap_or(0.0)
}

/// Analog trigger travel; digital-only triggers read 0.0 or 1.0
fn trigger_travel(pad: &Gamepad<'_>, button: Button) -> f32 {
    match pad.button_data(button) {
        Some(data) => data.value(),
        None if pad.is_pressed(button) => 1.0,
        None => 0.0,
    }
}
