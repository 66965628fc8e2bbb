//! Command Dispatcher
//!
//! Polls the gamepad once per cycle and turns what it sees into flight
//! commands. Each cycle runs in a fixed order: reconnect, discrete triggers,
//! directional moves, capture.
//!
//! A transport failure on any flight command marks the link lost and ends the
//! cycle early; the next cycle tries to reconnect before anything else. A
//! command the drone refuses is logged and the cycle goes on.

use scout_shared::{timing, OperatingMode};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::debounce::Debounce;
use crate::connection::ConnectionManager;
use crate::input::{ControlInput, ControlSnapshot, DPad};
use crate::telemetry::TelemetryForwarder;
use crate::tello::{Direction, FlightCommand, FlightLink, Rotation};
use crate::video::ScanSlot;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Polling period
    pub cycle: Duration,
    /// Pause after a failed reconnection attempt
    pub reconnect_delay: Duration,
    /// Debounce window for takeoff and land
    pub flight_debounce: Duration,
    /// Debounce window for the mode toggle
    pub mode_debounce: Duration,
    /// Trigger travel above which L2/R2 count as pressed
    pub trigger_threshold: f32,
    /// Straight-line step for D-pad and climb/descend
    pub move_cm: u32,
    /// Yaw step for the rotate buttons
    pub rotate_deg: u32,
    /// Per-axis offset of a diagonal move
    pub diagonal_cm: i32,
    /// Speed of a diagonal move in cm/s
    pub diagonal_speed: u32,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            cycle: Duration::from_millis(timing::DISPATCH_CYCLE_MS),
            reconnect_delay: Duration::from_millis(timing::RECONNECT_DELAY_MS),
            flight_debounce: Duration::from_millis(timing::FLIGHT_TRIGGER_DEBOUNCE_MS),
            mode_debounce: Duration::from_millis(timing::MODE_TOGGLE_DEBOUNCE_MS),
            trigger_threshold: 0.5,
            move_cm: 20,
            rotate_deg: 30,
            // Tello ignores `go` when x, y and z all fall within ±20
            diagonal_cm: 30,
            diagonal_speed: 50,
        }
    }
}

/// How a cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No gamepad connected
    NoInput,
    /// Link down and reconnection failed; nothing was issued
    Degraded,
    /// A command lost the link; the rest of the cycle was skipped
    LinkLost,
    Completed,
}

/// Per-cycle gates that survive between cycles
struct Session {
    mode: OperatingMode,
    takeoff: Debounce,
    land: Debounce,
    mode_toggle: Debounce,
}

pub struct CommandDispatcher<L: FlightLink> {
    config: DispatchConfig,
    connection: ConnectionManager<L>,
    forwarder: TelemetryForwarder,
    slot: ScanSlot,
    session: Session,
}

impl<L: FlightLink> CommandDispatcher<L> {
    pub fn new(
        config: DispatchConfig,
        connection: ConnectionManager<L>,
        forwarder: TelemetryForwarder,
        slot: ScanSlot,
    ) -> Self {
        let session = Session {
            mode: OperatingMode::default(),
            takeoff: Debounce::new(config.flight_debounce),
            land: Debounce::new(config.flight_debounce),
            mode_toggle: Debounce::new(config.mode_debounce),
        };
        Self {
            config,
            connection,
            forwarder,
            slot,
            session,
        }
    }

    /// Current operating mode
    #[cfg(test)]
    pub fn mode(&self) -> OperatingMode {
        self.session.mode
    }

    #[cfg(test)]
    pub fn connection(&self) -> &ConnectionManager<L> {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut ConnectionManager<L> {
        &mut self.connection
    }

    /// Run cycles until the stop token is cancelled
    ///
    /// Reconnection only re-checks the battery, so the drone must already
    /// have accepted the SDK handshake; without an established session this
    /// returns at once.
    pub async fn run<I: ControlInput>(&mut self, input: &mut I, stop: &CancellationToken) {
        if !self.connection.ever_connected() {
            error!("[DISPATCH] No drone session established, not starting control loop");
            return;
        }

        info!(
            "[DISPATCH] Control loop started (cycle {:?}, mode {})",
            self.config.cycle, self.session.mode
        );

        while !stop.is_cancelled() {
            let outcome = self.cycle(input.poll()).await;
            let pause = match outcome {
                CycleOutcome::Degraded => self.config.reconnect_delay,
                _ => self.config.cycle,
            };

            tokio::select! {
                _ = stop.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        info!("[DISPATCH] Control loop stopped");
    }

    /// One dispatcher cycle over a freshly polled snapshot
    pub async fn cycle(&mut self, snapshot: Option<ControlSnapshot>) -> CycleOutcome {
        let Some(snapshot) = snapshot else {
            warn!("No joystick connected");
            return CycleOutcome::NoInput;
        };

        if !self.connection.is_connected() {
            info!("Drone disconnected, attempting to reconnect...");
            if !self.connection.verify().await {
                return CycleOutcome::Degraded;
            }
        }

        let now = Instant::now();

        if self.session.takeoff.fire(snapshot.takeoff, now) {
            info!("Taking off");
            if !self.issue(FlightCommand::Takeoff).await {
                return CycleOutcome::LinkLost;
            }
        }

        if self.session.land.fire(snapshot.land, now) {
            info!("Landing");
            if !self.issue(FlightCommand::Land).await {
                return CycleOutcome::LinkLost;
            }
        }

        let toggle_pressed = snapshot.mode_trigger > self.config.trigger_threshold;
        if self.session.mode_toggle.fire(toggle_pressed, now) {
            self.session.mode = self.session.mode.toggled();
            info!("Mode switched to: {}", self.session.mode);
        }

        if let Some(command) = self.dpad_command(&snapshot.dpad) {
            if !self.issue(command).await {
                return CycleOutcome::LinkLost;
            }
        }

        if let Some(command) = self.face_command(&snapshot) {
            if !self.issue(command).await {
                return CycleOutcome::LinkLost;
            }
        }

        if snapshot.capture_trigger > self.config.trigger_threshold {
            match self.slot.take() {
                Some(payload) => {
                    info!("Capturing QR code: {}", payload);
                    self.forwarder.forward(&payload, self.session.mode).await;
                }
                None => debug!("Capture pressed with no code in view"),
            }
        }

        CycleOutcome::Completed
    }

    /// Send one flight command
    ///
    /// Returns false if the link was lost.
    async fn issue(&mut self, command: FlightCommand) -> bool {
        match self.connection.link().execute(&command).await {
            Ok(_) => {
                debug!("[DISPATCH] {} acknowledged", command);
                true
            }
            Err(e) if e.is_link_loss() => {
                error!("Drone communication error: {}", e);
                self.connection.mark_lost(&e);
                false
            }
            Err(e) => {
                warn!("Command not executed: {}", e);
                true
            }
        }
    }

    /// Diagonals first, then single directions
    fn dpad_command(&self, dpad: &DPad) -> Option<FlightCommand> {
        let d = self.config.diagonal_cm;
        let diagonal = match (dpad.up, dpad.down, dpad.left, dpad.right) {
            (true, false, true, false) => Some((d, d)),
            (true, false, false, true) => Some((d, -d)),
            (false, true, true, false) => Some((-d, d)),
            (false, true, false, true) => Some((-d, -d)),
            _ => None,
        };
        if let Some((x, y)) = diagonal {
            return Some(FlightCommand::Go {
                x,
                y,
                z: 0,
                speed: self.config.diagonal_speed,
            });
        }

        let direction = if dpad.up {
            Direction::Forward
        } else if dpad.down {
            Direction::Back
        } else if dpad.left {
            Direction::Left
        } else if dpad.right {
            Direction::Right
        } else {
            return None;
        };
        Some(FlightCommand::Move {
            direction,
            cm: self.config.move_cm,
        })
    }

    /// First pressed face button wins
    fn face_command(&self, snapshot: &ControlSnapshot) -> Option<FlightCommand> {
        let degrees = self.config.rotate_deg;
        let cm = self.config.move_cm;

        if snapshot.square {
            Some(FlightCommand::Rotate { rotation: Rotation::CounterClockwise, degrees })
        } else if snapshot.circle {
            Some(FlightCommand::Rotate { rotation: Rotation::Clockwise, degrees })
        } else if snapshot.cross {
            Some(FlightCommand::Move { direction: Direction::Down, cm })
        } else if snapshot.triangle {
            Some(FlightCommand::Move { direction: Direction::Up, cm })
        } else {
            None
        }
    }
}
