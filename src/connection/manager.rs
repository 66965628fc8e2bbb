//! Connection manager for the flight link
//!
//! Owns the link state machine. Reconnection is driven from outside: the
//! dispatcher calls `verify` whenever it finds the link down.

use scout_shared::state_machine::{LinkEvent, LinkStateMachine, TransitionResult};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::tello::{FlightCommand, FlightError, FlightLink};

pub struct ConnectionManager<L: FlightLink> {
    link: Arc<L>,
    fsm: LinkStateMachine,
}

impl<L: FlightLink> ConnectionManager<L> {
    pub fn new(link: Arc<L>) -> Self {
        Self {
            link,
            fsm: LinkStateMachine::new(),
        }
    }

    /// Put the drone into SDK mode
    pub async fn connect(&mut self) -> bool {
        info!("Attempting to connect to Tello...");

        match self.link.execute(&FlightCommand::EnterSdk).await {
            Ok(_) => {
                info!("Initial connection successful");
                self.apply(LinkEvent::HandshakeAccepted);
                true
            }
            Err(e) => {
                error!("Initial connection failed: {}", e);
                self.apply(LinkEvent::HandshakeFailed { reason: e.to_string() });
                false
            }
        }
    }

    /// Startup sequence: SDK handshake, battery check, video stream on
    ///
    /// Returns false if the handshake or the check failed. A stream that will
    /// not start is only logged.
    pub async fn establish(&mut self) -> bool {
        if !self.connect().await {
            error!("Failed to establish initial connection with the drone");
            return false;
        }
        if !self.verify().await {
            error!("Failed to verify drone connection");
            return false;
        }

        info!("Tello connected successfully");
        match self.link.execute(&FlightCommand::StreamOn).await {
            Ok(_) => info!("Video stream started"),
            Err(e) => warn!("Failed to start video stream: {}", e),
        }
        true
    }

    /// Query the battery to confirm the drone answers
    pub async fn verify(&mut self) -> bool {
        match self.link.battery().await {
            Ok(level) => {
                info!("Drone battery level: {}%", level);
                self.apply(LinkEvent::VerifySucceeded);
                true
            }
            Err(e) => {
                error!("Failed to connect to drone: {}", e);
                self.apply(LinkEvent::VerifyFailed { reason: e.to_string() });
                false
            }
        }
    }

    /// Record a transport failure seen while issuing a flight command
    pub fn mark_lost(&mut self, err: &FlightError) {
        self.apply(LinkEvent::CommandLost { reason: err.to_string() });
    }

    #[cfg(test)]
    pub fn state(&self) -> scout_shared::state_machine::LinkState {
        self.fsm.state()
    }

    pub fn is_connected(&self) -> bool {
        self.fsm.is_connected()
    }

    pub fn ever_connected(&self) -> bool {
        self.fsm.ever_connected()
    }

    pub fn link(&self) -> &L {
        &self.link
    }

    /// Land and stop the stream, if the drone was ever reachable
    pub async fn shutdown(&mut self) {
        if !self.ever_connected() {
            info!("Drone never connected, skipping landing");
            return;
        }

        for command in [FlightCommand::Land, FlightCommand::StreamOff] {
            if let Err(e) = self.link.execute(&command).await {
                error!("Error during cleanup ({}): {}", command, e);
            }
        }
    }

    fn apply(&mut self, event: LinkEvent) {
        match self.fsm.process_event(event) {
            TransitionResult::Established => info!("[LINK] Drone link established"),
            TransitionResult::Lost { reason } => warn!("[LINK] Drone link lost: {}", reason),
            TransitionResult::Unchanged(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tello::fake::FakeLink;
    use scout_shared::state_machine::LinkState;

    #[tokio::test]
    async fn test_connect_and_verify() {
        let mut manager = ConnectionManager::new(Arc::new(FakeLink::online()));

        assert!(manager.connect().await);
        assert!(manager.verify().await);
        assert!(manager.is_connected());
        assert_eq!(manager.link().sent_sdk(), vec!["command", "battery?"]);
    }

    #[tokio::test]
    async fn test_offline_drone_stays_disconnected() {
        let mut manager = ConnectionManager::new(Arc::new(FakeLink::offline()));

        assert!(!manager.connect().await);
        assert!(!manager.verify().await);
        assert_eq!(manager.state(), LinkState::Disconnected);
        assert!(!manager.ever_connected());
    }

    #[tokio::test]
    async fn test_establish_starts_stream() {
        let link = Arc::new(FakeLink::online());
        let mut manager = ConnectionManager::new(link.clone());

        assert!(manager.establish().await);
        assert_eq!(link.sent_sdk(), vec!["command", "battery?", "streamon"]);
    }

    #[tokio::test]
    async fn test_establish_stops_at_failed_handshake() {
        let link = Arc::new(FakeLink::offline());
        let mut manager = ConnectionManager::new(link.clone());

        assert!(!manager.establish().await);
        assert_eq!(link.sent_sdk(), vec!["command"]);
        assert!(!manager.ever_connected());
    }

    #[tokio::test]
    async fn test_establish_stops_at_failed_verify() {
        let link = Arc::new(FakeLink::online());
        link.refuse("battery");
        let mut manager = ConnectionManager::new(link.clone());

        assert!(!manager.establish().await);
        assert_eq!(link.sent_sdk(), vec!["command", "battery?"]);
    }

    #[tokio::test]
    async fn test_stream_failure_does_not_fail_establish() {
        let link = Arc::new(FakeLink::online());
        link.refuse("streamon");
        let mut manager = ConnectionManager::new(link.clone());

        assert!(manager.establish().await);
        assert!(manager.is_connected());
    }

    #[tokio::test]
    async fn test_lost_then_recovered() {
        let link = Arc::new(FakeLink::online());
        let mut manager = ConnectionManager::new(link.clone());
        manager.verify().await;

        manager.mark_lost(&FlightError::Timeout { command: "up 20".into(), attempts: 3 });
        assert!(!manager.is_connected());
        assert!(manager.ever_connected());

        assert!(manager.verify().await);
        assert!(manager.is_connected());
    }

    #[tokio::test]
    async fn test_shutdown_skipped_when_never_connected() {
        let link = Arc::new(FakeLink::offline());
        let mut manager = ConnectionManager::new(link.clone());
        manager.verify().await;
        link.clear();

        manager.shutdown().await;
        assert!(link.sent().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_lands_even_when_land_fails() {
        let link = Arc::new(FakeLink::online());
        let mut manager = ConnectionManager::new(link.clone());
        manager.verify().await;
        link.refuse("land");
        link.clear();

        manager.shutdown().await;
        assert_eq!(link.sent_sdk(), vec!["land", "streamoff"]);
    }
}
