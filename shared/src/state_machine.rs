//! Flight Link State Machine
//!
//! Two coarse states, driven only by the outcome of verification and by
//! transport-level command failures. There is no intermediate "connecting"
//! state and no backoff policy here; the caller owns the retry cadence.

/// Whether commands may be issued to the drone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    Connected,
    #[default]
    Disconnected,
}

/// Events that can trigger link transitions
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// SDK-mode handshake acknowledged
    HandshakeAccepted,
    /// SDK-mode handshake failed after all retries
    HandshakeFailed { reason: String },
    /// Status query answered
    VerifySucceeded,
    /// Status query failed
    VerifyFailed { reason: String },
    /// A flight command timed out or the socket failed
    CommandLost { reason: String },
}

/// Result of processing a link event
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionResult {
    /// State did not change
    Unchanged(LinkState),
    /// Link came up
    Established,
    /// Link went down
    Lost { reason: String },
}

/// Tracks the link state and whether it was ever up
#[derive(Debug, Default)]
pub struct LinkStateMachine {
    current_state: LinkState,
    ever_connected: bool,
    consecutive_failures: u32,
}

impl LinkStateMachine {
    /// Create a new state machine in Disconnected state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current state
    pub fn state(&self) -> LinkState {
        self.current_state
    }

    pub fn is_connected(&self) -> bool {
        self.current_state == LinkState::Connected
    }

    /// True once any handshake or verify has succeeded in this process
    pub fn ever_connected(&self) -> bool {
        self.ever_connected
    }

    /// Failed handshakes/verifies/commands since the link was last up
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Process an event and return the transition result
    pub fn process_event(&mut self, event: LinkEvent) -> TransitionResult {
        let previous = self.current_state;

        match event {
            LinkEvent::HandshakeAccepted | LinkEvent::VerifySucceeded => {
                self.current_state = LinkState::Connected;
                self.ever_connected = true;
                self.consecutive_failures = 0;
            }
            LinkEvent::HandshakeFailed { reason }
            | LinkEvent::VerifyFailed { reason }
            | LinkEvent::CommandLost { reason } => {
                self.current_state = LinkState::Disconnected;
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if previous == LinkState::Connected {
                    return TransitionResult::Lost { reason };
                }
            }
        }

        match (previous, self.current_state) {
            (LinkState::Disconnected, LinkState::Connected) => TransitionResult::Established,
            (_, state) => TransitionResult::Unchanged(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let fsm = LinkStateMachine::new();
        assert_eq!(fsm.state(), LinkState::Disconnected);
        assert!(!fsm.ever_connected());
    }

    #[test]
    fn test_connect_then_lose() {
        let mut fsm = LinkStateMachine::new();

        let result = fsm.process_event(LinkEvent::HandshakeAccepted);
        assert_eq!(result, TransitionResult::Established);

        let result = fsm.process_event(LinkEvent::VerifySucceeded);
        assert_eq!(result, TransitionResult::Unchanged(LinkState::Connected));

        let result = fsm.process_event(LinkEvent::CommandLost {
            reason: "timeout".into(),
        });
        assert!(matches!(result, TransitionResult::Lost { .. }));
        assert_eq!(fsm.state(), LinkState::Disconnected);
        assert!(fsm.ever_connected());
    }

    #[test]
    fn test_failures_while_down() {
        let mut fsm = LinkStateMachine::new();

        for _ in 0..3 {
            let result = fsm.process_event(LinkEvent::VerifyFailed {
                reason: "no reply".into(),
            });
            assert_eq!(result, TransitionResult::Unchanged(LinkState::Disconnected));
        }
        assert_eq!(fsm.consecutive_failures(), 3);
        assert!(!fsm.ever_connected());

        fsm.process_event(LinkEvent::VerifySucceeded);
        assert_eq!(fsm.consecutive_failures(), 0);
        assert!(fsm.is_connected());
    }
}
