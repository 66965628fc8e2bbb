//! Time-gated trigger

use std::time::Duration;
use tokio::time::Instant;

/// Lets a held button fire at most once per window
#[derive(Debug, Clone)]
pub struct Debounce {
    window: Duration,
    last_fired: Option<Instant>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_fired: None,
        }
    }

    /// Returns true if the press should act, and starts a new window if so
    pub fn fire(&mut self, pressed: bool, now: Instant) -> bool {
        if !pressed {
            return false;
        }
        let ready = self
            .last_fired
            .map_or(true, |last| now.saturating_duration_since(last) >= self.window);
        if ready {
            self.last_fired = Some(now);
        }
        ready
    }
}
