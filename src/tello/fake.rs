//! In-memory flight link for tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::commands::FlightCommand;
use super::connection::{FlightError, FlightLink};

/// Records every command; can be taken offline or told to refuse commands
#[derive(Debug, Default)]
pub struct FakeLink {
    sent: Mutex<Vec<FlightCommand>>,
    offline: AtomicBool,
    refused: Mutex<Vec<String>>,
}

impl FakeLink {
    pub fn online() -> Self {
        Self::default()
    }

    pub fn offline() -> Self {
        let link = Self::default();
        link.set_online(false);
        link
    }

    pub fn set_online(&self, online: bool) {
        self.offline.store(!online, Ordering::SeqCst);
    }

    /// Refuse commands whose SDK text starts with `prefix`
    pub fn refuse(&self, prefix: &str) {
        self.refused.lock().unwrap().push(prefix.to_string());
    }

    pub fn sent(&self) -> Vec<FlightCommand> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_sdk(&self) -> Vec<String> {
        self.sent().iter().map(FlightCommand::to_sdk).collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }
}

#[async_trait]
impl FlightLink for FakeLink {
    async fn execute(&self, command: &FlightCommand) -> Result<String, FlightError> {
        self.sent.lock().unwrap().push(command.clone());
        let text = command.to_sdk();

        if self.offline.load(Ordering::SeqCst) {
            return Err(FlightError::Timeout { command: text, attempts: 1 });
        }
        if self.refused.lock().unwrap().iter().any(|p| text.starts_with(p.as_str())) {
            return Err(FlightError::Rejected { command: text, reply: "error".into() });
        }

        Ok(match command {
            FlightCommand::QueryBattery => "80".into(),
            _ => "ok".into(),
        })
    }
}
