//! Latest-detection slot shared between the frame monitor and the dispatcher

use std::sync::{Arc, Mutex, MutexGuard};

/// Single-capacity holder for the most recently decoded code
///
/// Writers overwrite, the reader takes and clears in one step.
#[derive(Debug, Clone, Default)]
pub struct ScanSlot {
    inner: Arc<Mutex<Option<String>>>,
}

impl ScanSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        // A panicking writer cannot leave a half-written Option behind
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the held payload, returning the one it displaced
    pub fn store(&self, payload: String) -> Option<String> {
        self.lock().replace(payload)
    }

    /// Remove and return the held payload
    pub fn take(&self) -> Option<String> {
        self.lock().take()
    }

    /// Copy of the held payload, leaving it in place
    #[cfg(test)]
    pub fn peek(&self) -> Option<String> {
        self.lock().clone()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_last_writer_wins() {
        let slot = ScanSlot::new();
        assert!(slot.store("first".into()).is_none());
        assert_eq!(slot.store("second".into()).as_deref(), Some("first"));
        assert_eq!(slot.peek().as_deref(), Some("second"));
    }

    #[test]
    fn test_take_clears() {
        let slot = ScanSlot::new();
        slot.store("payload".into());

        assert_eq!(slot.take().as_deref(), Some("payload"));
        assert!(slot.is_empty());
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_concurrent_writers_and_reader() {
        let slot = ScanSlot::new();
        let writers: Vec<_> = (0..4)
            .map(|n| {
                let slot = slot.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        slot.store(format!("{}-{}", n, i));
                    }
                })
            })
            .collect();

        let mut taken = Vec::new();
        for _ in 0..100 {
            taken.extend(slot.take());
        }
        for w in writers {
            w.join().unwrap();
        }
        taken.extend(slot.take());

        // Every value read is a whole value from one of the writers
        for value in taken {
            let (writer, seq) = value.split_once('-').expect("torn value");
            assert!(writer.parse::<u32>().unwrap() < 4);
            assert!(seq.parse::<u32>().unwrap() < 100);
        }
    }
}
