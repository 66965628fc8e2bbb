//! Frame Monitor
//!
//! Runs on its own OS thread: acquire a frame, look for codes, show it.
//! The thread is never joined; it checks the stop token between frames.

use std::thread;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::detector::CodeDetector;
use super::display::FrameSink;
use super::source::FrameSource;

/// Counters reported when the monitor stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    pub frames: u64,
    pub codes: u64,
    pub errors: u64,
}

pub struct FrameMonitor {
    source: Box<dyn FrameSource>,
    detector: CodeDetector,
    retry_delay: Duration,
    stop: CancellationToken,
}

impl FrameMonitor {
    pub fn new(
        source: Box<dyn FrameSource>,
        detector: CodeDetector,
        retry_delay: Duration,
        stop: CancellationToken,
    ) -> Self {
        Self {
            source,
            detector,
            retry_delay,
            stop,
        }
    }

    /// Start the monitor on a detached thread
    ///
    /// The sink is built on that thread, since windows cannot move between
    /// threads on every platform.
    pub fn spawn<F>(self, make_sink: F) -> std::io::Result<()>
    where
        F: FnOnce() -> Box<dyn FrameSink> + Send + 'static,
    {
        thread::Builder::new()
            .name("frame-monitor".into())
            .spawn(move || {
                let mut sink = make_sink();
                let stats = self.run(sink.as_mut());
                info!(
                    "[VIDEO] Monitor stopped: {} frames, {} codes, {} errors",
                    stats.frames, stats.codes, stats.errors
                );
            })?;
        Ok(())
    }

    /// Process frames until the stop token is cancelled
    pub fn run(mut self, sink: &mut dyn FrameSink) -> MonitorStats {
        let mut stats = MonitorStats::default();

        while !self.stop.is_cancelled() {
            match self.source.next_frame() {
                Ok(Some(mut frame)) => {
                    let codes = self.detector.detect(&mut frame);
                    for code in &codes {
                        debug!("[VIDEO] Code in view: {}", code);
                    }
                    stats.codes += codes.len() as u64;
                    stats.frames += 1;

                    match sink.render(&frame) {
                        Ok(true) => {}
                        Ok(false) => {
                            info!("[VIDEO] Viewer closed, requesting shutdown");
                            self.stop.cancel();
                        }
                        Err(e) => error!("[VIDEO] Render failed: {:#}", e),
                    }
                }
                Ok(None) => thread::yield_now(),
                Err(e) => {
                    error!("[VIDEO] Error in video stream: {:#}", e);
                    stats.errors += 1;
                    thread::sleep(self.retry_delay);
                }
            }
        }

        stats
    }
}
