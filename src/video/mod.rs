//! Video Module
//!
//! Decodes the drone's camera feed, overlays detected QR codes and shows the
//! result. The most recent decoded payload is left in a `ScanSlot` for the
//! dispatcher to pick up.

mod detector;
mod display;
mod monitor;
mod slot;
mod source;

pub use detector::CodeDetector;
pub use display::default_sink;
pub use monitor::FrameMonitor;
pub use slot::ScanSlot;
pub use source::{FfmpegSource, VideoConfig};
