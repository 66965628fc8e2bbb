//! Viewer for annotated frames

use anyhow::Result;
use image::RgbImage;
use tracing::debug;

/// Anything that can show a frame
pub trait FrameSink {
    /// Show `frame`; `Ok(false)` once the operator has closed the viewer
    fn render(&mut self, frame: &RgbImage) -> Result<bool>;
}

/// Headless sink: counts frames and logs now and then
#[cfg(any(test, not(feature = "window")))]
#[derive(Debug, Default)]
pub struct LogSink {
    frames: u64,
}

#[cfg(any(test, not(feature = "window")))]
impl FrameSink for LogSink {
    fn render(&mut self, frame: &RgbImage) -> Result<bool> {
        self.frames += 1;
        if self.frames % 300 == 1 {
            debug!(
                "[VIDEO] Frame {} ({}x{})",
                self.frames,
                frame.width(),
                frame.height()
            );
        }
        Ok(true)
    }
}

#[cfg(feature = "window")]
pub use window::WindowSink;

#[cfg(feature = "window")]
mod window {
    use super::FrameSink;
    use anyhow::{anyhow, Result};
    use image::RgbImage;
    use minifb::{Key, Window, WindowOptions};
    use tracing::info;

    /// Desktop window, opened on the first frame
    pub struct WindowSink {
        title: String,
        window: Option<Window>,
        buffer: Vec<u32>,
    }

    impl WindowSink {
        pub fn new(title: impl Into<String>) -> Self {
            Self {
                title: title.into(),
                window: None,
                buffer: Vec::new(),
            }
        }
    }

    impl FrameSink for WindowSink {
        fn render(&mut self, frame: &RgbImage) -> Result<bool> {
            let (width, height) = (frame.width() as usize, frame.height() as usize);

            if self.window.is_none() {
                let window = Window::new(&self.title, width, height, WindowOptions::default())
                    .map_err(|e| anyhow!("open viewer window: {}", e))?;
                info!("[VIDEO] Viewer window opened ({}x{})", width, height);
                self.window = Some(window);
            }
            let Some(window) = self.window.as_mut() else {
                return Ok(false);
            };

            if !window.is_open() || window.is_key_down(Key::Escape) {
                return Ok(false);
            }

            self.buffer.clear();
            self.buffer.extend(frame.pixels().map(|p| {
                let [r, g, b] = p.0;
                (r as u32) << 16 | (g as u32) << 8 | b as u32
            }));

            window
                .update_with_buffer(&self.buffer, width, height)
                .map_err(|e| anyhow!("update viewer window: {}", e))?;
            Ok(true)
        }
    }
}

/// The sink used by the binary: a window when built with `window`
pub fn default_sink(title: &str) -> Box<dyn FrameSink> {
    #[cfg(feature = "window")]
    {
        Box::new(WindowSink::new(title))
    }
    #[cfg(not(feature = "window"))]
    {
        debug!("[VIDEO] Built without a viewer, frames for '{}' are not shown", title);
        Box::new(LogSink::default())
    }
}
