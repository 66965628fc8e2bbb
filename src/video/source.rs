//! Frame acquisition
//!
//! The drone pushes raw H.264 over UDP once `streamon` is acknowledged.
//! Decoding is delegated to an `ffmpeg` child process that writes fixed-size
//! RGB24 frames to its stdout.

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use scout_shared::{endpoints, timing};
use std::io::Read;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the video feed
#[derive(Debug, Clone)]
pub struct VideoConfig {
    /// Stream URL handed to ffmpeg
    pub stream_url: String,
    /// Output frame width
    pub width: u32,
    /// Output frame height
    pub height: u32,
    /// Back-off after a failed acquisition
    pub retry_delay: Duration,
    /// Title of the viewer window
    pub window_title: String,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            stream_url: endpoints::VIDEO_STREAM_URL.into(),
            width: 960,
            height: 720,
            retry_delay: Duration::from_millis(timing::FRAME_RETRY_DELAY_MS),
            window_title: "Tello Camera Feed".into(),
        }
    }
}

/// Anything that yields decoded frames
pub trait FrameSource: Send {
    /// Block for the next frame; `Ok(None)` when no frame is available yet
    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Frames decoded by an `ffmpeg` child process
pub struct FfmpegSource {
    config: VideoConfig,
    child: Option<Child>,
    stdout: Option<ChildStdout>,
}

impl FfmpegSource {
    pub fn new(config: VideoConfig) -> Self {
        Self {
            config,
            child: None,
            stdout: None,
        }
    }

    fn frame_len(&self) -> usize {
        self.config.width as usize * self.config.height as usize * 3
    }

    fn spawn(&mut self) -> Result<()> {
        let scale = format!("scale={}:{}", self.config.width, self.config.height);

        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-fflags")
            .arg("nobuffer")
            .arg("-flags")
            .arg("low_delay")
            .arg("-i")
            .arg(&self.config.stream_url)
            .arg("-an")
            .arg("-vf")
            .arg(&scale)
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-f")
            .arg("rawvideo")
            .arg("-")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());

        let mut child = cmd.spawn().context("spawn ffmpeg decoder")?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stdout not captured"))?;

        info!("[VIDEO] Decoder started for {}", self.config.stream_url);
        self.child = Some(child);
        self.stdout = Some(stdout);
        Ok(())
    }

    fn stop(&mut self) {
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("[VIDEO] Decoder already gone: {}", e);
            }
            let _ = child.wait();
        }
    }
}

impl FrameSource for FfmpegSource {
    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.stdout.is_none() {
            self.spawn()?;
        }

        let mut data = vec![0u8; self.frame_len()];
        let read = match self.stdout.as_mut() {
            Some(stdout) => stdout.read_exact(&mut data),
            None => return Ok(None),
        };

        if let Err(e) = read {
            warn!("[VIDEO] Decoder stream ended: {}", e);
            self.stop();
            return Err(anyhow!("video decoder stopped: {}", e));
        }

        Ok(RgbImage::from_raw(self.config.width, self.config.height, data))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VideoConfig::default();
        assert_eq!(config.stream_url, "udp://0.0.0.0:11111");
        assert_eq!((config.width, config.height), (960, 720));
        assert_eq!(config.retry_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_frame_len() {
        let source = FfmpegSource::new(VideoConfig {
            width: 4,
            height: 2,
            ..Default::default()
        });
        assert_eq!(source.frame_len(), 24);
    }
}
