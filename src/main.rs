mod command;
mod connection;
mod input;
mod telemetry;
mod tello;
mod video;

use anyhow::{Context, Result};
use command::{CommandDispatcher, DispatchConfig};
use connection::ConnectionManager;
use input::GamepadInput;
use std::future::Future;
use std::sync::Arc;
use telemetry::{ForwarderConfig, TelemetryForwarder};
use tello::{TelloClient, TelloConfig};
use tokio_util::sync::CancellationToken;
use video::{default_sink, CodeDetector, FfmpegSource, FrameMonitor, ScanSlot, VideoConfig};

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let tello_config = TelloConfig::default();
    let video_config = VideoConfig::default();
    let forwarder_config = ForwarderConfig::default();

    info!("QR scout starting");
    info!("  Drone: {}", tello_config.address);
    info!("  Video: {}", video_config.stream_url);
    info!("  Scans: {}", forwarder_config.peer);

    let stop = CancellationToken::new();
    tokio::spawn(cancel_on_interrupt(tokio::signal::ctrl_c(), stop.clone()));

    // Refuse to start without a gamepad
    let mut gamepad = GamepadInput::open()?;

    let forwarder = TelemetryForwarder::bind(forwarder_config)
        .await
        .context("bind scan forwarder socket")?;
    let client = Arc::new(
        TelloClient::bind(tello_config)
            .await
            .context("bind drone command socket")?,
    );
    let slot = ScanSlot::new();

    let mut dispatcher = CommandDispatcher::new(
        DispatchConfig::default(),
        ConnectionManager::new(client),
        forwarder,
        slot.clone(),
    );

    let started = tokio::select! {
        _ = stop.cancelled() => false,
        result = start_session(&mut dispatcher, video_config, slot, stop.clone()) => {
            match result {
                Ok(started) => started,
                Err(e) => {
                    error!("Session start failed: {:#}", e);
                    false
                }
            }
        }
    };

    if started && !stop.is_cancelled() {
        gamepad.report();
        dispatcher.run(&mut gamepad, &stop).await;
    }

    info!("Cleaning up...");
    dispatcher.connection_mut().shutdown().await;
    stop.cancel();
    info!("Cleanup completed");

    Ok(())
}

/// Cancel `stop` once `signal` fires; a handler that failed to install
/// leaves it alone
async fn cancel_on_interrupt<F>(signal: F, stop: CancellationToken)
where
    F: Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("Program interrupted by user");
            stop.cancel();
        }
        Err(e) => error!("Failed to install Ctrl-C handler: {}", e),
    }
}

/// Handshake, verify, start the stream and launch the frame monitor
///
/// Returns false without launching anything if the drone did not answer.
async fn start_session(
    dispatcher: &mut CommandDispatcher<TelloClient>,
    video_config: VideoConfig,
    slot: ScanSlot,
    stop: CancellationToken,
) -> Result<bool> {
    if !dispatcher.connection_mut().establish().await {
        return Ok(false);
    }

    let title = video_config.window_title.clone();
    let monitor = FrameMonitor::new(
        Box::new(FfmpegSource::new(video_config.clone())),
        CodeDetector::new(slot),
        video_config.retry_delay,
        stop,
    );
    monitor
        .spawn(move || default_sink(&title))
        .context("spawn frame monitor thread")?;
    info!("Frame monitor started");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::ready;

    #[tokio::test]
    async fn test_interrupt_cancels() {
        let stop = CancellationToken::new();
        cancel_on_interrupt(ready(Ok(())), stop.clone()).await;
        assert!(stop.is_cancelled());
    }

    #[tokio::test]
    async fn test_failed_handler_install_keeps_running() {
        let stop = CancellationToken::new();
        let failed = ready(Err(std::io::Error::new(std::io::ErrorKind::Other, "no signals")));
        cancel_on_interrupt(failed, stop.clone()).await;
        assert!(!stop.is_cancelled());
    }
}
