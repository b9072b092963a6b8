//! The recorder widget loop.
//!
//! Single-threaded event dispatch: one loop drains capture events, polls
//! keyboard input, polls the elapsed-time ticker and renders. All state
//! transitions happen on this loop, serially. Supports an external record
//! toggle via SIGUSR1.

use crate::bridge::{CommandTrigger, FileSlotPublisher, Publisher, Trigger};
use crate::config::OvrConfig;
use crate::recording::{
    BlobStore, CaptureEvent, ElapsedTicker, FragmentOutcome, MicCapture, RecorderTui,
    RecordingSession, WidgetCommand,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long quit waits for an in-flight finalize before giving up.
const QUIESCE_TIMEOUT: Duration = Duration::from_secs(2);

/// Opens the recorder widget and runs it until the user quits.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If the terminal UI cannot be initialized
pub async fn handle_record(title_override: Option<String>) -> Result<(), anyhow::Error> {
    tracing::info!("=== ovr Recorder Widget Started ===");

    let config = match OvrConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            eprintln!("Configuration error: {err}");
            eprintln!("Please check your ~/.config/ovr/ovr.toml file and try again.");
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    let title = title_override.unwrap_or_else(|| config.widget.title.clone());
    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, title={:?}, done_stops_recording={}",
        config.audio.device,
        config.audio.sample_rate,
        title,
        config.widget.done_stops_recording
    );

    let mut publisher = FileSlotPublisher::new(config.state_file()?);
    let mut trigger = CommandTrigger::new(config.host.on_done.clone());

    run_widget(&config, title, &mut publisher, &mut trigger).await
}

/// The widget proper, with the host bridge injected so tests and alternative
/// hosts can substitute their own slot and trigger.
async fn run_widget(
    config: &OvrConfig,
    title: String,
    publisher: &mut dyn Publisher,
    trigger: &mut dyn Trigger,
) -> Result<(), anyhow::Error> {
    let blobs = BlobStore::new(config.recordings_dir());

    let mut session = RecordingSession::new();
    let mut ticker = ElapsedTicker::new();
    let (events_tx, events_rx): (Sender<CaptureEvent>, Receiver<CaptureEvent>) =
        std::sync::mpsc::channel();

    // The live capture for the current session, and captures of stopped
    // sessions still awaiting their finalize-complete event. The hardware
    // stream is released when its capture is dropped.
    let mut capture: Option<MicCapture> = None;
    let mut finalizing: Vec<MicCapture> = Vec::new();

    let external_toggle = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&external_toggle))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut tui = RecorderTui::new(title)
        .map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    tracing::debug!(
        "Entering widget loop. Space/Enter toggles recording, 'd' signals done, 'q' quits."
    );
    let mut quitting = false;
    let mut quit_deadline: Option<Instant> = None;
    let mut frame_count = 0u64;

    loop {
        // Capture events first; handlers run serially on this loop. FIFO
        // order means finalize-complete is seen after every fragment queued
        // before the finalize signal, and the slot write happens after it.
        while let Ok(event) = events_rx.try_recv() {
            let finalized_epoch = match &event {
                CaptureEvent::FinalizeComplete { epoch } => Some(*epoch),
                CaptureEvent::Fragment { .. } => None,
            };
            let sample_rate = finalized_epoch
                .and_then(|epoch| finalizing.iter().find(|c| c.epoch() == epoch))
                .map(|c| c.sample_rate())
                .unwrap_or(config.audio.sample_rate);

            if let Err(message) =
                apply_capture_event(event, &mut session, &blobs, publisher, sample_rate)
            {
                tui.set_error(message);
            }

            // Finalize done: release the session's microphone stream.
            if let Some(epoch) = finalized_epoch {
                finalizing.retain(|c| c.epoch() != epoch);
            }
        }

        if quitting {
            if !session.is_recording() && !session.has_pending_finalize() && finalizing.is_empty()
            {
                break;
            }
            if quit_deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                tracing::warn!("Quit timed out waiting for finalize; abandoning session");
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            continue;
        }

        if external_toggle.swap(false, Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: toggling recording");
            toggle_recording(
                config,
                &mut session,
                &mut ticker,
                &mut tui,
                &events_tx,
                &mut capture,
                &mut finalizing,
            );
        }

        match tui.handle_input() {
            Ok(WidgetCommand::Continue) => {
                frame_count += 1;
                if frame_count % 60 == 0 && session.is_recording() {
                    tracing::debug!("Recording, elapsed display {}", ticker.display());
                }
            }
            Ok(WidgetCommand::ToggleRecording) => {
                toggle_recording(
                    config,
                    &mut session,
                    &mut ticker,
                    &mut tui,
                    &events_tx,
                    &mut capture,
                    &mut finalizing,
                );
            }
            Ok(WidgetCommand::Done) => {
                // Done never consults recording state; optionally it stops an
                // in-progress session first when configured to.
                if config.widget.done_stops_recording && session.is_recording() {
                    stop_recording(&mut session, &mut ticker, &mut capture, &mut finalizing);
                }
                if let Err(e) = trigger.fire() {
                    tracing::error!("Completion trigger failed: {e}");
                }
            }
            Ok(WidgetCommand::Quit) => {
                // Stop and drain first so an in-progress session still gets
                // its FinalRecording published.
                stop_recording(&mut session, &mut ticker, &mut capture, &mut finalizing);
                quitting = true;
                quit_deadline = Some(Instant::now() + QUIESCE_TIMEOUT);
                continue;
            }
            Err(e) => {
                tracing::error!("Input handling error: {}", e);
                tui.cleanup().ok();
                return Err(anyhow::anyhow!("Input handling error: {e}"));
            }
        }

        ticker.poll(session.started_at(), Instant::now());

        let elapsed = ticker.display().to_string();
        tui.render(session.is_recording(), &elapsed)
            .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;
    }

    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;

    tracing::info!("=== ovr Recorder Widget Exited ===");
    Ok(())
}

/// Applies one capture event to the session.
///
/// Fragments append in arrival order; late ones are dropped with a
/// diagnostic. Finalize-complete concatenates the session's fragments,
/// stores the recording and publishes its URL to the host slot — exactly
/// once per stopped session, since `finalize_complete` yields at most once
/// per epoch. Returns a user-visible message when saving or publishing
/// fails.
fn apply_capture_event(
    event: CaptureEvent,
    session: &mut RecordingSession,
    blobs: &BlobStore,
    publisher: &mut dyn Publisher,
    sample_rate: u32,
) -> Result<(), String> {
    match event {
        CaptureEvent::Fragment { epoch, samples } => {
            if session.push_fragment(epoch, samples) == FragmentOutcome::Late {
                tracing::debug!("Dropped late fragment for session {}", epoch);
            }
            Ok(())
        }
        CaptureEvent::FinalizeComplete { epoch } => {
            let Some(fragments) = session.finalize_complete(epoch) else {
                tracing::warn!("Finalize-complete for unknown session {}", epoch);
                return Ok(());
            };
            let url = blobs.store(epoch, sample_rate, &fragments).map_err(|e| {
                tracing::error!("Failed to save recording: {e}");
                format!("Failed to save recording: {e}")
            })?;
            publisher.publish(&url).map_err(|e| {
                tracing::error!("Failed to publish recording URL: {e}");
                format!("Failed to publish recording: {e}")
            })
        }
    }
}

/// Starts a session if idle, stops it if recording.
fn toggle_recording(
    config: &OvrConfig,
    session: &mut RecordingSession,
    ticker: &mut ElapsedTicker,
    tui: &mut RecorderTui,
    events_tx: &Sender<CaptureEvent>,
    capture: &mut Option<MicCapture>,
    finalizing: &mut Vec<MicCapture>,
) {
    if session.is_recording() {
        stop_recording(session, ticker, capture, finalizing);
        return;
    }

    // Microphone first: a failed request must leave the session untouched.
    match MicCapture::start(
        &config.audio.device,
        config.audio.sample_rate,
        session.next_epoch(),
        events_tx.clone(),
    ) {
        Ok(live) => {
            let now = Instant::now();
            match session.start(now) {
                Ok(epoch) => {
                    ticker.start(now);
                    tui.clear_error();
                    *capture = Some(live);
                    tracing::info!("Recording session {} started", epoch);
                }
                Err(e) => {
                    // Unreachable given the is_recording() check above; the
                    // stream is dropped and the mic released.
                    tracing::warn!("Session start rejected: {e}");
                }
            }
        }
        Err(e) => {
            tracing::error!("Error accessing microphone: {e}");
            tui.set_error(format!("Microphone unavailable: {e}"));
        }
    }
}

/// Synchronously flips the session to idle, resets the readout and signals
/// the capture side to finalize. No-op while idle.
fn stop_recording(
    session: &mut RecordingSession,
    ticker: &mut ElapsedTicker,
    capture: &mut Option<MicCapture>,
    finalizing: &mut Vec<MicCapture>,
) {
    if let Some(epoch) = session.stop() {
        ticker.reset();
        if let Some(live) = capture.take() {
            live.finalize();
            finalizing.push(live);
        }
        tracing::info!("Recording session {} stopping, finalize signaled", epoch);
    }
}
