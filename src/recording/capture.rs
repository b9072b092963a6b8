//! Microphone capture built on cpal.
//!
//! Each cpal input callback buffer becomes one fragment, downmixed to mono
//! and delivered onto the widget's event channel tagged with the session
//! epoch. The finalize signal is an atomic flag checked inside the callback:
//! fragments emitted before the signal reach the channel, none after, and a
//! single finalize-complete event follows them in queue order.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

#[cfg(target_os = "linux")]
use std::fs::OpenOptions;
#[cfg(target_os = "linux")]
use std::os::unix::io::AsRawFd;

use super::session::Fragment;

/// Event delivered from the capture side onto the widget's event channel.
///
/// All events are handled serially on the UI loop; the FIFO channel
/// guarantees finalize-complete is seen after every fragment that was queued
/// before the finalize signal.
#[derive(Debug)]
pub enum CaptureEvent {
    /// One mono PCM fragment captured during session `epoch`.
    Fragment { epoch: u64, samples: Fragment },
    /// The capture side has flushed session `epoch`; no further fragments
    /// for it will be queued.
    FinalizeComplete { epoch: u64 },
}

/// A live microphone capture for one recording session.
///
/// Dropping this releases the hardware stream. The owner is expected to keep
/// it alive until the finalize-complete event has been handled.
pub struct MicCapture {
    epoch: u64,
    sample_rate: u32,
    finalize_signal: Arc<AtomicBool>,
    events: Sender<CaptureEvent>,
    // Kept alive for the duration of the capture; dropping stops the hardware.
    _stream: cpal::Stream,
}

impl MicCapture {
    /// Requests microphone access and starts capturing.
    ///
    /// Fragments are tagged with `epoch` and sent to `events`. The device is
    /// opened at its native rate; call `sample_rate()` for the actual value.
    ///
    /// # Errors
    /// - If the specified device is not available
    /// - If device configuration or stream creation fails
    pub fn start(
        device_spec: &str,
        requested_sample_rate: u32,
        epoch: u64,
        events: Sender<CaptureEvent>,
    ) -> Result<Self> {
        // Acquire the device while suppressing ALSA library warnings
        let device = with_alsa_warnings_suppressed(|| {
            let host = cpal::default_host();
            if device_spec == "default" {
                host.default_input_device()
                    .ok_or_else(|| anyhow!("No audio input device available"))
            } else {
                find_device(&host, device_spec)
            }
        })?;

        let device_name = device
            .name()
            .unwrap_or_else(|_| "Unknown device".to_string());
        tracing::info!("Recording device: {}", device_name);

        let device_config = device.default_input_config()?;
        let sample_rate = device_config.sample_rate().0;
        let channels = device_config.channels() as usize;

        if sample_rate != requested_sample_rate {
            tracing::warn!(
                "Requested sample rate {}Hz but device uses {}Hz. Capturing at device rate.",
                requested_sample_rate,
                sample_rate
            );
        }

        tracing::debug!(
            "Device configuration: {}Hz, {} channels",
            sample_rate,
            channels
        );

        let finalize_signal = Arc::new(AtomicBool::new(false));
        let callback_signal = Arc::clone(&finalize_signal);
        let callback_events = events.clone();

        let stream = device.build_input_stream(
            &device_config.into(),
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                // Nothing may be queued after the finalize signal.
                if callback_signal.load(Ordering::SeqCst) {
                    return;
                }
                let samples = downmix_to_mono(data, channels);
                // Receiver gone means the widget is shutting down.
                let _ = callback_events.send(CaptureEvent::Fragment { epoch, samples });
            },
            |err| {
                tracing::error!("Audio stream error: {}", err);
            },
            None,
        )?;

        stream.play()?;
        tracing::debug!("Audio stream started for session {}", epoch);

        Ok(Self {
            epoch,
            sample_rate,
            finalize_signal,
            events,
            _stream: stream,
        })
    }

    /// Signals finalization: stops accepting fragments and queues the
    /// finalize-complete event behind everything already emitted.
    pub fn finalize(&self) {
        self.finalize_signal.store(true, Ordering::SeqCst);
        let _ = self
            .events
            .send(CaptureEvent::FinalizeComplete { epoch: self.epoch });
        tracing::debug!("Finalize signaled for session {}", self.epoch);
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The actual capture sample rate (the device's native rate).
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Downmixes an interleaved buffer to mono by averaging channels.
fn downmix_to_mono(data: &[i16], channels: usize) -> Fragment {
    match channels {
        0 | 1 => data.to_vec(),
        _ => data
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect(),
    }
}

/// Finds an audio input device by name or numeric index.
fn find_device(host: &cpal::Host, device_spec: &str) -> Result<cpal::Device> {
    let devices: Vec<cpal::Device> = host
        .input_devices()
        .map_err(|e| anyhow!("Failed to enumerate devices: {e}"))?
        .collect();

    if let Ok(index) = device_spec.parse::<usize>() {
        if index < devices.len() {
            return Ok(devices.into_iter().nth(index).unwrap());
        }
        return Err(anyhow!(
            "Device index {} is out of range (0-{})",
            index,
            devices.len().saturating_sub(1)
        ));
    }

    devices
        .into_iter()
        .find(|d| d.name().as_deref() == Ok(device_spec))
        .ok_or_else(|| {
            anyhow!(
                "Audio input device '{device_spec}' not found. Use 'ovr list-devices' to see available devices."
            )
        })
}

/// Temporarily redirects stderr to /dev/null to suppress ALSA library warnings on Linux.
/// On non-Linux platforms, this is a no-op since ALSA doesn't exist.
#[cfg(target_os = "linux")]
pub(crate) fn with_alsa_warnings_suppressed<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let dev_null = OpenOptions::new()
        .write(true)
        .open("/dev/null")
        .map_err(|e| anyhow!("Failed to open /dev/null: {e}"))?;
    let dev_null_fd = dev_null.as_raw_fd();

    let old_stderr = unsafe { libc::dup(libc::STDERR_FILENO) };
    if old_stderr == -1 {
        return Err(anyhow!("Failed to duplicate stderr"));
    }

    if unsafe { libc::dup2(dev_null_fd, libc::STDERR_FILENO) } == -1 {
        unsafe { libc::close(old_stderr) };
        return Err(anyhow!("Failed to redirect stderr"));
    }

    let result = f();

    unsafe {
        libc::dup2(old_stderr, libc::STDERR_FILENO);
        libc::close(old_stderr);
    }

    result
}

#[cfg(not(target_os = "linux"))]
pub(crate) fn with_alsa_warnings_suppressed<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_input_passes_through() {
        let data = [1i16, -2, 3, -4];
        assert_eq!(downmix_to_mono(&data, 1), vec![1, -2, 3, -4]);
    }

    #[test]
    fn stereo_input_averages_pairs() {
        let data = [100i16, 200, -100, 100];
        assert_eq!(downmix_to_mono(&data, 2), vec![150, 0]);
    }

    #[test]
    fn multichannel_input_averages_frames() {
        let data = [30i16, 60, 90, -30, -60, -90];
        assert_eq!(downmix_to_mono(&data, 3), vec![60, -60]);
    }

    #[test]
    fn averaging_does_not_overflow_at_extremes() {
        let data = [i16::MAX, i16::MAX, i16::MIN, i16::MIN];
        assert_eq!(downmix_to_mono(&data, 2), vec![i16::MAX, i16::MIN]);
    }
}
