//! Host bridge for ovr.
//!
//! The hosting environment sees two things from the recorder: a string-valued
//! state slot holding the URL of the latest finished recording, and a
//! completion signal fired when the user presses Done. Both are modeled as
//! narrow traits injected into the recording loop so tests can observe them
//! without a real host.

use anyhow::{anyhow, Result};
use std::fs;
use std::path::PathBuf;
use std::process::Command;

/// Write-only view of the host's shared state slot.
pub trait Publisher {
    /// Publishes a new value to the slot, replacing the previous one.
    fn publish(&mut self, value: &str) -> Result<()>;
}

/// The host's completion trigger. Fire-and-forget and idempotent; never
/// consults or mutates recording state.
pub trait Trigger {
    fn fire(&mut self) -> Result<()>;
}

/// Publishes the recording URL by overwriting a host-readable state file.
///
/// A single writer and whole-file rewrites keep this simple; the host is
/// expected to watch or poll the file.
pub struct FileSlotPublisher {
    path: PathBuf,
}

impl FileSlotPublisher {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl Publisher for FileSlotPublisher {
    fn publish(&mut self, value: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow!("Failed to create state file directory: {e}"))?;
        }
        fs::write(&self.path, value)
            .map_err(|e| anyhow!("Failed to write state file {}: {e}", self.path.display()))?;
        tracing::info!("Published recording URL to {}", self.path.display());
        Ok(())
    }
}

/// Fires the completion signal by running a host-configured shell command.
///
/// With no command configured the signal is only logged, which is still
/// useful: the host can tail the log or simply not care.
pub struct CommandTrigger {
    command: Option<String>,
}

impl CommandTrigger {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

impl Trigger for CommandTrigger {
    fn fire(&mut self) -> Result<()> {
        match &self.command {
            Some(command) => {
                tracing::info!("Done signaled, running host command: {command}");
                let status = Command::new("sh")
                    .arg("-c")
                    .arg(command)
                    .status()
                    .map_err(|e| anyhow!("Failed to run on_done command: {e}"))?;
                if !status.success() {
                    tracing::warn!(
                        "on_done command exited with code {}",
                        status.code().unwrap_or(-1)
                    );
                }
            }
            None => {
                tracing::info!("Done signaled (no on_done command configured)");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_slot_publisher_overwrites_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let slot = dir.path().join("host/audio_url");

        let mut publisher = FileSlotPublisher::new(slot.clone());
        publisher.publish("file:///tmp/a.wav").unwrap();
        publisher.publish("file:///tmp/b.wav").unwrap();

        let value = fs::read_to_string(&slot).unwrap();
        assert_eq!(value, "file:///tmp/b.wav");
    }

    #[test]
    fn command_trigger_without_command_is_a_noop() {
        let mut trigger = CommandTrigger::new(None);
        trigger.fire().unwrap();
        // Idempotent: firing again must also succeed.
        trigger.fire().unwrap();
    }

    #[test]
    fn command_trigger_runs_configured_command() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("done");
        let mut trigger =
            CommandTrigger::new(Some(format!("touch {}", marker.display())));

        trigger.fire().unwrap();
        assert!(marker.exists());
    }
}
