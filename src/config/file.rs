//! Configuration file management for ovr.
//!
//! Configuration is stored as TOML in the user's config directory
//! (`~/.config/ovr/ovr.toml`).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Widget presentation and behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Title shown above the recorder. A host can set this per task,
    /// e.g. "Chimney Repair C457897". Overridable with `--title`.
    #[serde(default = "default_title")]
    pub title: String,
    /// Whether pressing Done while a recording is in progress stops the
    /// recording first. Off by default: Done only signals the host.
    #[serde(default)]
    pub done_stops_recording: bool,
}

fn default_title() -> String {
    "Recording".to_string()
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            done_stops_recording: false,
        }
    }
}

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `ovr list-devices`
    /// - device name from `ovr list-devices`
    #[serde(default = "default_device")]
    pub device: String,
    /// Requested sample rate in Hz (actual rate follows the device)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Directory finished WAV recordings are written to.
    /// Defaults to the system temp directory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recordings_dir: Option<PathBuf>,
}

fn default_device() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
            sample_rate: default_sample_rate(),
            recordings_dir: None,
        }
    }
}

/// Host bridge configuration: where the recording URL is published and what
/// happens when the user signals Done.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// State file the finished recording's URL is written to. The hosting
    /// environment reads this file; ovr only ever overwrites it.
    /// Defaults to `~/.local/share/ovr/audio_url` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
    /// Shell command run when the user presses Done. Unset means Done is
    /// only logged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_done: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            state_file: None,
            on_done: None,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OvrConfig {
    #[serde(default)]
    pub widget: WidgetConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub host: HostConfig,
}

impl OvrConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// If the config file does not exist yet, the defaults are written to it
    /// and returned.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the config file cannot be read or written
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;

        if !path.exists() {
            let config = OvrConfig::default();
            config.save()?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(&path)?;
        let config: OvrConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined or created
    /// - If the file cannot be written
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path()?;
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        tracing::info!("Configuration saved");
        Ok(())
    }

    /// Resolves the host state file path, falling back to the default slot
    /// under the user's data directory.
    pub fn state_file(&self) -> anyhow::Result<PathBuf> {
        if let Some(path) = &self.host.state_file {
            return Ok(path.clone());
        }
        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
        Ok(home.join(".local/share/ovr/audio_url"))
    }

    /// Resolves the recordings directory, falling back to the system temp dir.
    pub fn recordings_dir(&self) -> PathBuf {
        self.audio
            .recordings_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }
}

/// Determines the log directory, following the XDG Base Directory
/// Specification: `$XDG_STATE_HOME/ovr` when set, `~/.local/state/ovr`
/// otherwise. The directory is not created here; callers that write create
/// it, callers that only read (`ovr logs`) must not.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn log_dir() -> anyhow::Result<PathBuf> {
    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg_state).join("ovr"));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".local/state/ovr"))
}

/// Retrieves the path to the config file, creating the config directory if
/// needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("ovr");

    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create config directory: {e}"))?;

    Ok(config_dir.join("ovr.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = OvrConfig::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: OvrConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(parsed.widget.title, "Recording");
        assert!(!parsed.widget.done_stops_recording);
        assert_eq!(parsed.audio.device, "default");
        assert_eq!(parsed.audio.sample_rate, 16000);
        assert!(parsed.host.state_file.is_none());
        assert!(parsed.host.on_done.is_none());
    }

    #[test]
    fn empty_file_parses_as_defaults() {
        let parsed: OvrConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.widget.title, "Recording");
        assert_eq!(parsed.audio.device, "default");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let parsed: OvrConfig = toml::from_str(
            "[widget]\ntitle = \"Chimney Repair C457897\"\ndone_stops_recording = true\n",
        )
        .unwrap();
        assert_eq!(parsed.widget.title, "Chimney Repair C457897");
        assert!(parsed.widget.done_stops_recording);
        assert_eq!(parsed.audio.sample_rate, 16000);
    }
}
