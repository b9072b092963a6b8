//! List available audio input devices.

use crate::recording::capture::with_alsa_warnings_suppressed;
use anyhow::anyhow;
use cpal::traits::{DeviceTrait, HostTrait};

/// Lists all available audio input devices on the system.
///
/// # Errors
/// - If the audio host cannot be initialized
pub fn handle_list_devices() -> Result<(), anyhow::Error> {
    // Enumerate devices while suppressing ALSA library warnings
    let (host, devices) = with_alsa_warnings_suppressed(|| {
        let host = cpal::default_host();
        let devices: Vec<cpal::Device> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            // Skip devices that cannot even report a name
            .filter(|d| d.name().is_ok())
            .collect();
        Ok((host, devices))
    })?;

    if devices.is_empty() {
        println!("No audio input devices found on this system.");
        return Ok(());
    }

    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    println!();
    println!(" ┏┓┓┏┏┓");
    println!(" ┗┛┗┛┛ ");
    println!();
    println!("Available audio input devices:");
    println!();

    for (index, device) in devices.iter().enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let default_indicator = if default_name.as_ref() == Some(&name) {
            " [DEFAULT]"
        } else {
            ""
        };

        let config_info = match device.default_input_config() {
            Ok(config) => format!(
                "{}Hz, {} channels",
                config.sample_rate().0,
                config.channels()
            ),
            Err(_) => "configuration unavailable".to_string(),
        };

        println!("  ID: {index}");
        println!("    Name: {name}{default_indicator}");
        println!("    Config: {config_info}");
        println!();
    }

    Ok(())
}
