//! Configuration management for ovr.
//!
//! Handles loading and saving application configuration from a TOML file in
//! the user's config directory. A missing config file is not an error; the
//! defaults are written out on first load so `ovr config` has something to
//! edit.

pub mod file;

pub use file::{config_path, log_dir, AudioConfig, HostConfig, OvrConfig, WidgetConfig};
