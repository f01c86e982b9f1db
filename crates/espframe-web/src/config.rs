//! Configuration management.

use anyhow::{Context, Result};
use espframe_client::DEFAULT_DEVICE_URL;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Web UI configuration
    #[serde(default)]
    pub web: WebConfig,

    /// Target device configuration
    #[serde(default)]
    pub device: DeviceConfig,
}

/// Web UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// Server listen address (e.g., "127.0.0.1:8787")
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Largest image file accepted from the browser, in bytes
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

/// Device configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Base URL of the device HTTP server
    #[serde(default = "default_device_url")]
    pub url: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            url: default_device_url(),
        }
    }
}

// Default value functions
fn default_listen() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_max_image_bytes() -> usize {
    32 * 1024 * 1024
}

fn default_device_url() -> String {
    DEFAULT_DEVICE_URL.to_string()
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse configuration")?;
        Ok(config)
    }

    /// Loads configuration, falling back to defaults when the file is absent.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            warn!(
                "Configuration file {} not found, using defaults",
                path.as_ref().display()
            );
            Ok(Self::default())
        }
    }
}
