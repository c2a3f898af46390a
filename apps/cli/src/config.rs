//! CLI configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// CLI configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// TCP port devices listen on for control requests.
    /// Override: `LANCAST_CONTROL_PORT`
    pub control_port: u16,

    /// Application identifier of the receiver app to launch.
    /// `dev` targets a sideloaded receiver.
    /// Override: `LANCAST_APP_ID`
    pub app_id: String,

    /// Multicast listen window in seconds for discovery.
    /// Override: `LANCAST_LISTEN_WINDOW_SECS`
    pub listen_window_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            control_port: lancast_core::protocol_constants::CONTROL_PORT,
            app_id: "dev".to_string(),
            listen_window_secs: 3,
        }
    }
}

impl CliConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("LANCAST_CONTROL_PORT") {
            if let Ok(port) = val.parse() {
                self.control_port = port;
            }
        }

        if let Ok(val) = std::env::var("LANCAST_APP_ID") {
            if !val.is_empty() {
                self.app_id = val;
            }
        }

        if let Ok(val) = std::env::var("LANCAST_LISTEN_WINDOW_SECS") {
            if let Ok(secs) = val.parse() {
                self.listen_window_secs = secs;
            }
        }
    }
}
