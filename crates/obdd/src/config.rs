//! Daemon configuration
//!
//! All keys have defaults, so the daemon runs with no config file at all.
//! `OBDD_LISTEN`, `OBDD_DEVICE_HOST`, and `OBDD_DEVICE_PORT` override file
//! values, matching how the original deployment externalized its endpoint.

use anyhow::Context;
use obd_api::TelemetryConfig;
use obd_elm::DeviceConfig;
use serde::Deserialize;

/// Top-level daemon configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObddConfig {
    pub server: ServerConfig,
    pub device: DeviceConfig,
    pub telemetry: TelemetryConfig,
}

/// HTTP listen settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

fn default_listen() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen: default_listen(),
        }
    }
}

impl ObddConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> anyhow::Result<ObddConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(listen) = std::env::var("OBDD_LISTEN") {
            self.server.listen = listen;
        }
        if let DeviceConfig::Tcp(ref mut tcp) = self.device {
            if let Ok(host) = std::env::var("OBDD_DEVICE_HOST") {
                tcp.host = host;
            }
            if let Ok(port) = std::env::var("OBDD_DEVICE_PORT") {
                match port.parse() {
                    Ok(port) => tcp.port = port,
                    Err(_) => {
                        tracing::warn!(value = %port, "Ignoring unparseable OBDD_DEVICE_PORT")
                    }
                }
            }
        }
    }
}
