//! Device link configuration

use serde::{Deserialize, Serialize};

/// Device link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeviceConfig {
    /// TCP link to a real adapter or emulator
    Tcp(TcpLinkConfig),
    /// Mock link for testing
    Mock(MockLinkConfig),
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self::Tcp(TcpLinkConfig::default())
    }
}

/// TCP device link configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TcpLinkConfig {
    /// Device IP address or hostname
    #[serde(default = "default_host")]
    pub host: String,
    /// Device TCP port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Connection timeout in milliseconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Idle deadline for one response read in milliseconds
    #[serde(default = "default_response_timeout")]
    pub response_timeout_ms: u64,
    /// Minimum gap between consecutive commands in milliseconds
    #[serde(default = "default_command_interval")]
    pub min_command_interval_ms: u64,
    /// Response buffer cap in bytes
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// Connection attempts before giving up
    #[serde(default = "default_connect_attempts")]
    pub connect_attempts: u32,
    /// Run the adapter init sequence after connecting
    #[serde(default = "default_init_on_connect")]
    pub init_on_connect: bool,
}

impl TcpLinkConfig {
    /// The `host:port` string used for connects, logs, and info payloads
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for TcpLinkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: default_connect_timeout(),
            response_timeout_ms: default_response_timeout(),
            min_command_interval_ms: default_command_interval(),
            max_response_bytes: default_max_response_bytes(),
            connect_attempts: default_connect_attempts(),
            init_on_connect: default_init_on_connect(),
        }
    }
}

fn default_host() -> String {
    // the adapter is reached through the container gateway in the
    // original deployment
    "host.docker.internal".to_string()
}

fn default_port() -> u16 {
    35000
}

fn default_connect_timeout() -> u64 {
    5000
}

fn default_response_timeout() -> u64 {
    1000
}

fn default_command_interval() -> u64 {
    100
}

fn default_max_response_bytes() -> usize {
    1024
}

fn default_connect_attempts() -> u32 {
    3
}

fn default_init_on_connect() -> bool {
    true
}

/// Mock link configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockLinkConfig {
    /// Simulated per-command latency in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tcp_config_defaults() {
        let config: DeviceConfig = toml::from_str("type = \"tcp\"").unwrap();
        let DeviceConfig::Tcp(cfg) = config else {
            panic!("expected tcp link");
        };
        assert_eq!(cfg.endpoint(), "host.docker.internal:35000");
        assert_eq!(cfg.connect_timeout_ms, 5000);
        assert_eq!(cfg.response_timeout_ms, 1000);
        assert_eq!(cfg.min_command_interval_ms, 100);
        assert_eq!(cfg.max_response_bytes, 1024);
        assert_eq!(cfg.connect_attempts, 3);
        assert!(cfg.init_on_connect);
    }

    #[test]
    fn test_tcp_config_overrides() {
        let config: DeviceConfig = toml::from_str(
            r#"
            type = "tcp"
            host = "10.0.0.7"
            port = 3500
            response_timeout_ms = 250
            init_on_connect = false
            "#,
        )
        .unwrap();
        let DeviceConfig::Tcp(cfg) = config else {
            panic!("expected tcp link");
        };
        assert_eq!(cfg.endpoint(), "10.0.0.7:3500");
        assert_eq!(cfg.response_timeout_ms, 250);
        assert!(!cfg.init_on_connect);
        // untouched fields keep their defaults
        assert_eq!(cfg.connect_attempts, 3);
    }

    #[test]
    fn test_mock_config_parses() {
        let config: DeviceConfig = toml::from_str("type = \"mock\"\nlatency_ms = 5").unwrap();
        let DeviceConfig::Mock(cfg) = config else {
            panic!("expected mock link");
        };
        assert_eq!(cfg.latency_ms, 5);
    }

    #[test]
    fn test_default_is_tcp() {
        assert!(matches!(DeviceConfig::default(), DeviceConfig::Tcp(_)));
    }
}
