//! Application state for the bridge API

use std::sync::Arc;
use std::time::Duration;

use obd_elm::ObdLink;
use obd_protocol::Pid;
use serde::Deserialize;

/// Telemetry polling settings shared by every client loop
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// PID codes polled each tick, in order. Codes outside the known set
    /// are still polled and rendered via the passthrough decode path.
    #[serde(default = "default_pids")]
    pub pids: Vec<String>,
    /// How long each tick listens for an inbound control message
    #[serde(default = "default_control_wait_ms")]
    pub control_wait_ms: u64,
}

fn default_pids() -> Vec<String> {
    Pid::DEFAULT_SET
        .iter()
        .map(|pid| pid.code().to_string())
        .collect()
}

fn default_control_wait_ms() -> u64 {
    500
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            pids: default_pids(),
            control_wait_ms: default_control_wait_ms(),
        }
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// The one device link every client polls through
    link: Arc<dyn ObdLink>,
    telemetry: Arc<TelemetryConfig>,
}

impl AppState {
    /// Create a new AppState around a device link
    pub fn new(link: Arc<dyn ObdLink>, telemetry: TelemetryConfig) -> Self {
        Self {
            link,
            telemetry: Arc::new(telemetry),
        }
    }

    /// The shared device link
    pub fn link(&self) -> &Arc<dyn ObdLink> {
        &self.link
    }

    /// PID codes polled each telemetry tick
    pub fn pids(&self) -> &[String] {
        &self.telemetry.pids
    }

    /// Bounded wait for client control messages between ticks
    pub fn control_wait(&self) -> Duration {
        Duration::from_millis(self.telemetry.control_wait_ms)
    }
}
