//! Mock device link for testing

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::MockLinkConfig;
use crate::error::LinkError;
use crate::link::ObdLink;

/// Table-driven mock link.
///
/// Replies come from a command-to-response table preloaded with the AT
/// command set and one frame per known PID; unknown commands get the
/// adapter's `?` reply. Tests override entries with [`add_response`] and
/// simulate outages with [`set_connected`].
///
/// [`add_response`]: MockLink::add_response
/// [`set_connected`]: MockLink::set_connected
pub struct MockLink {
    config: MockLinkConfig,
    connected: AtomicBool,
    responses: RwLock<Vec<(String, String)>>,
}

impl MockLink {
    pub fn new(config: &MockLinkConfig) -> Self {
        Self {
            config: config.clone(),
            connected: AtomicBool::new(true),
            responses: RwLock::new(Self::default_responses()),
        }
    }

    /// Add or override the response for a command
    pub fn add_response(&self, cmd: impl Into<String>, response: impl Into<String>) {
        let cmd = cmd.into();
        let mut responses = self.responses.write();
        match responses.iter_mut().find(|(c, _)| c.eq_ignore_ascii_case(&cmd)) {
            Some(entry) => entry.1 = response.into(),
            None => responses.push((cmd, response.into())),
        }
    }

    /// Set connection state
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    fn default_responses() -> Vec<(String, String)> {
        [
            // adapter management
            ("ATZ", "\r\rELM327 v1.5\r\r>"),
            ("ATE0", "OK\r\r>"),
            ("ATL0", "OK\r\r>"),
            ("ATH0", "OK\r\r>"),
            ("ATSP0", "OK\r\r>"),
            ("ATI", "ELM327 v1.5\r\r>"),
            ("ATRV", "12.6V\r\r>"),
            ("ATDP", "AUTO, ISO 15765-4 (CAN 11/500)\r\r>"),
            // mode 01 data
            ("010C", "41 0C 1A F8\r\r>"), // 1726 RPM
            ("010D", "41 0D 5A\r\r>"),    // 90 km/h
            ("0111", "41 11 5A\r\r>"),    // 35.3 %
            ("0105", "41 05 7F\r\r>"),    // 87 °C
            ("0104", "41 04 80\r\r>"),    // 50.2 %
            ("010F", "41 0F 30\r\r>"),    // 8 °C
            ("0110", "41 10 01 F4\r\r>"), // 5.00 g/s
        ]
        .into_iter()
        .map(|(cmd, response)| (cmd.to_string(), response.to_string()))
        .collect()
    }

    fn find_response(&self, cmd: &str) -> String {
        self.responses
            .read()
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(cmd))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| "?\r\r>".to_string())
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new(&MockLinkConfig::default())
    }
}

#[async_trait]
impl ObdLink for MockLink {
    async fn execute(&self, cmd: &str) -> Result<String, LinkError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(LinkError::ConnectionUnavailable("mock link down".into()));
        }

        // simulate latency
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        Ok(self.find_response(cmd).trim().to_string())
    }

    async fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn endpoint(&self) -> String {
        "mock".to_string()
    }
}
