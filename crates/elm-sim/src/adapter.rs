//! Emulated adapter front-end: per-connection settings and the command table

use std::sync::Arc;

use crate::engine::SimulatedEngine;

/// Per-connection adapter state
pub struct Adapter {
    engine: Arc<SimulatedEngine>,
    /// Spaces between hex bytes in responses, toggled by ATS0/ATS1
    spaces: bool,
}

impl Adapter {
    pub fn new(engine: Arc<SimulatedEngine>) -> Self {
        Self {
            engine,
            spaces: true,
        }
    }

    /// Answer one uppercased command line. Every reply ends with the
    /// ready prompt.
    pub fn respond(&mut self, cmd: &str) -> String {
        match cmd {
            // Reset restores default settings
            "ATZ" => {
                self.spaces = true;
                "\r\rELM327 v1.5\r\r>".to_string()
            }
            "ATE0" | "ATE1" | "ATL0" | "ATL1" | "ATH0" | "ATH1" => "OK\r\r>".to_string(),
            "ATS0" => {
                self.spaces = false;
                "OK\r\r>".to_string()
            }
            "ATS1" => {
                self.spaces = true;
                "OK\r\r>".to_string()
            }
            "ATI" => "ELM327 v1.5\r\r>".to_string(),
            "ATRV" => format!("{:.1}V\r\r>", self.engine.voltage()),
            "ATDP" => "AUTO, ISO 15765-4 (CAN 11/500)\r\r>".to_string(),
            c if c.starts_with("ATSP") || c.starts_with("ATST") || c.starts_with("ATAT") => {
                "OK\r\r>".to_string()
            }
            // Mode 01: current data
            c if c.len() == 4 && c.starts_with("01") => match self.engine.reading(&c[2..]) {
                Some(bytes) => self.frame(&c[2..], &bytes),
                None => "NO DATA\r\r>".to_string(),
            },
            _ => "?\r\r>".to_string(),
        }
    }

    fn frame(&self, pid: &str, bytes: &[u8]) -> String {
        let mut parts = vec!["41".to_string(), pid.to_string()];
        parts.extend(bytes.iter().map(|b| format!("{:02X}", b)));
        let body = if self.spaces {
            parts.join(" ")
        } else {
            parts.concat()
        };
        format!("{}\r\r>", body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use obd_protocol::{decode, DecodedValue, SpeedUnit};

    fn adapter() -> Adapter {
        Adapter::new(Arc::new(SimulatedEngine::new()))
    }

    #[test]
    fn test_reset_banner() {
        assert_eq!(adapter().respond("ATZ"), "\r\rELM327 v1.5\r\r>");
    }

    #[test]
    fn test_config_commands_acknowledged() {
        let mut adapter = adapter();
        for cmd in ["ATE0", "ATL0", "ATH0", "ATSP0"] {
            assert_eq!(adapter.respond(cmd), "OK\r\r>", "{cmd}");
        }
    }

    #[test]
    fn test_rpm_frame_decodes_to_idle() {
        let mut adapter = adapter();
        let raw = adapter.respond("010C");
        assert!(raw.ends_with("\r\r>"));
        assert_eq!(decode("010C", &raw, SpeedUnit::Kmh), DecodedValue::Rpm(800));
    }

    #[test]
    fn test_space_toggle() {
        let mut adapter = adapter();
        assert!(adapter.respond("010D").starts_with("41 0D"));

        adapter.respond("ATS0");
        assert!(adapter.respond("010D").starts_with("410D"));

        adapter.respond("ATS1");
        assert!(adapter.respond("010D").starts_with("41 0D"));

        // reset restores spaces too
        adapter.respond("ATS0");
        adapter.respond("ATZ");
        assert!(adapter.respond("010D").starts_with("41 0D"));
    }

    #[test]
    fn test_unsupported_mode01_pid_gets_no_data() {
        assert_eq!(adapter().respond("013F"), "NO DATA\r\r>");
    }

    #[test]
    fn test_unknown_command_gets_question_mark() {
        assert_eq!(adapter().respond("FOO"), "?\r\r>");
        assert_eq!(adapter().respond("ATXY"), "?\r\r>");
    }

    #[test]
    fn test_voltage_reading() {
        let raw = adapter().respond("ATRV");
        assert!(raw.ends_with("V\r\r>"), "{raw}");
    }
}
