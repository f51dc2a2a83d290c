//! ELM327 AT command set used by this system

/// Reset the adapter; it replies with its identification banner
pub const RESET: &str = "ATZ";

/// Command echo off
pub const ECHO_OFF: &str = "ATE0";

/// Linefeeds off, responses use `\r` only
pub const LINEFEEDS_OFF: &str = "ATL0";

/// Message headers off
pub const HEADERS_OFF: &str = "ATH0";

/// Automatic protocol selection
pub const PROTOCOL_AUTO: &str = "ATSP0";

/// Adapter identification string
pub const IDENTIFY: &str = "ATI";

/// Supply voltage at the OBD port
pub const READ_VOLTAGE: &str = "ATRV";

/// Describe the negotiated OBD protocol
pub const DESCRIBE_PROTOCOL: &str = "ATDP";

/// Configuration commands run after [`RESET`] on every (re)connect.
///
/// Spaces stay on (no `ATS0`): the frame locator tokenizes on the
/// whitespace between hex bytes.
pub const INIT_SEQUENCE: [&str; 4] = [ECHO_OFF, LINEFEEDS_OFF, HEADERS_OFF, PROTOCOL_AUTO];
