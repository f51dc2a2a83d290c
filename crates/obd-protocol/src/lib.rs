//! obd-protocol - OBD-II PID definitions and ELM327 response decoding
//!
//! This crate is the pure protocol layer shared by the daemon and the
//! emulator: the known PID set, tokenization and frame location for raw
//! ELM327 response text, and decoding of data bytes into physical values.
//!
//! # Quick Start
//!
//! ```rust
//! use obd_protocol::{decode, DecodedValue, SpeedUnit};
//!
//! // Engine RPM: 0x1A 0xF8 → (26*256 + 248) / 4 = 1726
//! let value = decode("010C", "41 0C 1A F8\r\r>", SpeedUnit::Kmh);
//! assert_eq!(value, DecodedValue::Rpm(1726));
//! assert_eq!(value.to_string(), "1726 RPM");
//! ```

pub mod codec;
pub mod decode;
pub mod error;
pub mod payload;
pub mod pid;

pub use decode::decode;
pub use error::{ProtocolError, ProtocolResult};
pub use payload::{DecodedValue, SpeedUnit, TelemetryPayload};
pub use pid::Pid;
