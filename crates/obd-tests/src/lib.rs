//! Integration tests for the OBD telemetry bridge
//!
//! This crate contains end-to-end tests that exercise the full stack:
//! - elm-sim (ELM327 emulator) speaking the adapter protocol over TCP
//! - obdd polling it through the shared device session
//! - HTTP endpoints and the WebSocket telemetry stream
//!
//! # Running Tests
//!
//! The tests spawn the `obdd` and `elm-sim` binaries from `target/`, so run
//! them from the workspace root where a full build has happened:
//!
//! ```bash
//! cargo test -p obd-tests -- --test-threads=1
//! ```
//!
//! # Test Structure
//!
//! - `e2e_test.rs` - Full stack tests with the elm-sim emulator

// This crate only contains tests, no library code
