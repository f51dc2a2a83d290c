//! HTTP request handlers for the bridge API
//!
//! Handlers are link-agnostic: everything goes through the `ObdLink` trait.

pub mod device;
pub mod telemetry;
