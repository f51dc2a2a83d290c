//! obd-elm - ELM327 device link layer
//!
//! Owns the single transport connection to an ELM327-class adapter and
//! executes line-oriented commands against it with exclusive access:
//! - [`DeviceSession`]: TCP link with liveness probing, bounded reconnect
//!   retry, adapter init, command pacing, and prompt-terminated reads
//! - [`MockLink`]: table-driven link for testing
//!
//! # Example
//!
//! ```ignore
//! use obd_elm::{create_link, DeviceConfig};
//!
//! let link = create_link(&DeviceConfig::default());
//! let response = link.execute("010C").await?;
//! ```

pub mod commands;
pub mod config;
pub mod error;
mod link;
pub mod mock;
pub mod session;

pub use config::{DeviceConfig, MockLinkConfig, TcpLinkConfig};
pub use error::LinkError;
pub use link::ObdLink;
pub use mock::MockLink;
pub use session::DeviceSession;

use std::sync::Arc;

/// Create a device link based on configuration
pub fn create_link(config: &DeviceConfig) -> Arc<dyn ObdLink> {
    match config {
        DeviceConfig::Tcp(cfg) => Arc::new(DeviceSession::new(cfg.clone())),
        DeviceConfig::Mock(cfg) => Arc::new(MockLink::new(cfg)),
    }
}
