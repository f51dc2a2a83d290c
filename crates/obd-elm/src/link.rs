//! Device link trait

use async_trait::async_trait;

use crate::error::LinkError;

/// Link-agnostic interface for executing adapter commands.
///
/// Implementations guarantee at most one in-flight command/response
/// exchange at any instant; any number of tasks may share one link and
/// their commands are served in arrival order.
#[async_trait]
pub trait ObdLink: Send + Sync {
    /// Execute one command and return the trimmed response text.
    ///
    /// The command is passed without its line terminator. The response is
    /// decoded lossily and trimmed of outer whitespace but otherwise
    /// unparsed: the trailing prompt and interior control characters stay
    /// in, the frame parser strips them.
    async fn execute(&self, cmd: &str) -> Result<String, LinkError>;

    /// Whether the link currently holds a transport believed healthy
    async fn is_connected(&self) -> bool;

    /// The configured device endpoint, for logs and info payloads
    fn endpoint(&self) -> String;
}
