//! The plugin contract.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::bot::Bot;
use crate::error::HandlerError;
use crate::model::envelope::MessageEnvelope;

/// A named, registered message handler with an isolated failure domain.
///
/// A plugin is constructed once at load time and lives for the process.
/// [`run`](Plugin::run) is invoked for every accepted envelope and may run
/// concurrently for distinct envelopes; the core makes no isolation
/// guarantee about a plugin's own internal state across calls — a plugin
/// that reads-then-writes shared state across awaits must serialize that
/// itself.
///
/// Errors returned from `run` are caught by the dispatch supervisor, logged
/// with this plugin's name, and never affect other handlers.
///
/// # Example
///
/// ```rust,ignore
/// struct Ping;
///
/// #[async_trait::async_trait]
/// impl Plugin for Ping {
///     fn name(&self) -> &str {
///         "ping"
///     }
///
///     async fn run(
///         &self,
///         bot: Arc<Bot>,
///         envelope: Arc<MessageEnvelope>,
///     ) -> Result<(), HandlerError> {
///         if bot.check_command(&envelope, &["ping"], false) {
///             envelope.reply_text("pong", false).await?;
///         }
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Unique, non-empty name. Checked at registration, immutable after.
    fn name(&self) -> &str;

    /// Optional human-readable description.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Directory namespace for any persistence this plugin owns.
    ///
    /// Derived deterministically from the name; the core never touches it.
    fn data_namespace(&self) -> PathBuf {
        PathBuf::from("data").join(self.name())
    }

    /// Handles one accepted envelope.
    async fn run(&self, bot: Arc<Bot>, envelope: Arc<MessageEnvelope>)
    -> Result<(), HandlerError>;
}
