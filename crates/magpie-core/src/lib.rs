//! # Magpie Core
//!
//! The dispatch core of the Magpie bot framework.
//!
//! Magpie ingests inbound chat events from a remote messaging transport,
//! normalizes each into a [`MessageEnvelope`], filters it against a per-bot
//! [`FilterPolicy`], and fans it out to independently registered handlers:
//! named [`Plugin`]s and anonymous listeners. One failing handler can never
//! block or corrupt dispatch to the others.
//!
//! ## Data flow
//!
//! ```text
//! ┌───────────┐    ┌─────────────────┐    ┌──────────────┐    ┌───────────┐
//! │ Transport │───▶│ MessageEnvelope │───▶│ FilterPolicy │───▶│ Supervisor │──▶ listeners
//! │ (events)  │    │ (normalization) │    │ (admission)  │    │ (fan-out)  │──▶ plugins
//! └───────────┘    └─────────────────┘    └──────────────┘    └───────────┘
//! ```
//!
//! The wire transport itself is an external collaborator: this crate only
//! defines the [`Transport`] trait it must satisfy, plus an in-memory
//! implementation for tests and demos.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use magpie_core::{Bot, MessageEnvelope, Plugin, HandlerError};
//!
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl Plugin for Echo {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!
//!     async fn run(
//!         &self,
//!         bot: Arc<Bot>,
//!         envelope: Arc<MessageEnvelope>,
//!     ) -> Result<(), HandlerError> {
//!         if bot.check_command(&envelope, &["echo"], false) {
//!             envelope.reply_text(envelope.raw_text(), false).await?;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bot = Bot::new(transport);
//!     bot.register(Echo)?;
//!     bot.connect().await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod bot;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod plugin;
pub mod transport;

pub use api::Api;
pub use bot::Bot;
pub use dispatch::command;
pub use dispatch::policy::FilterPolicy;
pub use dispatch::registry::{Listener, ListenerRegistry, PluginRegistry};
pub use dispatch::supervisor;
pub use error::{
    ApiError, ApiResult, HandlerError, RegistryError, TransportError, TransportResult,
};
pub use model::envelope::{ChatKind, MessageEnvelope, RawMessage, Sender};
pub use model::segment::Segment;
pub use plugin::Plugin;
pub use transport::{BoxedTransport, Transport, memory::MemoryTransport};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::api::Api;
    pub use crate::bot::Bot;
    pub use crate::dispatch::policy::FilterPolicy;
    pub use crate::error::{ApiError, ApiResult, HandlerError, RegistryError};
    pub use crate::model::envelope::{ChatKind, MessageEnvelope};
    pub use crate::model::segment::Segment;
    pub use crate::plugin::Plugin;
    pub use crate::transport::Transport;
}
