//! The bot aggregate.
//!
//! A [`Bot`] owns one [`FilterPolicy`], one [`PluginRegistry`], one
//! [`ListenerRegistry`], and the transport handle. It drives the inbound
//! event pump: each raw payload is normalized into a [`MessageEnvelope`]
//! and handed to the dispatch supervisor on its own task, so handling one
//! envelope never delays acceptance of the next.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::Api;
use crate::dispatch::command;
use crate::dispatch::policy::FilterPolicy;
use crate::dispatch::registry::{Listener, ListenerRegistry, PluginRegistry};
use crate::dispatch::supervisor;
use crate::error::{HandlerError, RegistryError, TransportResult};
use crate::model::envelope::MessageEnvelope;
use crate::plugin::Plugin;
use crate::transport::Transport;

/// Aggregate root: policy, registries, and the transport handle.
///
/// Created once per connection. Policy fields are mutable configuration;
/// mutation is not synchronized against in-flight dispatch — changes apply
/// to subsequent envelopes, best effort.
pub struct Bot {
    transport: Arc<dyn Transport>,
    api: Api,
    policy: RwLock<FilterPolicy>,
    plugins: PluginRegistry,
    listeners: ListenerRegistry,
    cancel: CancellationToken,
}

impl Bot {
    /// Creates a bot over `transport` with the default policy.
    pub fn new(transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self {
            api: Api::new(Arc::clone(&transport)),
            transport,
            policy: RwLock::new(FilterPolicy::default()),
            plugins: PluginRegistry::new(),
            listeners: ListenerRegistry::new(),
            cancel: CancellationToken::new(),
        })
    }

    /// The typed outbound API surface.
    pub fn api(&self) -> &Api {
        &self.api
    }

    /// A copy of the current filter policy.
    pub fn policy(&self) -> FilterPolicy {
        self.policy.read().clone()
    }

    /// Replaces the filter policy. Applies to subsequent envelopes.
    pub fn set_policy(&self, policy: FilterPolicy) {
        *self.policy.write() = policy;
    }

    /// Mutates the filter policy in place. Applies to subsequent envelopes.
    pub fn update_policy(&self, f: impl FnOnce(&mut FilterPolicy)) {
        let mut policy = self.policy.write();
        f(&mut policy);
    }

    /// The plugin registry.
    pub fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// The listener registry.
    pub fn listeners(&self) -> &ListenerRegistry {
        &self.listeners
    }

    /// Registers a plugin.
    ///
    /// # Errors
    ///
    /// Fails when the plugin's name is empty or already taken; treat this
    /// as fatal at startup.
    pub fn register(&self, plugin: impl Plugin + 'static) -> Result<(), RegistryError> {
        let plugin: Arc<dyn Plugin> = Arc::new(plugin);
        self.plugins.register(plugin)
    }

    /// Adds an anonymous message listener.
    pub fn on_message<F, Fut>(&self, listener: F)
    where
        F: Fn(Arc<MessageEnvelope>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
    {
        self.listeners.add(Arc::new(listener));
    }

    /// Checks whether `envelope` invokes one of `commands` under the
    /// policy's configured prefixes.
    pub fn check_command(
        &self,
        envelope: &MessageEnvelope,
        commands: &[&str],
        require_mention: bool,
    ) -> bool {
        command::matches(
            envelope,
            &self.policy.read().prefixes,
            commands,
            require_mention,
        )
    }

    /// Connects the transport and starts the inbound event pump.
    ///
    /// Returns once the pump is running; it stops when the transport closes
    /// its stream or [`shutdown`](Self::shutdown) is called.
    pub async fn connect(self: &Arc<Self>) -> TransportResult<()> {
        let events = self.transport.connect().await?;
        info!("connected to event transport");

        let bot = Arc::clone(self);
        tokio::spawn(bot.pump(events));
        Ok(())
    }

    /// Stops the event pump. In-flight handlers run to completion.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    async fn pump(self: Arc<Self>, mut events: mpsc::Receiver<Value>) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = events.recv() => {
                    match event {
                        Some(raw) => self.ingest(raw),
                        None => {
                            debug!("event stream closed");
                            break;
                        }
                    }
                }
            }
        }
        debug!("event pump stopped");
    }

    /// Normalizes one raw payload and hands it to the supervisor on its own
    /// task, so envelope N+1 is never serialized behind envelope N.
    fn ingest(self: &Arc<Self>, raw: Value) {
        let envelope =
            match MessageEnvelope::from_value(raw, Some(Arc::downgrade(&self.transport))) {
                Ok(envelope) => envelope,
                Err(error) => {
                    warn!(%error, "discarding unparseable event payload");
                    return;
                }
            };

        tokio::spawn(supervisor::dispatch(Arc::clone(self), Arc::new(envelope)));
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("plugins", &self.plugins.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
