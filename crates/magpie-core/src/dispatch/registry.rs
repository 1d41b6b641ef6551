//! Handler registries.
//!
//! [`PluginRegistry`] holds named singleton plugins; [`ListenerRegistry`]
//! holds anonymous observer callbacks. Both are normally populated during
//! setup, but iteration always works on a snapshot, so registration
//! concurrent with an in-flight dispatch can never corrupt or grow the set
//! a dispatch is walking.

use std::sync::Arc;

use futures::future::BoxFuture;
use parking_lot::RwLock;

use crate::error::{HandlerError, RegistryError};
use crate::model::envelope::MessageEnvelope;
use crate::plugin::Plugin;

// ============================================================================
// PluginRegistry
// ============================================================================

/// Registry of named plugin instances.
///
/// Names are unique and non-empty; violations fail registration (fatal at
/// startup, by contract). Iteration order is registration order.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: RwLock<Vec<Arc<dyn Plugin>>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin under its own name.
    ///
    /// # Errors
    ///
    /// [`RegistryError::EmptyName`] when the plugin reports an empty name,
    /// [`RegistryError::DuplicateName`] when the name is already taken. A
    /// failed registration leaves the registry unchanged; a later
    /// registration under a distinct name still succeeds.
    pub fn register(&self, plugin: Arc<dyn Plugin>) -> Result<(), RegistryError> {
        let name = plugin.name();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }

        let mut plugins = self.plugins.write();
        if plugins.iter().any(|existing| existing.name() == name) {
            return Err(RegistryError::DuplicateName(name.to_string()));
        }
        plugins.push(plugin);
        Ok(())
    }

    /// Looks a plugin up by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Plugin>> {
        self.plugins
            .read()
            .iter()
            .find(|plugin| plugin.name() == name)
            .cloned()
    }

    /// Stable snapshot of every registered plugin, in registration order.
    ///
    /// Registrations made after this call do not show up in the returned
    /// sequence (copy-on-iterate).
    pub fn snapshot(&self) -> Vec<Arc<dyn Plugin>> {
        self.plugins.read().clone()
    }

    /// Number of registered plugins.
    pub fn len(&self) -> usize {
        self.plugins.read().len()
    }

    /// True when no plugin is registered.
    pub fn is_empty(&self) -> bool {
        self.plugins.read().is_empty()
    }
}

// ============================================================================
// ListenerRegistry
// ============================================================================

/// An anonymous message observer.
///
/// Implemented for any `Fn(Arc<MessageEnvelope>) -> Future<Result<...>>`
/// closure, so callers just pass async closures to
/// [`ListenerRegistry::add`]. Listeners have no name; failures are reported
/// by position.
pub trait Listener: Send + Sync {
    /// Observes one accepted envelope.
    fn call(&self, envelope: Arc<MessageEnvelope>) -> BoxFuture<'static, Result<(), HandlerError>>;
}

impl<F, Fut> Listener for F
where
    F: Fn(Arc<MessageEnvelope>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn call(&self, envelope: Arc<MessageEnvelope>) -> BoxFuture<'static, Result<(), HandlerError>> {
        Box::pin(self(envelope))
    }
}

/// Append-only registry of anonymous listeners.
#[derive(Default)]
pub struct ListenerRegistry {
    listeners: RwLock<Vec<Arc<dyn Listener>>>,
}

impl ListenerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener. There is no removal.
    pub fn add(&self, listener: Arc<dyn Listener>) {
        self.listeners.write().push(listener);
    }

    /// Stable snapshot of every listener, in registration order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Listener>> {
        self.listeners.read().clone()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    /// True when no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Bot;
    use async_trait::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Plugin for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn run(
            &self,
            _bot: Arc<Bot>,
            _envelope: Arc<MessageEnvelope>,
        ) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[test]
    fn rejects_empty_names() {
        let registry = PluginRegistry::new();
        assert_eq!(
            registry.register(Arc::new(Named(""))),
            Err(RegistryError::EmptyName)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_duplicate_names() {
        let registry = PluginRegistry::new();
        registry.register(Arc::new(Named("quotes"))).unwrap();
        assert_eq!(
            registry.register(Arc::new(Named("quotes"))),
            Err(RegistryError::DuplicateName("quotes".into()))
        );
        // A distinct name still registers after the failure.
        registry.register(Arc::new(Named("dice"))).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_registration() {
        let registry = PluginRegistry::new();
        registry.register(Arc::new(Named("a"))).unwrap();

        let snapshot = registry.snapshot();
        registry.register(Arc::new(Named("b"))).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn snapshot_preserves_registration_order() {
        let registry = PluginRegistry::new();
        for name in ["one", "two", "three"] {
            registry.register(Arc::new(Named(name))).unwrap();
        }
        let names: Vec<_> = registry.snapshot().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, ["one", "two", "three"]);
    }

    #[test]
    fn lookup_by_name() {
        let registry = PluginRegistry::new();
        registry.register(Arc::new(Named("quotes"))).unwrap();
        assert!(registry.get("quotes").is_some());
        assert!(registry.get("missing").is_none());
    }
}
