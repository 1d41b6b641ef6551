//! The dispatch pipeline: admission filtering, command matching, handler
//! registries, and the fault-isolating fan-out supervisor.

pub mod command;
pub mod policy;
pub mod registry;
pub mod supervisor;

pub use policy::FilterPolicy;
pub use registry::{Listener, ListenerRegistry, PluginRegistry};
