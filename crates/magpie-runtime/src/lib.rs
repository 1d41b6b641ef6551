//! # Magpie Runtime
//!
//! Configuration loading and logging setup for Magpie bots. The dispatch
//! core takes its collaborators as constructor arguments; this crate is
//! where a binary assembles them from a `magpie.toml` file and `MAGPIE_*`
//! environment overrides.

pub mod config;
pub mod logging;

pub use config::{ConfigError, ConnectionConfig, FilterConfig, LoggingConfig, MagpieConfig};
