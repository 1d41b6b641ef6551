//! Configuration schema and loader.
//!
//! Sources, lowest to highest priority: built-in defaults, `magpie.toml`,
//! then `MAGPIE_*` environment variables with `__` as the nesting
//! separator (`MAGPIE_FILTER__ALLOW_PRIVATE=false` →
//! `filter.allow_private = false`).
//!
//! # Example
//!
//! ```toml
//! [connection]
//! url = "ws://127.0.0.1:3001"
//!
//! [filter]
//! groups = [460048859, 673172432]
//! allow_private = true
//! allow_temporary = false
//! prefixes = [".", ". "]
//!
//! [logging]
//! level = "info"
//! ```

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use magpie_core::FilterPolicy;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "magpie.toml";

/// Configuration loading failure.
#[derive(Debug, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(#[from] figment::Error);

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MagpieConfig {
    /// Transport connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,
    /// Admission policy settings.
    #[serde(default)]
    pub filter: FilterConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MagpieConfig {
    /// Loads configuration from defaults, [`CONFIG_FILE`], and the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(CONFIG_FILE).extract().map_err(Into::into)
    }

    /// Loads configuration from a specific file path plus the environment.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Self::figment(path).extract().map_err(Into::into)
    }

    fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("MAGPIE_").split("__"))
    }
}

/// Transport connection settings.
///
/// The core treats the transport as an external collaborator; these values
/// are handed to whichever transport implementation the binary wires in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Event endpoint to connect to.
    pub url: String,
    /// Access token, when the remote end requires one.
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:3001".to_string(),
            access_token: None,
        }
    }
}

/// Admission policy settings.
///
/// `allow_groups = false` shuts group dispatch off entirely; with it on,
/// an empty `groups` list accepts every group and a non-empty list accepts
/// only the listed ones. This mirrors the null / empty-set / listed
/// three-state of [`FilterPolicy::allowed_groups`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Master switch for group messages.
    pub allow_groups: bool,
    /// Group allow-list; empty means every group.
    pub groups: Vec<i64>,
    /// Accept private friend messages.
    pub allow_private: bool,
    /// Accept temporary private conversations.
    pub allow_temporary: bool,
    /// Command prefixes, tried in order.
    pub prefixes: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allow_groups: true,
            groups: Vec::new(),
            allow_private: true,
            allow_temporary: true,
            prefixes: vec![".".to_string()],
        }
    }
}

impl FilterConfig {
    /// Maps this section onto a core [`FilterPolicy`].
    pub fn to_policy(&self) -> FilterPolicy {
        FilterPolicy {
            allowed_groups: self
                .allow_groups
                .then(|| self.groups.iter().copied().collect()),
            allow_private: self.allow_private,
            allow_temporary: self.allow_temporary,
            prefixes: if self.prefixes.is_empty() {
                vec![".".to_string()]
            } else {
                self.prefixes.clone()
            },
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level directive ("trace", "debug", "info", "warn", "error").
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> MagpieConfig {
        Figment::from(Serialized::defaults(MagpieConfig::default()))
            .merge(Toml::string(toml))
            .extract()
            .unwrap()
    }

    #[test]
    fn defaults_accept_everything() {
        let config = MagpieConfig::default();
        let policy = config.filter.to_policy();
        assert_eq!(policy, FilterPolicy::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn listed_groups_become_the_allow_list() {
        let config = parse(
            r#"
            [filter]
            groups = [460048859, 673172432]
            allow_temporary = false
            prefixes = [".", ". "]
            "#,
        );
        let policy = config.filter.to_policy();
        assert_eq!(
            policy.allowed_groups,
            Some([460048859, 673172432].into_iter().collect())
        );
        assert!(!policy.allow_temporary);
        assert_eq!(policy.prefixes, vec![".".to_string(), ". ".to_string()]);
    }

    #[test]
    fn disabling_groups_maps_to_none() {
        let config = parse(
            r#"
            [filter]
            allow_groups = false
            groups = [1, 2]
            "#,
        );
        // The list is irrelevant once the master switch is off.
        assert_eq!(config.filter.to_policy().allowed_groups, None);
    }

    #[test]
    fn empty_prefix_list_falls_back_to_the_default() {
        let config = parse(
            r#"
            [filter]
            prefixes = []
            "#,
        );
        assert_eq!(config.filter.to_policy().prefixes, vec![".".to_string()]);
    }

    #[test]
    fn connection_section_parses() {
        let config = parse(
            r#"
            [connection]
            url = "ws://10.0.0.5:3001"
            access_token = "secret"
            "#,
        );
        assert_eq!(config.connection.url, "ws://10.0.0.5:3001");
        assert_eq!(config.connection.access_token.as_deref(), Some("secret"));
    }
}
