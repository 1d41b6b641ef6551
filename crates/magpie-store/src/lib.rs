//! # Magpie Store
//!
//! JSON-blob persistence for plugins. Each plugin owns a [`JsonStore`]
//! rooted at its own data namespace and keyed by opaque strings (typically
//! a group id). The dispatch core never touches this: persisted state is
//! exclusively the owning plugin's, and the core gives no mutual-exclusion
//! guarantee across two in-flight invocations of the same plugin — a plugin
//! that reads-then-writes across awaits must serialize that itself.
//!
//! Reading a missing key yields `None`, not an error; writing creates the
//! backing directories as needed.
//!
//! # Example
//!
//! ```rust,ignore
//! use magpie_store::JsonStore;
//!
//! let store = JsonStore::new("data/quotes");
//! store.write("460048859", &record).await?;
//! let record: Option<QuoteRecord> = store.read("460048859").await?;
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::fs;
use tracing::trace;

/// Errors raised by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blob exists but does not parse as the requested type.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A directory of JSON blobs, one file per key.
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    /// Creates a store rooted at `root`. The directory is created lazily on
    /// first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Whether a blob exists under `key`.
    pub async fn exists(&self, key: &str) -> bool {
        fs::try_exists(self.path_for(key)).await.unwrap_or(false)
    }

    /// Reads the blob under `key`, or `None` when there is none.
    ///
    /// # Errors
    ///
    /// Only for real failures: an unreadable file or a blob that does not
    /// parse as `T`. A missing key is not a failure.
    pub async fn read<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => {
                trace!(path = %path.display(), "read blob");
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes `value` under `key`, creating directories as needed.
    pub async fn write<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(value)?;
        fs::write(&path, bytes).await?;
        trace!(path = %path.display(), "wrote blob");
        Ok(())
    }

    /// Removes the blob under `key`, if present.
    pub async fn remove(&self, key: &str) -> StoreResult<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
