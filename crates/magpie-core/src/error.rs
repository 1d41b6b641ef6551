//! Unified error types for the Magpie dispatch core.
//!
//! Each external concern gets its own `thiserror` enum. Handler code is the
//! one exception: plugins and listeners report failures as a boxed error
//! ([`HandlerError`]) so authors can `?` anything — the supervisor only ever
//! logs them, it never matches on them.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors surfaced by the underlying event transport.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Connection could not be established.
    #[error("connection failed: {reason}")]
    ConnectionFailed {
        /// Reason for failure.
        reason: String,
    },

    /// Connection closed while in use.
    #[error("connection closed: {reason}")]
    Closed {
        /// Reason for closure.
        reason: String,
    },

    /// An outbound call could not be delivered.
    #[error("failed to send: {0}")]
    SendFailed(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

// =============================================================================
// API Errors
// =============================================================================

/// Errors produced by outbound API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The bot is not connected.
    #[error("bot is not connected")]
    NotConnected,

    /// The remote end answered with a non-zero return code.
    #[error("API error ({retcode}): {message}")]
    Api {
        /// Return code reported by the remote end.
        retcode: i64,
        /// Human-readable error message.
        message: String,
    },

    /// Failed to serialize or deserialize a payload.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Transport-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The envelope does not carry the session information required to
    /// route this call (e.g. a group call on an envelope without a group).
    #[error("missing session info")]
    MissingSession,

    /// A captured reply action was invoked after its originating session
    /// was torn down.
    #[error("reply action is stale: originating session is gone")]
    StaleReply,
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors raised at plugin registration time.
///
/// Both variants are fatal at startup: a bot with a misnamed plugin should
/// not come up at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The plugin reported an empty name.
    #[error("plugin name must not be empty")]
    EmptyName,

    /// A plugin with the same name is already registered.
    #[error("a plugin named '{0}' is already registered")]
    DuplicateName(String),
}

// =============================================================================
// Handler Errors
// =============================================================================

/// Boxed error type returned by plugins and listeners.
///
/// The supervisor catches these, logs them with the handler's identity and
/// the envelope context, and moves on — they never abort the dispatch loop.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;
