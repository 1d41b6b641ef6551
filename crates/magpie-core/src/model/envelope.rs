//! Message normalization.
//!
//! A [`MessageEnvelope`] is the stable, read-only view the rest of the core
//! works with. It is built exactly once from a raw inbound payload; the kind
//! is derived at construction and never changes, and the segment list is
//! never mutated afterwards.
//!
//! Fields the payload omits map to `None`, not to a type-inconsistent
//! default.

use std::sync::Weak;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::api::Api;
use crate::error::{ApiError, ApiResult};
use crate::model::segment::Segment;
use crate::transport::Transport;

// ============================================================================
// Raw payload
// ============================================================================

/// One raw inbound event, as deserialized off the wire.
///
/// Every field is optional: the three known message shapes (group,
/// private-friend, private-temporary) each populate a different subset, and
/// non-message events populate almost none of them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessage {
    /// The receiving bot's own id.
    #[serde(default)]
    pub self_id: Option<i64>,
    /// The sender's id.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Unix timestamp of the event.
    #[serde(default)]
    pub time: Option<i64>,
    /// Message id.
    #[serde(default)]
    pub message_id: Option<i64>,
    /// Message content as an ordered segment list.
    #[serde(default)]
    pub message: Vec<Segment>,
    /// Message type discriminator ("group" or "private").
    #[serde(default)]
    pub message_type: Option<String>,
    /// Sub-type discriminator ("friend", "group", "normal", ...).
    #[serde(default)]
    pub sub_type: Option<String>,
    /// Group id, for group messages.
    #[serde(default)]
    pub group_id: Option<i64>,
    /// Flattened text representation.
    #[serde(default)]
    pub raw_message: Option<String>,
    /// Sender metadata.
    #[serde(default)]
    pub sender: Option<Sender>,
}

/// Sender metadata attached to a message event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sender {
    /// User id.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Nickname.
    #[serde(default)]
    pub nickname: Option<String>,
    /// Group card (per-group display name).
    #[serde(default)]
    pub card: Option<String>,
    /// Group role ("owner", "admin", "member").
    #[serde(default)]
    pub role: Option<String>,
}

// ============================================================================
// ChatKind
// ============================================================================

/// The conversation kind of an envelope, derived once at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatKind {
    /// A group message.
    Group,
    /// A private message from a friend.
    Private,
    /// A temporary (group-initiated) private conversation.
    Temporary,
    /// Any other type/sub-type combination. Never dispatched.
    Unknown,
}

impl ChatKind {
    /// Derives the kind from the raw discriminator pair.
    ///
    /// `group` is a group message regardless of sub-type; `private` splits
    /// on sub-type `friend` vs `group`; everything else is [`Unknown`].
    ///
    /// [`Unknown`]: ChatKind::Unknown
    pub fn derive(message_type: Option<&str>, sub_type: Option<&str>) -> Self {
        match (message_type, sub_type) {
            (Some("group"), _) => Self::Group,
            (Some("private"), Some("friend")) => Self::Private,
            (Some("private"), Some("group")) => Self::Temporary,
            _ => Self::Unknown,
        }
    }
}

// ============================================================================
// MessageEnvelope
// ============================================================================

/// Immutable, normalized view over one inbound chat event.
pub struct MessageEnvelope {
    self_id: Option<i64>,
    sender_id: Option<i64>,
    group_id: Option<i64>,
    message_id: Option<i64>,
    time: Option<i64>,
    kind: ChatKind,
    segments: Vec<Segment>,
    raw_text: String,
    sender: Option<Sender>,
    /// Weak handle back to the session this envelope arrived on. `None` for
    /// envelopes reconstructed out of band (e.g. from a `get_msg` call).
    transport: Option<Weak<dyn Transport>>,
}

impl MessageEnvelope {
    /// Normalizes a raw payload into an envelope bound to `transport`.
    ///
    /// Pure transformation, no side effects: the kind is computed here and
    /// fixed for the envelope's lifetime, and `group_id` is only kept when
    /// the event actually is a group message.
    pub fn from_raw(raw: RawMessage, transport: Option<Weak<dyn Transport>>) -> Self {
        let kind = ChatKind::derive(raw.message_type.as_deref(), raw.sub_type.as_deref());
        let raw_text = raw
            .raw_message
            .unwrap_or_else(|| flatten_text(&raw.message));

        Self {
            self_id: raw.self_id,
            sender_id: raw.user_id,
            group_id: if kind == ChatKind::Group {
                raw.group_id
            } else {
                None
            },
            message_id: raw.message_id,
            time: raw.time,
            kind,
            segments: raw.message,
            raw_text,
            sender: raw.sender,
            transport,
        }
    }

    /// Normalizes a raw JSON payload into an envelope bound to `transport`.
    pub fn from_value(
        value: Value,
        transport: Option<Weak<dyn Transport>>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self::from_raw(serde_json::from_value(value)?, transport))
    }

    /// Builds an envelope with no live session behind it.
    ///
    /// Its [`reply`](Self::reply) action always fails as stale.
    pub fn detached(raw: RawMessage) -> Self {
        Self::from_raw(raw, None)
    }

    /// The receiving bot's own id, if the payload carried one.
    pub fn self_id(&self) -> Option<i64> {
        self.self_id
    }

    /// The sender's id, if the payload carried one.
    pub fn sender_id(&self) -> Option<i64> {
        self.sender_id
    }

    /// The group id. `Some` iff this is a group message.
    pub fn group_id(&self) -> Option<i64> {
        self.group_id
    }

    /// The message id, if the payload carried one.
    pub fn message_id(&self) -> Option<i64> {
        self.message_id
    }

    /// Unix timestamp of the event.
    pub fn time(&self) -> Option<i64> {
        self.time
    }

    /// The conversation kind.
    pub fn kind(&self) -> ChatKind {
        self.kind
    }

    /// The ordered message segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The flattened text representation. May be empty.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// The sender's nickname, when known.
    pub fn sender_name(&self) -> Option<&str> {
        self.sender.as_ref()?.nickname.as_deref()
    }

    /// The sender's group card, when known.
    pub fn sender_card(&self) -> Option<&str> {
        self.sender.as_ref()?.card.as_deref()
    }

    /// True iff this is a group message.
    pub fn is_group(&self) -> bool {
        self.kind == ChatKind::Group
    }

    /// True iff this is a private friend message.
    pub fn is_private(&self) -> bool {
        self.kind == ChatKind::Private
    }

    /// True iff this is a temporary private conversation.
    pub fn is_temporary(&self) -> bool {
        self.kind == ChatKind::Temporary
    }

    /// True iff some mention segment targets this bot.
    ///
    /// Targets arrive as strings on the wire while `self_id` is numeric;
    /// both sides are compared as strings, so `12345` and `"12345"` match.
    pub fn is_at_self(&self) -> bool {
        let Some(self_id) = self.self_id else {
            return false;
        };
        let self_id = self_id.to_string();
        self.segments
            .iter()
            .any(|segment| matches!(segment, Segment::At(at) if at.qq == self_id))
    }

    /// The id of the quoted message, taken from the **first** reply segment
    /// in order. `None` when the message quotes nothing.
    pub fn reply_target(&self) -> Option<i64> {
        self.segments.iter().find_map(|segment| match segment {
            Segment::Reply(reply) => Some(reply.target_id()),
            _ => None,
        })?
    }

    /// Sends a response correlated to this envelope.
    ///
    /// For group messages, `at_sender` prepends a mention of the sender.
    /// Fails with [`ApiError::StaleReply`] once the originating session is
    /// gone, and with [`ApiError::MissingSession`] when the envelope lacks
    /// the ids needed to route the response.
    pub async fn reply(&self, message: Vec<Segment>, at_sender: bool) -> ApiResult<i64> {
        let transport = self
            .transport
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or(ApiError::StaleReply)?;
        let api = Api::new(transport);

        match self.kind {
            ChatKind::Group => {
                let group_id = self.group_id.ok_or(ApiError::MissingSession)?;
                let mut message = message;
                if at_sender && let Some(sender_id) = self.sender_id {
                    message.insert(0, Segment::at(sender_id));
                }
                debug!(group_id, "sending group reply");
                api.send_group_msg(group_id, message).await
            }
            ChatKind::Private | ChatKind::Temporary => {
                let user_id = self.sender_id.ok_or(ApiError::MissingSession)?;
                debug!(user_id, "sending private reply");
                api.send_private_msg(user_id, message).await
            }
            ChatKind::Unknown => Err(ApiError::MissingSession),
        }
    }

    /// Convenience wrapper over [`reply`](Self::reply) for plain text.
    pub async fn reply_text(&self, text: impl Into<String>, at_sender: bool) -> ApiResult<i64> {
        self.reply(vec![Segment::text(text)], at_sender).await
    }
}

impl std::fmt::Debug for MessageEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageEnvelope")
            .field("kind", &self.kind)
            .field("self_id", &self.self_id)
            .field("sender_id", &self.sender_id)
            .field("group_id", &self.group_id)
            .field("message_id", &self.message_id)
            .field("segments", &self.segments.len())
            .field("raw_text", &self.raw_text)
            .finish()
    }
}

/// Concatenates the text of every text segment, in order.
fn flatten_text(segments: &[Segment]) -> String {
    segments
        .iter()
        .filter_map(Segment::as_text)
        .collect::<String>()
}
