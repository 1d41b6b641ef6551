//! Typed message segments.
//!
//! A segment is one unit of message content. On the wire every segment is a
//! `{ "type": "...", "data": { ... } }` pair; this module maps the common
//! types onto explicit variants and funnels everything else into
//! [`Segment::Other`], so an exotic segment never sinks the whole envelope.
//!
//! Identifier payloads (`at.qq`, `reply.id`, `face.id`) arrive as either
//! JSON numbers or strings depending on the implementation on the other
//! side of the socket; they are normalized to strings on deserialize.
//!
//! # Example
//!
//! ```rust,ignore
//! use magpie_core::Segment;
//!
//! let message = vec![Segment::text("hello "), Segment::at(10001000)];
//! ```

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ============================================================================
// Segment — the main message content unit
// ============================================================================

/// One typed unit of message content.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Plain text.
    Text(TextData),
    /// Emoji/face by id.
    Face(FaceData),
    /// Image.
    Image(ImageData),
    /// Voice record.
    Record(RecordData),
    /// @mention of a user.
    At(AtData),
    /// Quoted reply to an earlier message.
    Reply(ReplyData),
    /// Any segment type this crate has no dedicated variant for.
    Other(OtherData),
}

/// Payload of a [`Segment::Text`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    /// The text content.
    pub text: String,
}

/// Payload of a [`Segment::Face`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceData {
    /// Face id.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

/// Payload of a [`Segment::Image`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    /// File name or URI of the image.
    pub file: String,
    /// Download URL, when the remote end provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Payload of a [`Segment::Record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    /// File name or URI of the voice record.
    pub file: String,
}

/// Payload of a [`Segment::At`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtData {
    /// Target user id, or `"all"` for an @everyone mention.
    #[serde(deserialize_with = "string_or_number")]
    pub qq: String,
}

/// Payload of a [`Segment::Reply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyData {
    /// Id of the quoted message.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
}

impl ReplyData {
    /// The quoted message id as a number, if it parses as one.
    pub fn target_id(&self) -> Option<i64> {
        self.id.parse().ok()
    }
}

/// Payload of a [`Segment::Other`]: the raw type tag plus its data mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct OtherData {
    /// The wire `type` tag.
    pub kind: String,
    /// The raw `data` mapping.
    pub data: Value,
}

// ============================================================================
// Constructors & accessors
// ============================================================================

impl Segment {
    /// Creates a plain text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextData { text: text.into() })
    }

    /// Creates a face segment.
    pub fn face(id: i64) -> Self {
        Self::Face(FaceData { id: id.to_string() })
    }

    /// Creates an image segment.
    pub fn image(file: impl Into<String>) -> Self {
        Self::Image(ImageData {
            file: file.into(),
            url: None,
        })
    }

    /// Creates an @mention segment.
    pub fn at(user_id: i64) -> Self {
        Self::At(AtData {
            qq: user_id.to_string(),
        })
    }

    /// Creates an @everyone mention segment.
    pub fn at_all() -> Self {
        Self::At(AtData { qq: "all".into() })
    }

    /// Creates a quoted-reply segment.
    pub fn reply(message_id: i64) -> Self {
        Self::Reply(ReplyData {
            id: message_id.to_string(),
        })
    }

    /// The wire `type` tag of this segment.
    pub fn kind(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Face(_) => "face",
            Self::Image(_) => "image",
            Self::Record(_) => "record",
            Self::At(_) => "at",
            Self::Reply(_) => "reply",
            Self::Other(other) => &other.kind,
        }
    }

    /// The text content, for text segments.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(data) => Some(&data.text),
            _ => None,
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

/// The `{ "type": ..., "data": ... }` pair every segment is carried as.
#[derive(Serialize, Deserialize)]
struct WireSegment {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Value,
}

impl Serialize for Segment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let data = match self {
            Self::Text(d) => serde_json::to_value(d),
            Self::Face(d) => serde_json::to_value(d),
            Self::Image(d) => serde_json::to_value(d),
            Self::Record(d) => serde_json::to_value(d),
            Self::At(d) => serde_json::to_value(d),
            Self::Reply(d) => serde_json::to_value(d),
            Self::Other(d) => Ok(d.data.clone()),
        }
        .map_err(S::Error::custom)?;

        WireSegment {
            kind: self.kind().to_string(),
            data,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Segment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = WireSegment::deserialize(deserializer)?;
        let segment = match wire.kind.as_str() {
            "text" => Self::Text(serde_json::from_value(wire.data).map_err(D::Error::custom)?),
            "face" => Self::Face(serde_json::from_value(wire.data).map_err(D::Error::custom)?),
            "image" => Self::Image(serde_json::from_value(wire.data).map_err(D::Error::custom)?),
            "record" => Self::Record(serde_json::from_value(wire.data).map_err(D::Error::custom)?),
            "at" => Self::At(serde_json::from_value(wire.data).map_err(D::Error::custom)?),
            "reply" => Self::Reply(serde_json::from_value(wire.data).map_err(D::Error::custom)?),
            _ => Self::Other(OtherData {
                kind: wire.kind,
                data: wire.data,
            }),
        };
        Ok(segment)
    }
}

/// Accepts a JSON string or number and yields a string.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }

    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}
