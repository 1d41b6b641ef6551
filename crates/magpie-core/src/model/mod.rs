//! Wire-level data model: message segments, the normalized envelope, and
//! typed API response structures.

pub mod api;
pub mod envelope;
pub mod segment;

pub use api::{FriendInfo, GroupInfo, GroupMemberInfo, LoginInfo, StrangerInfo};
pub use envelope::{ChatKind, MessageEnvelope, RawMessage, Sender};
pub use segment::Segment;
