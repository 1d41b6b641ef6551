//! Typed response structures for outbound API calls.
//!
//! These are deliberately lenient: every non-essential field defaults, so a
//! remote end that omits optional metadata never fails a whole call.

use serde::{Deserialize, Serialize};

/// Response of `get_login_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginInfo {
    /// The bot's own user id.
    pub user_id: i64,
    /// The bot's nickname.
    #[serde(default)]
    pub nickname: String,
}

/// Response of `get_stranger_info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrangerInfo {
    /// User id.
    pub user_id: i64,
    /// Nickname.
    #[serde(default)]
    pub nickname: String,
    /// Sex ("male", "female", "unknown").
    #[serde(default)]
    pub sex: String,
    /// Age.
    #[serde(default)]
    pub age: i32,
}

/// One entry of `get_friend_list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FriendInfo {
    /// User id.
    pub user_id: i64,
    /// Nickname.
    #[serde(default)]
    pub nickname: String,
    /// Remark set by the bot account.
    #[serde(default)]
    pub remark: String,
}

/// Response of `get_group_info` and entries of `get_group_list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupInfo {
    /// Group id.
    pub group_id: i64,
    /// Group name.
    #[serde(default)]
    pub group_name: String,
    /// Current member count.
    #[serde(default)]
    pub member_count: i32,
    /// Maximum member count.
    #[serde(default)]
    pub max_member_count: i32,
}

/// Response of `get_group_member_info` and entries of
/// `get_group_member_list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMemberInfo {
    /// Group id.
    pub group_id: i64,
    /// User id.
    pub user_id: i64,
    /// Nickname.
    #[serde(default)]
    pub nickname: String,
    /// Group card (per-group display name).
    #[serde(default)]
    pub card: String,
    /// Group role ("owner", "admin", "member").
    #[serde(default)]
    pub role: String,
    /// Join timestamp.
    #[serde(default)]
    pub join_time: i64,
    /// Last message timestamp.
    #[serde(default)]
    pub last_sent_time: i64,
    /// Mute expiry timestamp; zero when the member is not muted.
    #[serde(default)]
    pub shut_up_timestamp: i64,
    /// Special title.
    #[serde(default)]
    pub title: String,
}

impl GroupMemberInfo {
    /// The name to show for this member: the group card when set, the
    /// nickname otherwise.
    pub fn display_name(&self) -> &str {
        if self.card.is_empty() {
            &self.nickname
        } else {
            &self.card
        }
    }

    /// True while the member is muted.
    pub fn is_muted(&self) -> bool {
        self.shut_up_timestamp > 0
    }
}
