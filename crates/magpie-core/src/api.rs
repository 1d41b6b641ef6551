//! Typed outbound API surface.
//!
//! [`Api`] wraps a transport handle with strongly-typed methods for the
//! message and group-management operations a plugin is likely to need.
//! Every method goes through [`Api::call`], which checks the remote return
//! code and unwraps the `data` field, so errors surface uniformly as
//! [`ApiError`] to whichever handler made the call.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::model::api::{FriendInfo, GroupInfo, GroupMemberInfo, LoginInfo, StrangerInfo};
use crate::model::envelope::{MessageEnvelope, RawMessage};
use crate::model::segment::Segment;
use crate::transport::Transport;

/// Typed API wrapper over a transport handle.
#[derive(Clone)]
pub struct Api {
    transport: Arc<dyn Transport>,
}

impl Api {
    /// Creates an API wrapper for `transport`.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Issues a raw API call, checks the return code, and extracts `data`.
    pub async fn call(&self, action: &str, params: Value) -> ApiResult<Value> {
        debug!(action, "calling api");
        let response = self.transport.call(action, params).await?;

        if let Some(retcode) = response.get("retcode").and_then(Value::as_i64)
            && retcode != 0
        {
            let message = response
                .get("message")
                .or_else(|| response.get("wording"))
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(ApiError::Api { retcode, message });
        }

        Ok(response.get("data").cloned().unwrap_or(response))
    }
}

macro_rules! api_method {
    // No return value.
    ($(#[$meta:meta])* $name:ident, ($($arg:ident: $ty:ty),* $(,)?)) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $ty),*) -> ApiResult<()> {
            self.call(stringify!($name), json!({ $(stringify!($arg): $arg),* }))
                .await?;
            Ok(())
        }
    };
    // Deserializes the whole `data` payload into `$ret`.
    ($(#[$meta:meta])* $name:ident, ($($arg:ident: $ty:ty),* $(,)?) -> $ret:ty) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $ty),*) -> ApiResult<$ret> {
            let data = self
                .call(stringify!($name), json!({ $(stringify!($arg): $arg),* }))
                .await?;
            Ok(serde_json::from_value::<$ret>(data)?)
        }
    };
    // Extracts one field of the `data` payload.
    ($(#[$meta:meta])* $name:ident, ($($arg:ident: $ty:ty),* $(,)?) -> $ret:ty, $field:expr) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $ty),*) -> ApiResult<$ret> {
            let data = self
                .call(stringify!($name), json!({ $(stringify!($arg): $arg),* }))
                .await?;
            data.get($field)
                .cloned()
                .and_then(|v| serde_json::from_value::<$ret>(v).ok())
                .ok_or_else(|| ApiError::Serialization(format!("missing {}", $field)))
        }
    };
}

// =========================================================================
// Message APIs
// =========================================================================

impl Api {
    api_method!(
        /// Sends a private message. Returns the new message's id.
        send_private_msg,
        (user_id: i64, message: Vec<Segment>) -> i64,
        "message_id"
    );

    api_method!(
        /// Sends a group message. Returns the new message's id.
        send_group_msg,
        (group_id: i64, message: Vec<Segment>) -> i64,
        "message_id"
    );

    /// Sends a message to a group or a user, whichever `is_group` says.
    pub async fn send_message(
        &self,
        message: Vec<Segment>,
        id: i64,
        is_group: bool,
    ) -> ApiResult<i64> {
        if is_group {
            self.send_group_msg(id, message).await
        } else {
            self.send_private_msg(id, message).await
        }
    }

    api_method!(
        /// Deletes (recalls) a message.
        delete_msg,
        (message_id: i64)
    );

    /// Fetches a message by id as a detached envelope.
    ///
    /// The returned envelope has no live session behind it, so its `reply`
    /// action fails as stale; use the send methods to respond.
    pub async fn get_msg(&self, message_id: i64) -> ApiResult<MessageEnvelope> {
        let data = self.call("get_msg", json!({ "message_id": message_id })).await?;
        let raw: RawMessage = serde_json::from_value(data)?;
        Ok(MessageEnvelope::detached(raw))
    }

    // =========================================================================
    // Information APIs
    // =========================================================================

    api_method!(
        /// Gets the bot account's own login info.
        get_login_info,
        () -> LoginInfo
    );

    api_method!(
        /// Gets profile info for an arbitrary user.
        get_stranger_info,
        (user_id: i64) -> StrangerInfo
    );

    api_method!(
        /// Gets the friend list.
        get_friend_list,
        () -> Vec<FriendInfo>
    );

    api_method!(
        /// Gets info about one group.
        get_group_info,
        (group_id: i64) -> GroupInfo
    );

    api_method!(
        /// Gets the list of joined groups.
        get_group_list,
        () -> Vec<GroupInfo>
    );

    api_method!(
        /// Gets info about one group member.
        get_group_member_info,
        (group_id: i64, user_id: i64) -> GroupMemberInfo
    );

    api_method!(
        /// Gets the member list of a group.
        get_group_member_list,
        (group_id: i64) -> Vec<GroupMemberInfo>
    );

    /// Gets the currently muted members of a group.
    pub async fn get_muted_members(&self, group_id: i64) -> ApiResult<Vec<GroupMemberInfo>> {
        let members = self.get_group_member_list(group_id).await?;
        Ok(members.into_iter().filter(GroupMemberInfo::is_muted).collect())
    }

    /// True iff the bot account holds admin rights in `group_id`.
    pub async fn is_group_admin(&self, group_id: i64) -> ApiResult<bool> {
        let login = self.get_login_info().await?;
        let member = self.get_group_member_info(group_id, login.user_id).await?;
        Ok(member.role == "admin" || member.role == "owner")
    }

    // =========================================================================
    // Group Management APIs
    // =========================================================================

    api_method!(
        /// Kicks a member from a group.
        set_group_kick,
        (group_id: i64, user_id: i64, reject_add_request: bool)
    );

    api_method!(
        /// Mutes a member. `duration` is in seconds; zero unmutes.
        set_group_ban,
        (group_id: i64, user_id: i64, duration: u32)
    );

    api_method!(
        /// Mutes or unmutes the whole group.
        set_group_whole_ban,
        (group_id: i64, enable: bool)
    );

    api_method!(
        /// Grants or revokes admin rights for a member.
        set_group_admin,
        (group_id: i64, user_id: i64, enable: bool)
    );

    api_method!(
        /// Sets a member's group card. Empty string clears it.
        set_group_card,
        (group_id: i64, user_id: i64, card: &str)
    );

    api_method!(
        /// Renames the group.
        set_group_name,
        (group_id: i64, group_name: &str)
    );

    api_method!(
        /// Leaves the group.
        set_group_leave,
        (group_id: i64)
    );

    api_method!(
        /// Sets a member's special title. Empty string clears it.
        set_group_special_title,
        (group_id: i64, user_id: i64, special_title: &str)
    );
}
