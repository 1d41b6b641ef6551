//! Admission policy.
//!
//! [`FilterPolicy`] decides whether an envelope is dispatched at all. It is
//! plain mutable configuration on the bot; changes apply to subsequent
//! envelopes (best effort, no synchronization against in-flight dispatch).

use std::collections::HashSet;

use crate::model::envelope::{ChatKind, MessageEnvelope};

/// Per-bot admission policy.
///
/// # The group allow-list
///
/// `allowed_groups` is deliberately three-state:
///
/// - `None` — no group message is ever dispatched, full stop.
/// - `Some(empty)` — every group is accepted (wildcard).
/// - `Some({...})` — only the listed groups are accepted.
///
/// The empty-set-as-wildcard distinction is easy to trip over from config
/// code, but it is long-standing observable behavior and is kept exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPolicy {
    /// Group allow-list; see the type-level docs for the `None` vs empty
    /// distinction.
    pub allowed_groups: Option<HashSet<i64>>,
    /// Accept private friend messages.
    pub allow_private: bool,
    /// Accept temporary private conversations.
    pub allow_temporary: bool,
    /// Command prefixes, tried in order. Must not be empty.
    pub prefixes: Vec<String>,
}

impl Default for FilterPolicy {
    /// Accept everything, with `"."` as the only command prefix.
    fn default() -> Self {
        Self {
            allowed_groups: Some(HashSet::new()),
            allow_private: true,
            allow_temporary: true,
            prefixes: vec![".".to_string()],
        }
    }
}

impl FilterPolicy {
    /// Decides whether `envelope` should be dispatched.
    ///
    /// Pure function of the policy, the envelope's kind, and its group id.
    /// First rejection wins:
    ///
    /// 1. group message, `allowed_groups` is `None` → reject
    /// 2. group message, non-empty allow-list without this group → reject
    /// 3. private message, `!allow_private` → reject
    /// 4. temporary conversation, `!allow_temporary` → reject
    /// 5. unknown kind → reject (not a dispatchable shape)
    /// 6. otherwise → accept
    pub fn accepts(&self, envelope: &MessageEnvelope) -> bool {
        match envelope.kind() {
            ChatKind::Group => match &self.allowed_groups {
                None => false,
                Some(groups) if groups.is_empty() => true,
                Some(groups) => envelope
                    .group_id()
                    .is_some_and(|group_id| groups.contains(&group_id)),
            },
            ChatKind::Private => self.allow_private,
            ChatKind::Temporary => self.allow_temporary,
            ChatKind::Unknown => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::envelope::RawMessage;

    fn group_envelope(group_id: i64) -> MessageEnvelope {
        MessageEnvelope::detached(RawMessage {
            message_type: Some("group".into()),
            group_id: Some(group_id),
            ..RawMessage::default()
        })
    }

    fn private_envelope(sub_type: &str) -> MessageEnvelope {
        MessageEnvelope::detached(RawMessage {
            message_type: Some("private".into()),
            sub_type: Some(sub_type.into()),
            user_id: Some(1),
            ..RawMessage::default()
        })
    }

    #[test]
    fn null_allow_list_rejects_every_group() {
        let policy = FilterPolicy {
            allowed_groups: None,
            ..FilterPolicy::default()
        };
        assert!(!policy.accepts(&group_envelope(1)));
        assert!(!policy.accepts(&group_envelope(460048859)));
        // Non-group kinds are unaffected.
        assert!(policy.accepts(&private_envelope("friend")));
    }

    #[test]
    fn empty_allow_list_accepts_every_group() {
        let policy = FilterPolicy::default();
        assert!(policy.accepts(&group_envelope(1)));
        assert!(policy.accepts(&group_envelope(999)));
    }

    #[test]
    fn listed_group_accepted_unlisted_rejected() {
        let g = 460048859;
        let g2 = 673172432;
        let policy = FilterPolicy {
            allowed_groups: Some([g].into_iter().collect()),
            allow_private: false,
            ..FilterPolicy::default()
        };
        assert!(policy.accepts(&group_envelope(g)));

        let policy2 = FilterPolicy {
            allowed_groups: Some([g2].into_iter().collect()),
            ..policy
        };
        assert!(!policy2.accepts(&group_envelope(g)));
    }

    #[test]
    fn private_toggle_rejects_friend_messages() {
        let policy = FilterPolicy {
            allow_private: false,
            ..FilterPolicy::default()
        };
        assert!(!policy.accepts(&private_envelope("friend")));
        assert!(policy.accepts(&private_envelope("group")));
    }

    #[test]
    fn temporary_rejected_even_when_private_allowed() {
        let policy = FilterPolicy {
            allow_private: true,
            allow_temporary: false,
            ..FilterPolicy::default()
        };
        assert!(!policy.accepts(&private_envelope("group")));
        assert!(policy.accepts(&private_envelope("friend")));
    }

    #[test]
    fn unknown_kind_is_never_dispatched() {
        let envelope = MessageEnvelope::detached(RawMessage::default());
        assert!(!FilterPolicy::default().accepts(&envelope));
    }
}
