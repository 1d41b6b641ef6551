//! Command detection.
//!
//! A message invokes a command when its **first** text segment contains, as
//! a case-sensitive substring, any configured prefix immediately followed by
//! any candidate command. Segments after the first text segment are never
//! examined — multi-segment messages with the command text in a later text
//! segment do not match. That narrow rule is long-standing observable
//! behavior and is kept as documented, not silently relaxed.

use crate::model::envelope::MessageEnvelope;
use crate::model::segment::Segment;

/// Returns whether `envelope` invokes one of `commands`.
///
/// With `require_mention`, the envelope must additionally @mention the bot
/// itself. Matching is plain substring containment on `prefix + command`
/// over the cartesian product of `prefixes` and `commands`, evaluated on
/// the first text segment only.
///
/// Stateless; a single command is just a one-element slice.
///
/// # Example
///
/// ```rust,ignore
/// let prefixes = vec![".".to_string(), ". ".to_string()];
/// // ".quote" and ". quote" both match; "xquote" does not.
/// command::matches(&envelope, &prefixes, &["quote"], false);
/// ```
pub fn matches(
    envelope: &MessageEnvelope,
    prefixes: &[String],
    commands: &[&str],
    require_mention: bool,
) -> bool {
    if require_mention && !envelope.is_at_self() {
        return false;
    }

    for segment in envelope.segments() {
        if let Segment::Text(text) = segment {
            return prefixes.iter().any(|prefix| {
                commands
                    .iter()
                    .any(|command| text.text.contains(&format!("{prefix}{command}")))
            });
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(message: serde_json::Value) -> MessageEnvelope {
        MessageEnvelope::from_value(
            json!({
                "self_id": 100,
                "user_id": 2,
                "message_type": "group",
                "group_id": 3,
                "message": message
            }),
            None,
        )
        .unwrap()
    }

    fn prefixes() -> Vec<String> {
        vec![".".to_string(), ". ".to_string()]
    }

    #[test]
    fn prefix_plus_command_substring_matches() {
        let e = envelope(json!([{"type": "text", "data": {"text": ".quote"}}]));
        assert!(matches(&e, &prefixes(), &["quote"], false));

        let e = envelope(json!([{"type": "text", "data": {"text": ". quote"}}]));
        assert!(matches(&e, &prefixes(), &["quote"], false));

        // Substring containment: the command may sit mid-text.
        let e = envelope(json!([{"type": "text", "data": {"text": "please .quote now"}}]));
        assert!(matches(&e, &prefixes(), &["quote"], false));
    }

    #[test]
    fn missing_prefix_does_not_match() {
        let e = envelope(json!([{"type": "text", "data": {"text": "xquote"}}]));
        assert!(!matches(&e, &prefixes(), &["quote"], false));

        let e = envelope(json!([{"type": "text", "data": {"text": "quote"}}]));
        assert!(!matches(&e, &prefixes(), &["quote"], false));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let e = envelope(json!([{"type": "text", "data": {"text": ".Quote"}}]));
        assert!(!matches(&e, &prefixes(), &["quote"], false));
    }

    #[test]
    fn only_the_first_text_segment_is_examined() {
        let e = envelope(json!([
            {"type": "text", "data": {"text": "hello"}},
            {"type": "text", "data": {"text": ".quote"}}
        ]));
        assert!(!matches(&e, &prefixes(), &["quote"], false));

        // A leading non-text segment does not count as the first text segment.
        let e = envelope(json!([
            {"type": "face", "data": {"id": "1"}},
            {"type": "text", "data": {"text": ".quote"}}
        ]));
        assert!(matches(&e, &prefixes(), &["quote"], false));
    }

    #[test]
    fn no_text_segment_never_matches() {
        let e = envelope(json!([{"type": "face", "data": {"id": "1"}}]));
        assert!(!matches(&e, &prefixes(), &["quote"], false));

        let e = envelope(json!([]));
        assert!(!matches(&e, &prefixes(), &["quote"], false));
    }

    #[test]
    fn any_candidate_command_matches() {
        let e = envelope(json!([{"type": "text", "data": {"text": ".collect this"}}]));
        assert!(matches(&e, &prefixes(), &["quote", "collect"], false));
    }

    #[test]
    fn require_mention_gates_on_is_at_self() {
        let e = envelope(json!([
            {"type": "at", "data": {"qq": "100"}},
            {"type": "text", "data": {"text": ".quote"}}
        ]));
        assert!(matches(&e, &prefixes(), &["quote"], true));

        let e = envelope(json!([{"type": "text", "data": {"text": ".quote"}}]));
        assert!(!matches(&e, &prefixes(), &["quote"], true));
    }
}
