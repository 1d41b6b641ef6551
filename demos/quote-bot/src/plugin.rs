//! The quote plugin.
//!
//! Two commands, group chats only:
//!
//! - reply to a message with `.collect` — fetch the quoted message and
//!   store it as the group's current quote
//! - `.quote` — post the stored quote with attribution

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use magpie_core::{Bot, HandlerError, MessageEnvelope, Plugin, Segment};
use magpie_store::JsonStore;

const NAME: &str = "quotes";

/// One collected quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRecord {
    /// Who said it.
    pub user_id: Option<i64>,
    /// What they said, reduced to displayable segments.
    pub segments: Vec<Segment>,
}

/// Collects and replays one quote per group.
pub struct QuotePlugin {
    store: JsonStore,
}

impl QuotePlugin {
    /// Creates the plugin with its store rooted under `data/quotes`.
    pub fn new() -> Self {
        Self::with_root(PathBuf::from("data").join(NAME))
    }

    /// Creates the plugin with quotes stored under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(root),
        }
    }

    async fn collect(
        &self,
        bot: &Bot,
        envelope: &MessageEnvelope,
        group_id: i64,
        target: i64,
    ) -> Result<(), HandlerError> {
        let quoted = bot.api().get_msg(target).await?;

        // Keep only what can be replayed as text.
        let segments: Vec<Segment> = quoted
            .segments()
            .iter()
            .filter(|segment| matches!(segment.kind(), "text" | "at" | "face"))
            .cloned()
            .collect();

        let record = QuoteRecord {
            user_id: quoted.sender_id(),
            segments,
        };
        self.store.write(&group_id.to_string(), &record).await?;

        info!(group_id, "collected a quote");
        envelope.reply_text("quote saved", false).await?;
        Ok(())
    }

    async fn replay(
        &self,
        bot: &Bot,
        envelope: &MessageEnvelope,
        group_id: i64,
    ) -> Result<(), HandlerError> {
        let Some(record) = self
            .store
            .read::<QuoteRecord>(&group_id.to_string())
            .await?
        else {
            envelope.reply_text("no quotes collected yet", false).await?;
            return Ok(());
        };

        let attribution = match record.user_id {
            Some(user_id) => {
                let member = bot.api().get_group_member_info(group_id, user_id).await?;
                format!("— {}", member.display_name())
            }
            None => "— someone, once".to_string(),
        };

        let mut message = record.segments;
        message.push(Segment::text(format!("\n{attribution}")));
        envelope.reply(message, false).await?;
        Ok(())
    }
}

impl Default for QuotePlugin {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Plugin for QuotePlugin {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> Option<&str> {
        Some("collects one memorable quote per group and replays it")
    }

    async fn run(&self, bot: Arc<Bot>, envelope: Arc<MessageEnvelope>) -> Result<(), HandlerError> {
        let Some(group_id) = envelope.group_id() else {
            return Ok(());
        };

        if let Some(target) = envelope.reply_target()
            && bot.check_command(&envelope, &["collect"], false)
        {
            return self.collect(&bot, &envelope, group_id, target).await;
        }

        if bot.check_command(&envelope, &["quote"], false) {
            return self.replay(&bot, &envelope, group_id).await;
        }

        Ok(())
    }
}
