//! Quote Bot Demo
//!
//! Wires the dispatch core end to end: config, logging, policy, a plugin,
//! a listener, and a transport. The core is transport-agnostic, so this
//! demo drives it with the in-memory transport and a scripted session —
//! two synthetic group messages that collect and then replay a quote.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package quote-bot
//! ```

mod plugin;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::{Value, json};
use tracing::info;

use magpie_core::{Bot, MemoryTransport};
use magpie_runtime::{MagpieConfig, logging};

use crate::plugin::QuotePlugin;

const GROUP: i64 = 460048859;
const SELF_ID: i64 = 100;

/// A group message event as the wire would deliver it.
fn group_message(user_id: i64, segments: Value) -> Value {
    json!({
        "post_type": "message",
        "message_type": "group",
        "sub_type": "normal",
        "self_id": SELF_ID,
        "group_id": GROUP,
        "user_id": user_id,
        "message_id": 9000 + user_id,
        "time": 1_700_000_000,
        "message": segments,
        "sender": {"user_id": user_id, "nickname": "demo user"}
    })
}

async fn script(transport: &MemoryTransport) -> Result<()> {
    // The message that will be quoted.
    transport.respond_with(
        "get_msg",
        json!({
            "status": "ok",
            "retcode": 0,
            "data": {
                "message_id": 777,
                "user_id": 42,
                "message_type": "group",
                "sub_type": "normal",
                "message": [{"type": "text", "data": {"text": "ship it on friday"}}]
            }
        }),
    );
    transport.respond_with(
        "get_group_member_info",
        json!({
            "status": "ok",
            "retcode": 0,
            "data": {"group_id": GROUP, "user_id": 42, "nickname": "alice", "card": "alice the bold"}
        }),
    );
    transport.respond_with(
        "send_group_msg",
        json!({"status": "ok", "retcode": 0, "data": {"message_id": 555}}),
    );

    // Reply to message 777 with the collect command.
    transport
        .inject(group_message(
            7,
            json!([
                {"type": "reply", "data": {"id": "777"}},
                {"type": "text", "data": {"text": ".collect"}}
            ]),
        ))
        .await?;
    // Then ask for the quote back.
    transport
        .inject(group_message(
            8,
            json!([{"type": "text", "data": {"text": ".quote"}}]),
        ))
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = MagpieConfig::load()?;
    logging::init_from_config(&config.logging);

    let transport = Arc::new(MemoryTransport::new());
    script(&transport).await?;

    let bot = Bot::new(transport.clone());
    bot.set_policy(config.filter.to_policy());
    bot.register(QuotePlugin::new())?;
    bot.on_message(|envelope| async move {
        info!(
            kind = ?envelope.kind(),
            sender = envelope.sender_id(),
            text = envelope.raw_text(),
            "message received"
        );
        Ok(())
    });

    bot.connect().await?;

    // Let the scripted session play out.
    tokio::time::sleep(Duration::from_millis(200)).await;
    bot.shutdown();

    for (action, params) in transport.calls() {
        info!(%action, %params, "outbound call");
    }

    Ok(())
}
