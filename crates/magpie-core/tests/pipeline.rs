//! End-to-end pipeline tests: transport → normalization → policy →
//! supervised fan-out, over the in-memory transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use magpie_core::{Bot, HandlerError, MessageEnvelope, MemoryTransport, Plugin};

/// Polls `condition` until it holds or two seconds pass.
async fn wait_until(condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("condition not reached within deadline");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

struct Counting {
    count: Arc<AtomicUsize>,
}

#[async_trait]
impl Plugin for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    async fn run(
        &self,
        _bot: Arc<Bot>,
        _envelope: Arc<MessageEnvelope>,
    ) -> Result<(), HandlerError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Replying;

#[async_trait]
impl Plugin for Replying {
    fn name(&self) -> &str {
        "replying"
    }

    async fn run(
        &self,
        bot: Arc<Bot>,
        envelope: Arc<MessageEnvelope>,
    ) -> Result<(), HandlerError> {
        if bot.check_command(&envelope, &["ping"], false) {
            envelope.reply_text("pong", false).await?;
        }
        Ok(())
    }
}

fn group_message(group_id: i64, text: &str) -> serde_json::Value {
    json!({
        "self_id": 100,
        "user_id": 2,
        "message_type": "group",
        "sub_type": "normal",
        "group_id": group_id,
        "message_id": 1,
        "message": [{"type": "text", "data": {"text": text}}],
        "raw_message": text
    })
}

#[tokio::test]
async fn accepted_events_reach_plugins_and_listeners() {
    let transport = Arc::new(MemoryTransport::new());
    let bot = Bot::new(transport.clone());

    let plugin_hits = Arc::new(AtomicUsize::new(0));
    let listener_hits = Arc::new(AtomicUsize::new(0));

    bot.register(Counting {
        count: Arc::clone(&plugin_hits),
    })
    .unwrap();

    let seen = Arc::clone(&listener_hits);
    bot.on_message(move |_envelope| {
        let seen = Arc::clone(&seen);
        async move {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    bot.connect().await.unwrap();

    transport.inject(group_message(1, "hello")).await.unwrap();
    transport.inject(group_message(1, "again")).await.unwrap();

    wait_until(|| plugin_hits.load(Ordering::SeqCst) == 2).await;
    wait_until(|| listener_hits.load(Ordering::SeqCst) == 2).await;

    bot.shutdown();
}

#[tokio::test]
async fn filtered_events_never_reach_handlers() {
    let transport = Arc::new(MemoryTransport::new());
    let bot = Bot::new(transport.clone());

    let hits = Arc::new(AtomicUsize::new(0));
    bot.register(Counting {
        count: Arc::clone(&hits),
    })
    .unwrap();
    bot.update_policy(|policy| {
        policy.allowed_groups = Some([42].into_iter().collect());
    });

    bot.connect().await.unwrap();

    // Wrong group, then an unknown shape, then the allowed group.
    transport.inject(group_message(7, "nope")).await.unwrap();
    transport
        .inject(json!({"post_type": "meta_event", "meta_event_type": "heartbeat"}))
        .await
        .unwrap();
    transport.inject(group_message(42, "yes")).await.unwrap();

    wait_until(|| hits.load(Ordering::SeqCst) == 1).await;

    // Give the rejected events time to (not) arrive.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    bot.shutdown();
}

#[tokio::test]
async fn command_reply_goes_back_through_the_transport() {
    let transport = Arc::new(MemoryTransport::new());
    transport.respond_with(
        "send_group_msg",
        json!({"status": "ok", "retcode": 0, "data": {"message_id": 5}}),
    );
    let bot = Bot::new(transport.clone());
    bot.register(Replying).unwrap();
    bot.connect().await.unwrap();

    transport.inject(group_message(9, ".ping")).await.unwrap();

    wait_until(|| !transport.calls().is_empty()).await;

    let calls = transport.calls();
    assert_eq!(calls[0].0, "send_group_msg");
    assert_eq!(calls[0].1["group_id"], 9);
    assert_eq!(calls[0].1["message"][0]["data"]["text"], "pong");

    bot.shutdown();
}

#[tokio::test]
async fn unprefixed_text_draws_no_reply() {
    let transport = Arc::new(MemoryTransport::new());
    let bot = Bot::new(transport.clone());

    let hits = Arc::new(AtomicUsize::new(0));
    bot.register(Replying).unwrap();
    bot.register(Counting {
        count: Arc::clone(&hits),
    })
    .unwrap();
    bot.connect().await.unwrap();

    transport.inject(group_message(9, "ping")).await.unwrap();

    wait_until(|| hits.load(Ordering::SeqCst) == 1).await;
    assert!(transport.calls().is_empty());

    bot.shutdown();
}
