//! Fault-isolating fan-out.
//!
//! [`dispatch`] is the core state machine: policy admission, then one
//! supervised task per listener and per plugin. Each invocation is an
//! explicitly spawned task whose result is awaited and reported here, so a
//! handler that returns an error — or panics outright — is logged with its
//! identity and the envelope context, and never disturbs the other handlers
//! or future envelopes. There is no fire-and-forget: every task's outcome
//! is observed.
//!
//! The supervisor holds no state between calls; per-dispatch state is the
//! registry snapshots plus the one envelope, discarded on completion.
//!
//! Handlers for one envelope are *initiated* in registration order (within
//! each registry; listeners and plugins are mutually unordered), but nothing
//! is guaranteed about completion order, and handlers for envelope N+1 may
//! start before envelope N's handlers finish — the event pump spawns one
//! `dispatch` task per accepted event. There is no per-handler timeout: a
//! handler that never resolves leaks its task until process shutdown.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{Instrument, Level, error, span, trace};

use crate::bot::Bot;
use crate::error::HandlerError;
use crate::model::envelope::MessageEnvelope;

/// Identity of one supervised handler invocation, for failure reports.
enum HandlerId {
    Listener(usize),
    Plugin(String),
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listener(index) => write!(f, "listener #{index}"),
            Self::Plugin(name) => write!(f, "plugin '{name}'"),
        }
    }
}

/// Dispatches one envelope to every registered listener and plugin.
///
/// A policy rejection terminates dispatch with no handler invoked; that is
/// a normal outcome, not an error.
pub async fn dispatch(bot: Arc<Bot>, envelope: Arc<MessageEnvelope>) {
    if !bot.policy().accepts(&envelope) {
        trace!(kind = ?envelope.kind(), group = ?envelope.group_id(), "envelope rejected by policy");
        return;
    }

    let span = span!(
        Level::DEBUG,
        "dispatch",
        kind = ?envelope.kind(),
        group = ?envelope.group_id(),
        sender = ?envelope.sender_id(),
    );
    fan_out(bot, envelope).instrument(span).await;
}

async fn fan_out(bot: Arc<Bot>, envelope: Arc<MessageEnvelope>) {
    let listeners = bot.listeners().snapshot();
    let plugins = bot.plugins().snapshot();
    trace!(
        listeners = listeners.len(),
        plugins = plugins.len(),
        "fanning out"
    );

    let mut tasks: Vec<(HandlerId, JoinHandle<Result<(), HandlerError>>)> =
        Vec::with_capacity(listeners.len() + plugins.len());

    for (index, listener) in listeners.into_iter().enumerate() {
        let envelope = Arc::clone(&envelope);
        tasks.push((
            HandlerId::Listener(index),
            tokio::spawn(async move { listener.call(envelope).await }),
        ));
    }

    for plugin in plugins {
        let bot = Arc::clone(&bot);
        let envelope = Arc::clone(&envelope);
        let id = HandlerId::Plugin(plugin.name().to_string());
        tasks.push((
            id,
            tokio::spawn(async move { plugin.run(bot, envelope).await }),
        ));
    }

    for (id, task) in tasks {
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                error!(
                    handler = %id,
                    error = %err,
                    group = ?envelope.group_id(),
                    sender = ?envelope.sender_id(),
                    "handler failed"
                );
            }
            Err(join_err) if join_err.is_panic() => {
                error!(
                    handler = %id,
                    group = ?envelope.group_id(),
                    sender = ?envelope.sender_id(),
                    "handler panicked"
                );
            }
            // Cancelled: the runtime is shutting down, nothing to report.
            Err(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::envelope::RawMessage;
    use crate::plugin::Plugin;
    use crate::transport::memory::MemoryTransport;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn group_envelope() -> Arc<MessageEnvelope> {
        Arc::new(MessageEnvelope::detached(RawMessage {
            message_type: Some("group".into()),
            group_id: Some(1),
            user_id: Some(2),
            ..RawMessage::default()
        }))
    }

    struct Counting {
        name: &'static str,
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Plugin for Counting {
        fn name(&self) -> &str {
            self.name
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

    struct Failing;

    #[async_trait]
    impl Plugin for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn run(
            &self,
            _bot: Arc<Bot>,
            _envelope: Arc<MessageEnvelope>,
        ) -> Result<(), HandlerError> {
            Err("deliberate failure".into())
        }
    }

    struct Panicking;

    #[async_trait]
    impl Plugin for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn run(
            &self,
            _bot: Arc<Bot>,
            _envelope: Arc<MessageEnvelope>,
        ) -> Result<(), HandlerError> {
            panic!("deliberate panic");
        }
    }

    fn test_bot() -> Arc<Bot> {
        Bot::new(Arc::new(MemoryTransport::new()))
    }

    #[tokio::test]
    async fn every_plugin_receives_the_envelope_once() {
        let bot = test_bot();
        let count = Arc::new(AtomicUsize::new(0));
        for name in ["a", "b", "c"] {
            bot.register(Counting {
                name,
                count: Arc::clone(&count),
            })
            .unwrap();
        }

        dispatch(Arc::clone(&bot), group_envelope()).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn a_failing_plugin_does_not_stop_the_others() {
        let bot = test_bot();
        let count = Arc::new(AtomicUsize::new(0));
        bot.register(Counting {
            name: "before",
            count: Arc::clone(&count),
        })
        .unwrap();
        bot.register(Failing).unwrap();
        bot.register(Counting {
            name: "after",
            count: Arc::clone(&count),
        })
        .unwrap();

        dispatch(Arc::clone(&bot), group_envelope()).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn a_panicking_plugin_does_not_stop_the_others() {
        let bot = test_bot();
        let count = Arc::new(AtomicUsize::new(0));
        bot.register(Panicking).unwrap();
        bot.register(Counting {
            name: "survivor",
            count: Arc::clone(&count),
        })
        .unwrap();

        dispatch(Arc::clone(&bot), group_envelope()).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_listeners_are_isolated_too() {
        let bot = test_bot();
        let count = Arc::new(AtomicUsize::new(0));

        bot.on_message(|_envelope| async move { Err::<(), HandlerError>("boom".into()) });
        let seen = Arc::clone(&count);
        bot.on_message(move |_envelope| {
            let seen = Arc::clone(&seen);
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        dispatch(Arc::clone(&bot), group_envelope()).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_envelopes_invoke_no_handler() {
        let bot = test_bot();
        let count = Arc::new(AtomicUsize::new(0));
        bot.register(Counting {
            name: "counting",
            count: Arc::clone(&count),
        })
        .unwrap();
        bot.update_policy(|policy| policy.allowed_groups = None);

        dispatch(Arc::clone(&bot), group_envelope()).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
