//! The transport seam.
//!
//! The wire protocol — sockets, reconnects, framing, call encoding — lives
//! outside this crate. The core only needs two things from a transport: a
//! stream of raw inbound payloads and a way to issue outbound calls. Both
//! are captured by the [`Transport`] trait; the core receives a handle as a
//! constructor argument rather than reaching for a process-wide singleton.
//!
//! [`memory::MemoryTransport`] is a channel-backed implementation for tests
//! and demos.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::TransportResult;

/// Buffer size for the inbound event channel.
pub const EVENT_BUFFER: usize = 64;

/// A handle to the remote messaging session.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establishes the session and returns the inbound event stream.
    ///
    /// Each received value is one raw protocol payload. The stream ends when
    /// the session closes; callers decide whether to reconnect.
    async fn connect(&self) -> TransportResult<mpsc::Receiver<Value>>;

    /// Issues one outbound API call and returns the raw response payload.
    async fn call(&self, action: &str, params: Value) -> TransportResult<Value>;
}

/// A shared transport handle.
pub type BoxedTransport = Arc<dyn Transport>;

pub mod memory {
    //! In-memory transport backed by channels.
    //!
    //! Events are injected through [`MemoryTransport::inject`]; outbound
    //! calls are recorded and answered from a canned response table. Useful
    //! for unit tests and self-contained demos — there is no socket here.

    use std::collections::HashMap;

    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use tokio::sync::mpsc;

    use super::{EVENT_BUFFER, Transport, TransportResult};
    use crate::error::TransportError;
    use async_trait::async_trait;

    /// A channel-backed [`Transport`].
    pub struct MemoryTransport {
        events_tx: mpsc::Sender<Value>,
        events_rx: Mutex<Option<mpsc::Receiver<Value>>>,
        responses: Mutex<HashMap<String, Value>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl MemoryTransport {
        /// Creates a fresh, unconnected transport.
        pub fn new() -> Self {
            let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
            Self {
                events_tx,
                events_rx: Mutex::new(Some(events_rx)),
                responses: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        /// Injects one raw inbound payload, as if it arrived off the wire.
        pub async fn inject(&self, event: Value) -> TransportResult<()> {
            self.events_tx
                .send(event)
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        }

        /// Sets the canned response payload for `action`.
        ///
        /// Unconfigured actions answer with an empty `retcode: 0` response.
        pub fn respond_with(&self, action: &str, response: Value) {
            self.responses.lock().insert(action.to_string(), response);
        }

        /// Snapshot of every outbound call made so far, in order.
        pub fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().clone()
        }
    }

    impl Default for MemoryTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Transport for MemoryTransport {
        async fn connect(&self) -> TransportResult<mpsc::Receiver<Value>> {
            self.events_rx
                .lock()
                .take()
                .ok_or_else(|| TransportError::ConnectionFailed {
                    reason: "already connected".into(),
                })
        }

        async fn call(&self, action: &str, params: Value) -> TransportResult<Value> {
            self.calls.lock().push((action.to_string(), params));
            let response = self
                .responses
                .lock()
                .get(action)
                .cloned()
                .unwrap_or_else(|| json!({"status": "ok", "retcode": 0, "data": null}));
            Ok(response)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn connect_hands_out_the_stream_once() {
            let transport = MemoryTransport::new();
            assert!(transport.connect().await.is_ok());
            assert!(matches!(
                transport.connect().await,
                Err(TransportError::ConnectionFailed { .. })
            ));
        }

        #[tokio::test]
        async fn injected_events_come_out_in_order() {
            let transport = MemoryTransport::new();
            let mut events = transport.connect().await.unwrap();
            transport.inject(json!({"n": 1})).await.unwrap();
            transport.inject(json!({"n": 2})).await.unwrap();
            assert_eq!(events.recv().await.unwrap(), json!({"n": 1}));
            assert_eq!(events.recv().await.unwrap(), json!({"n": 2}));
        }

        #[tokio::test]
        async fn calls_are_recorded_and_answered() {
            let transport = MemoryTransport::new();
            transport.respond_with("get_login_info", json!({"retcode": 0, "data": {"user_id": 1}}));

            let response = transport
                .call("get_login_info", json!({}))
                .await
                .unwrap();
            assert_eq!(response["data"]["user_id"], 1);

            let calls = transport.calls();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].0, "get_login_info");
        }
    }
}
