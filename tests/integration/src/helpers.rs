//! Test helpers for integration tests
//!
//! In-memory stand-ins for the gateway socket and the REST API, plus a
//! harness that wires them into a [`GatewayClient`] and records the events it
//! publishes.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use cord_common::ClientConfig;
use cord_gateway::events::UserPayload;
use cord_gateway::protocol::GatewayInfo;
use cord_gateway::rest::{DmChannel, RestApi, RestError};
use cord_gateway::transport::{
    GatewayConnector, OutboundFrame, TransportConnection, TransportError, TransportEvent,
};
use cord_gateway::{ClientEvent, GatewayClient};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

/// Upper bound on any single wait, in virtual time
pub const WAIT_LIMIT: Duration = Duration::from_secs(900);

/// Await `future`, failing after [`WAIT_LIMIT`]
pub async fn within<T>(what: &str, future: impl std::future::Future<Output = T>) -> Result<T> {
    time::timeout(WAIT_LIMIT, future)
        .await
        .map_err(|_| anyhow!("timed out waiting for {what}"))
}

// ============================================================================
// Transport
// ============================================================================

/// Server side of one shard connection
pub struct MockSocket {
    pub url: String,
    pub opened_at: Instant,
    outbound: mpsc::Receiver<OutboundFrame>,
    events: mpsc::Sender<TransportEvent>,
}

impl MockSocket {
    /// Deliver a JSON frame to the client
    pub async fn send(&self, frame: Value) -> Result<()> {
        self.events
            .send(TransportEvent::Text(frame.to_string()))
            .await
            .map_err(|_| anyhow!("client side of socket is gone"))
    }

    /// Deliver a raw text frame to the client
    pub async fn send_text(&self, text: &str) -> Result<()> {
        self.events
            .send(TransportEvent::Text(text.to_string()))
            .await
            .map_err(|_| anyhow!("client side of socket is gone"))
    }

    /// Report the connection closed with `code`
    pub async fn close(&self, code: u16, reason: &str) -> Result<()> {
        self.events
            .send(TransportEvent::Closed {
                code: Some(code),
                reason: reason.to_string(),
            })
            .await
            .map_err(|_| anyhow!("client side of socket is gone"))
    }

    /// Next frame the client wrote
    pub async fn next_frame(&mut self) -> Result<OutboundFrame> {
        within("an outbound frame", self.outbound.recv())
            .await?
            .ok_or_else(|| anyhow!("client dropped the socket"))
    }

    /// Next frame with op `op`, skipping everything else
    pub async fn next_op(&mut self, op: u64) -> Result<Value> {
        loop {
            match self.next_frame().await? {
                OutboundFrame::Text(text) => {
                    let frame: Value = serde_json::from_str(&text)?;
                    if frame["op"].as_u64() == Some(op) {
                        return Ok(frame);
                    }
                }
                OutboundFrame::Close { code, .. } => {
                    bail!("socket closed with {code} while waiting for op {op}")
                }
            }
        }
    }

    /// A frame already written, without waiting
    pub fn try_frame(&mut self) -> Option<OutboundFrame> {
        self.outbound.try_recv().ok()
    }
}

/// Connector handing out [`MockSocket`]s
#[derive(Default)]
pub struct MockConnector {
    sockets: Mutex<Option<mpsc::UnboundedSender<MockSocket>>>,
    failures: AtomicUsize,
    attempts: AtomicUsize,
}

impl MockConnector {
    /// Fail the next `count` connection attempts
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Connection attempts so far, failed ones included
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<MockSocket> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.sockets.lock() = Some(tx);
        rx
    }
}

#[async_trait]
impl GatewayConnector for MockConnector {
    async fn connect(&self, url: &str) -> Result<TransportConnection, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransportError::Connect {
                url: url.to_string(),
                reason: "refused".to_string(),
            });
        }

        let (connection, peer) = TransportConnection::pair(256);
        let socket = MockSocket {
            url: url.to_string(),
            opened_at: Instant::now(),
            outbound: peer.outbound,
            events: peer.events,
        };
        if let Some(sockets) = self.sockets.lock().as_ref() {
            let _ = sockets.send(socket);
        }
        Ok(connection)
    }
}

// ============================================================================
// REST
// ============================================================================

/// REST call recorded by [`MockRest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestCall {
    CreateMessage { channel_id: String, content: String },
    DeleteChannel(String),
    CreateDmChannel(String),
    ChannelMessages(String),
}

/// REST API answering from canned data
pub struct MockRest {
    user: UserPayload,
    /// `None` answers the gateway lookup with an undecodable body
    gateway: Option<GatewayInfo>,
    calls: Mutex<Vec<RestCall>>,
    messages: Mutex<VecDeque<Vec<Value>>>,
    next_dm: AtomicU64,
}

impl MockRest {
    pub fn new(user: UserPayload, gateway: Option<GatewayInfo>) -> Self {
        Self {
            user,
            gateway,
            calls: Mutex::new(Vec::new()),
            messages: Mutex::new(VecDeque::new()),
            next_dm: AtomicU64::new(1),
        }
    }

    pub fn calls(&self) -> Vec<RestCall> {
        self.calls.lock().clone()
    }

    /// Queue a page of messages for the next history request
    pub fn push_messages(&self, page: Vec<Value>) {
        self.messages.lock().push_back(page);
    }

    fn record(&self, call: RestCall) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl RestApi for MockRest {
    async fn current_user(&self) -> Result<UserPayload, RestError> {
        Ok(self.user.clone())
    }

    async fn gateway_info(&self, _bot: bool) -> Result<GatewayInfo, RestError> {
        match &self.gateway {
            Some(info) => Ok(info.clone()),
            None => Err(RestError::Decode(
                serde_json::from_str::<GatewayInfo>(r#"{"message":"nope"}"#)
                    .expect_err("body has no url"),
            )),
        }
    }

    async fn create_message(&self, channel_id: &str, content: &str) -> Result<(), RestError> {
        self.record(RestCall::CreateMessage {
            channel_id: channel_id.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), RestError> {
        self.record(RestCall::DeleteChannel(channel_id.to_string()));
        Ok(())
    }

    async fn create_dm_channel(&self, recipient_id: &str) -> Result<DmChannel, RestError> {
        self.record(RestCall::CreateDmChannel(recipient_id.to_string()));
        let n = self.next_dm.fetch_add(1, Ordering::SeqCst);
        Ok(DmChannel {
            id: format!("dm-{n}"),
        })
    }

    async fn channel_messages(&self, channel_id: &str) -> Result<Vec<Value>, RestError> {
        self.record(RestCall::ChannelMessages(channel_id.to_string()));
        Ok(self.messages.lock().pop_front().unwrap_or_default())
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A client wired to mock transports, recording what it publishes
pub struct TestClient {
    pub client: GatewayClient,
    pub rest: Arc<MockRest>,
    pub connector: Arc<MockConnector>,
    sockets: mpsc::UnboundedReceiver<MockSocket>,
    events_tx: mpsc::UnboundedSender<ClientEvent>,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    seen: Vec<ClientEvent>,
}

/// Event names every [`TestClient`] records
const RECORDED: &[&str] = &[
    cord_gateway::names::SHARD_CONNECTED,
    cord_gateway::names::SHARD_CONNECT_ERROR,
    cord_gateway::names::SHARD_CLOSED,
    cord_gateway::names::MESSAGE,
    cord_gateway::names::DEBUG,
    cord_gateway::names::ERROR,
];

impl TestClient {
    pub fn new(config: ClientConfig, rest: MockRest) -> Self {
        let rest = Arc::new(rest);
        let connector = Arc::new(MockConnector::default());
        let sockets = connector.subscribe();
        let client = GatewayClient::new(
            config,
            Arc::clone(&rest) as Arc<dyn RestApi>,
            Arc::clone(&connector) as Arc<dyn GatewayConnector>,
        );

        let (events_tx, events) = mpsc::unbounded_channel();
        let mut harness = Self {
            client,
            rest,
            connector,
            sockets,
            events_tx,
            events,
            seen: Vec::new(),
        };
        for name in RECORDED {
            harness.record(name);
        }
        harness
    }

    /// Also record events published under `name`
    pub fn record(&mut self, name: &str) {
        let tx = self.events_tx.clone();
        self.client.on(name, move |_, event| {
            let _ = tx.send(event.clone());
            Ok(())
        });
    }

    /// Next shard socket the client opened
    pub async fn next_socket(&mut self) -> Result<MockSocket> {
        within("a shard connection", self.sockets.recv())
            .await?
            .ok_or_else(|| anyhow!("connector dropped"))
    }

    /// A socket already opened, without waiting
    pub fn try_socket(&mut self) -> Option<MockSocket> {
        self.sockets.try_recv().ok()
    }

    /// Wait for a recorded event matching `predicate` and consume it
    pub async fn wait_for<F>(&mut self, what: &str, predicate: F) -> Result<ClientEvent>
    where
        F: Fn(&ClientEvent) -> bool,
    {
        if let Some(index) = self.seen.iter().position(|e| predicate(e)) {
            return Ok(self.seen.remove(index));
        }
        loop {
            let event = within(what, self.events.recv())
                .await?
                .ok_or_else(|| anyhow!("event stream ended"))?;
            if predicate(&event) {
                return Ok(event);
            }
            self.seen.push(event);
        }
    }

    /// Wait for a `client.message` containing `fragment`
    pub async fn wait_for_message(&mut self, fragment: &str) -> Result<ClientEvent> {
        self.wait_for(fragment, |event| {
            matches!(event, ClientEvent::Message { text, .. } if text.contains(fragment))
        })
        .await
    }

    /// Wait for a `client.message` or `client.debug` containing `fragment`
    pub async fn wait_for_message_or_debug(&mut self, fragment: &str) -> Result<ClientEvent> {
        self.wait_for(fragment, |event| match event {
            ClientEvent::Message { text, .. } | ClientEvent::Debug { text, .. } => {
                text.contains(fragment)
            }
            _ => false,
        })
        .await
    }

    /// Wait until an identify has been put on the throttle queue
    pub async fn wait_for_identify_queued(&mut self) -> Result<ClientEvent> {
        self.wait_for_message("Scheduling identify").await
    }

    /// Recorded events not consumed by a wait
    pub fn drain_events(&mut self) -> Vec<ClientEvent> {
        while let Ok(event) = self.events.try_recv() {
            self.seen.push(event);
        }
        self.seen.clone()
    }
}
