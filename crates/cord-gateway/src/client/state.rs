//! State owned by the session actor

use super::commands::{Command, CommandSender};
use super::{ClientInner, GatewayClient};
use crate::connection::Shard;
use crate::events::{ClientEvent, UserPayload};
use crate::mirror::StateMirror;
use crate::protocol::GatewayInfo;
use crate::rest::RestApi;
use crate::scheduler::{FenceGenerator, FenceToken, Timers};
use crate::throttle::OutboundThrottleQueue;
use crate::transport::GatewayConnector;
use cord_common::ClientConfig;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;

/// Everything one connect/disconnect cycle mutates.
///
/// Only the session actor touches this, so nothing in here is locked.
pub(crate) struct SessionState {
    client: Weak<ClientInner>,
    pub(crate) config: Arc<ClientConfig>,
    pub(crate) rest: Arc<dyn RestApi>,
    pub(crate) connector: Arc<dyn GatewayConnector>,
    pub(crate) commands: CommandSender,
    pub(crate) timers: Timers<Command>,
    pub(crate) fences: FenceGenerator,
    pub(crate) shards: BTreeMap<u32, Shard>,
    pub(crate) gateway: Option<GatewayInfo>,
    pub(crate) current_user: Option<UserPayload>,
    pub(crate) throttle: OutboundThrottleQueue,
    pub(crate) mirror: StateMirror,
    pub(crate) drain_fence: Option<FenceToken>,
    pub(crate) cleanup_fence: Option<FenceToken>,
    pub(crate) disconnecting: bool,
    background: Vec<JoinHandle<()>>,
}

impl SessionState {
    pub(crate) fn new(
        client: Weak<ClientInner>,
        config: Arc<ClientConfig>,
        rest: Arc<dyn RestApi>,
        connector: Arc<dyn GatewayConnector>,
        commands: CommandSender,
    ) -> Self {
        Self {
            client,
            config,
            rest,
            connector,
            timers: Timers::new(commands.clone()),
            commands,
            fences: FenceGenerator::new(),
            shards: BTreeMap::new(),
            gateway: None,
            current_user: None,
            throttle: OutboundThrottleQueue::new(),
            mirror: StateMirror::new(),
            drain_fence: None,
            cleanup_fence: None,
            disconnecting: false,
            background: Vec::new(),
        }
    }

    fn client(&self) -> Option<GatewayClient> {
        self.client.upgrade().map(GatewayClient::from_inner)
    }

    /// Publish an event to public subscribers
    pub(crate) fn emit(&self, event: ClientEvent) {
        match self.client() {
            Some(client) => client.publish(&event),
            None => tracing::debug!(event = %event.name(), "Client dropped, event not published"),
        }
    }

    /// Human-readable status line on `client.message`
    pub(crate) fn message(&self, text: impl Into<String>, detail: Option<Value>) {
        let text = text.into();
        tracing::info!(message = %text);
        self.emit(ClientEvent::message(text, detail));
    }

    /// Diagnostic on `client.debug`, published only in debug mode
    pub(crate) fn debug(&self, text: impl Into<String>, detail: Option<Value>) {
        let text = text.into();
        tracing::debug!(message = %text);
        if self.config.debug {
            self.emit(ClientEvent::debug(text, detail));
        }
    }

    /// Route a failure to `client.error`
    pub(crate) fn report_error(&self, origin: &str, message: &str) {
        match self.client() {
            Some(client) => client.report_error(origin, message),
            None => tracing::error!(origin, error = message, "Unhandled client error"),
        }
    }

    /// Keep a task so disconnect can abort it
    pub(crate) fn track(&mut self, handle: JoinHandle<()>) {
        self.background.retain(|task| !task.is_finished());
        self.background.push(handle);
    }

    /// True when at least one shard exists and every shard saw READY
    pub(crate) fn is_ready(&self) -> bool {
        !self.shards.is_empty() && self.shards.values().all(Shard::is_ready)
    }

    /// Detach from the client handle so it can connect again
    pub(crate) fn detach(&self) {
        if let Some(client) = self.client() {
            client.session_ended(&self.commands);
        }
    }

    /// Ask every shard to close and drop all session data
    pub(crate) fn shutdown(&mut self) {
        self.disconnecting = true;
        for shard in self.shards.values() {
            if let Err(e) = shard.close() {
                tracing::debug!(shard = shard.index(), error = %e, "Shard already closed");
            }
        }
        self.drain_fence = None;
        self.cleanup_fence = None;
        self.shards.clear();
        self.gateway = None;
        self.current_user = None;
        self.throttle.clear();
        self.mirror.clear();
        for task in self.background.drain(..) {
            task.abort();
        }
    }
}
