//! Gateway client
//!
//! [`GatewayClient`] is a cheap handle. Connecting spawns a session actor that
//! owns every shard, the state mirror, and the throttle queue; the handle talks
//! to it over a command channel.

mod actor;
pub(crate) mod commands;
pub(crate) mod state;

use self::actor::SessionActor;
use self::commands::{Command, CommandSender, Query};
use self::state::SessionState;
use crate::broadcast::{EventEmitter, ListenerError, ListenerId};
use crate::connection::ShardCommand;
use crate::error::{ClientError, ClientResult};
use crate::events::{names, ClientEvent, UserPayload};
use crate::rest::{HttpRestClient, RestApi};
use crate::transport::{GatewayConnector, WsConnector};
use chrono::{DateTime, Utc};
use cord_common::ClientConfig;
use parking_lot::Mutex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::{self, Handle};
use tokio::sync::oneshot;

struct SessionHandle {
    commands: CommandSender,
    connected_at: DateTime<Utc>,
}

pub(crate) struct ClientInner {
    config: Arc<ClientConfig>,
    rest: Arc<dyn RestApi>,
    connector: Arc<dyn GatewayConnector>,
    emitter: EventEmitter<GatewayClient>,
    runtime: Mutex<Option<Handle>>,
    session: Mutex<Option<SessionHandle>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            let _ = session.commands.send(Command::Disconnect);
        }
    }
}

/// Handle to a sharded gateway client
#[derive(Clone)]
pub struct GatewayClient {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayClient")
            .field("bot", &self.inner.config.is_bot)
            .field("connected", &self.is_connected())
            .field("emitter", &self.inner.emitter)
            .finish()
    }
}

impl GatewayClient {
    /// Create a client with explicit REST and transport implementations
    pub fn new(
        config: ClientConfig,
        rest: Arc<dyn RestApi>,
        connector: Arc<dyn GatewayConnector>,
    ) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config: Arc::new(config),
                rest,
                connector,
                emitter: EventEmitter::new(),
                runtime: Mutex::new(None),
                session: Mutex::new(None),
            }),
        }
    }

    /// Create a client backed by HTTPS and WebSocket transports
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        let rest = HttpRestClient::new(&config)?;
        Ok(Self::new(config, Arc::new(rest), Arc::new(WsConnector::new())))
    }

    pub(crate) fn from_inner(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Run the session on an externally owned runtime.
    ///
    /// Must be called before [`connect`](Self::connect).
    pub fn set_runtime(&self, handle: Handle) -> ClientResult<()> {
        if self.is_connected() {
            return Err(ClientError::AlreadyConnected);
        }
        *self.inner.runtime.lock() = Some(handle);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.inner.session.lock().is_some()
    }

    /// When the current session was started
    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        self.inner.session.lock().as_ref().map(|s| s.connected_at)
    }

    /// Start the session.
    ///
    /// On a supplied or ambient runtime this returns once the session task is
    /// spawned. Otherwise it behaves like [`run`](Self::run) and blocks until
    /// the session ends.
    pub fn connect(&self) -> ClientResult<()> {
        let handle = self.inner.runtime.lock().clone();
        match handle.or_else(|| Handle::try_current().ok()) {
            Some(handle) => self.start(&handle),
            None => self.run(),
        }
    }

    /// Start the session on a private runtime and block until it ends
    pub fn run(&self) -> ClientResult<()> {
        if Handle::try_current().is_ok() {
            return Err(ClientError::Runtime(
                "run() blocks and cannot be called from inside a runtime; use connect()".to_string(),
            ));
        }
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ClientError::Runtime(e.to_string()))?;

        runtime.block_on(async {
            self.start(&Handle::current())?;
            self.disconnected().await;
            Ok(())
        })
    }

    fn start(&self, handle: &Handle) -> ClientResult<()> {
        let mut session = self.inner.session.lock();
        if session.is_some() {
            return Err(ClientError::AlreadyConnected);
        }

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let state = SessionState::new(
            Arc::downgrade(&self.inner),
            Arc::clone(&self.inner.config),
            Arc::clone(&self.inner.rest),
            Arc::clone(&self.inner.connector),
            tx.clone(),
        );
        handle.spawn(SessionActor::new(state, rx).run());

        *session = Some(SessionHandle {
            commands: tx,
            connected_at: Utc::now(),
        });
        tracing::info!(bot = self.inner.config.is_bot, "Gateway client connecting");
        Ok(())
    }

    /// Close every shard and stop the session.
    ///
    /// Suppresses reconnects. Does nothing when not connected.
    pub fn disconnect(&self) {
        match self.post(Command::Disconnect) {
            Ok(()) => tracing::info!("Gateway client disconnecting"),
            Err(_) => tracing::debug!("Disconnect requested while not connected"),
        }
    }

    /// Forget the session once its actor has stopped
    pub(crate) fn session_ended(&self, commands: &CommandSender) {
        let mut session = self.inner.session.lock();
        if session
            .as_ref()
            .is_some_and(|s| s.commands.same_channel(commands))
        {
            *session = None;
        }
    }

    /// Resolves once the current session has stopped
    pub async fn disconnected(&self) {
        let commands = self.inner.session.lock().as_ref().map(|s| s.commands.clone());
        if let Some(commands) = commands {
            commands.closed().await;
        }
    }

    fn post(&self, command: Command) -> ClientResult<()> {
        let session = self.inner.session.lock();
        let session = session.as_ref().ok_or(ClientError::NotConnected)?;
        session
            .commands
            .send(command)
            .map_err(|_| ClientError::NotConnected)
    }

    async fn query<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Query) -> Option<T> {
        let (reply, response) = oneshot::channel();
        self.post(Command::Query(build(reply))).ok()?;
        response.await.ok()
    }

    /// Whether every shard has received READY. False with no shards.
    pub async fn is_ready(&self) -> bool {
        self.query(Query::IsReady).await.unwrap_or(false)
    }

    /// Whether `guild_id` is a known guild
    pub async fn valid_server(&self, guild_id: &str) -> bool {
        let guild_id = guild_id.to_string();
        self.query(|reply| Query::ValidServer { guild_id, reply })
            .await
            .unwrap_or(false)
    }

    /// Whether `channel_id` is a known text channel of `guild_id`
    pub async fn valid_channel(&self, guild_id: &str, channel_id: &str) -> bool {
        let (guild_id, channel_id) = (guild_id.to_string(), channel_id.to_string());
        self.query(|reply| Query::ValidChannel {
            guild_id,
            channel_id,
            reply,
        })
        .await
        .unwrap_or(false)
    }

    /// The logged-in user, once fetched
    pub async fn current_user(&self) -> Option<UserPayload> {
        self.query(Query::CurrentUser).await.flatten()
    }

    /// DM channel currently bound to `person_id`
    pub async fn dm_channel(&self, person_id: &str) -> Option<String> {
        let person_id = person_id.to_string();
        self.query(|reply| Query::DmChannel {
            person_id,
            touch: false,
            reply,
        })
        .await
        .flatten()
    }

    /// Post `text` to a guild text channel.
    ///
    /// A channel the mirror does not know is skipped without a REST call.
    pub async fn send_channel_message(
        &self,
        guild_id: &str,
        channel_id: &str,
        text: &str,
    ) -> ClientResult<()> {
        if !self.valid_channel(guild_id, channel_id).await {
            tracing::debug!(guild_id, channel_id, "Skipping message to unknown channel");
            return Ok(());
        }
        self.inner.rest.create_message(channel_id, text).await?;
        Ok(())
    }

    /// Send `text` to a person over a direct message channel
    pub async fn send_person_message(&self, person_id: &str, text: &str) -> ClientResult<()> {
        if self.inner.config.reuse_dm_channels {
            let person = person_id.to_string();
            let bound = self
                .query(|reply| Query::DmChannel {
                    person_id: person,
                    touch: true,
                    reply,
                })
                .await
                .flatten();
            if let Some(channel_id) = bound {
                self.inner.rest.create_message(&channel_id, text).await?;
                return Ok(());
            }
        }

        let channel = self.inner.rest.create_dm_channel(person_id).await?;
        if let Err(e) = self.post(Command::BindDmChannel {
            person_id: person_id.to_string(),
            channel_id: channel.id.clone(),
        }) {
            tracing::debug!(person_id, error = %e, "DM channel not tracked");
        }
        self.inner.rest.create_message(&channel.id, text).await?;
        Ok(())
    }

    /// Messages of a guild text channel, or `None` for an unknown channel
    pub async fn channel_messages(
        &self,
        guild_id: &str,
        channel_id: &str,
    ) -> ClientResult<Option<Vec<Value>>> {
        if !self.valid_channel(guild_id, channel_id).await {
            return Ok(None);
        }
        Ok(Some(self.inner.rest.channel_messages(channel_id).await?))
    }

    /// Send a command on its shard immediately
    pub fn send_shard_command(&self, command: ShardCommand) -> ClientResult<()> {
        self.post(Command::Send(command))
    }

    /// Run `action` on the session when the throttle queue reaches it
    pub fn queue_throttled<F>(&self, action: F) -> ClientResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.post(Command::QueueThrottled(Box::new(action)))
    }

    /// Subscribe to events named `event`
    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&GatewayClient, &ClientEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        self.inner.emitter.on(event, handler)
    }

    pub fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        self.inner.emitter.remove_listener(event, id)
    }

    pub fn remove_all_listeners(&self, event: &str) -> usize {
        self.inner.emitter.remove_all_listeners(event)
    }

    /// Deliver `event` to subscribers, routing failures to `client.error`
    pub(crate) fn publish(&self, event: &ClientEvent) {
        let failures = self.inner.emitter.emit(self, event);
        if failures.is_empty() {
            return;
        }
        let origin = event.name();
        for failure in failures {
            if matches!(event, ClientEvent::Error { .. }) {
                tracing::error!(origin = %origin, error = %failure.message, "Error listener failed");
            } else {
                self.report_error(&origin, &failure.message);
            }
        }
    }

    pub(crate) fn report_error(&self, origin: &str, message: &str) {
        if !self.inner.emitter.has_listeners(names::ERROR) {
            tracing::error!(origin, error = message, "Unhandled client error");
            return;
        }
        self.publish(&ClientEvent::Error {
            origin: origin.to_string(),
            message: message.to_string(),
        });
    }
}
