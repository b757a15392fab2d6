//! Session actor
//!
//! One task per connect owns all session state and applies commands strictly
//! in arrival order. Transport pumps, timers, and REST calls only ever post
//! commands here.

use super::commands::{Command, CommandReceiver, Query};
use super::state::SessionState;
use crate::broadcast::panic_message;
use crate::connection::{HeartbeatScheduler, ShardSession};
use crate::rest::RestError;
use crate::throttle::ThrottleEntry;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tokio::time::Instant;

pub(crate) struct SessionActor {
    state: SessionState,
    commands: CommandReceiver,
}

impl SessionActor {
    pub(crate) fn new(state: SessionState, commands: CommandReceiver) -> Self {
        Self { state, commands }
    }

    pub(crate) async fn run(mut self) {
        self.start();

        while let Some(command) = self.commands.recv().await {
            if matches!(command, Command::Disconnect) {
                break;
            }
            let kind = command.kind();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.handle(command)));
            if let Err(payload) = outcome {
                let message = panic_message(payload.as_ref());
                tracing::error!(command = kind, error = %message, "Session handler panicked");
                self.state.report_error(kind, &message);
            }
        }

        self.state.shutdown();
        self.state.detach();
        tracing::info!("Session stopped");
    }

    /// Kick off the REST lookups and the periodic loops
    fn start(&mut self) {
        let state = &mut self.state;
        tracing::info!(bot = state.config.is_bot, "Session starting");

        let rest = Arc::clone(&state.rest);
        let commands = state.commands.clone();
        let is_bot = state.config.is_bot;
        tokio::spawn(async move {
            let user = rest.current_user().await;
            let _ = commands.send(Command::CurrentUserFetched(user));
            let gateway = rest.gateway_info(is_bot).await;
            let _ = commands.send(Command::GatewayInfoFetched(gateway));
        });

        let fence = state.fences.issue();
        state.drain_fence = Some(fence);
        let drain = state
            .timers
            .every(state.config.timings.throttle_period, move || Command::DrainTick { fence });
        state.track(drain);

        let fence = state.fences.issue();
        state.cleanup_fence = Some(fence);
        let cleanup = state
            .timers
            .every(state.config.timings.cleanup_period, move || Command::CleanupTick { fence });
        state.track(cleanup);
    }

    fn handle(&mut self, command: Command) {
        let state = &mut self.state;
        match command {
            Command::CurrentUserFetched(Ok(user)) => {
                tracing::info!(user_id = %user.id, username = %user.username, "Fetched current user");
                state.debug(format!("Logged in as {} ({})", user.tag(), user.id), None);
                state.current_user = Some(user);
            }
            Command::CurrentUserFetched(Err(e)) => {
                tracing::warn!(error = %e, "Failed to fetch current user");
                state.debug(format!("Failed to fetch current user: {e}"), None);
            }
            Command::GatewayInfoFetched(Ok(info)) => ShardSession::connect_all(state, info),
            Command::GatewayInfoFetched(Err(RestError::Decode(e))) => {
                tracing::error!(error = %e, "Unexpected gateway response");
                state.message("Unknown response from API", None);
            }
            Command::GatewayInfoFetched(Err(e)) => {
                tracing::error!(error = %e, "Failed to fetch gateway info");
                state.message(format!("Failed to fetch gateway info: {e}"), None);
            }
            Command::ConnectShard { shard } => ShardSession::connect(state, shard),
            Command::ShardOpened { shard, result } => ShardSession::opened(state, shard, result),
            Command::Frame {
                shard,
                connection,
                text,
            } => ShardSession::frame(state, shard, connection, text),
            Command::Closed {
                shard,
                connection,
                code,
                reason,
            } => ShardSession::closed(state, shard, connection, code, reason),
            Command::HeartbeatTick { shard, fence } => HeartbeatScheduler::fire(state, shard, fence),
            Command::DrainTick { fence } => {
                if crate::scheduler::is_current(state.drain_fence, fence) {
                    Self::drain_one(state);
                }
            }
            Command::CleanupTick { fence } => {
                if crate::scheduler::is_current(state.cleanup_fence, fence) {
                    Self::cleanup(state);
                }
            }
            Command::Send(command) => ShardSession::send_command(state, command),
            Command::QueueThrottled(action) => state.throttle.push_deferred(action),
            Command::BindDmChannel {
                person_id,
                channel_id,
            } => state
                .mirror
                .bind_dm_channel(&person_id, &channel_id, Instant::now()),
            Command::Diagnostic(text) => state.debug(text, None),
            Command::Query(query) => Self::answer(state, query),
            Command::Disconnect => {}
        }
    }

    /// Release one throttled entry
    fn drain_one(state: &mut SessionState) {
        match state.throttle.pop() {
            Some(ThrottleEntry::Command(command)) => {
                tracing::trace!(shard = command.shard, op = %command.op, "Releasing throttled command");
                ShardSession::send_command(state, command);
            }
            Some(ThrottleEntry::Deferred(action)) => {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(action)) {
                    state.report_error("throttle", &panic_message(payload.as_ref()));
                }
            }
            None => {}
        }
    }

    /// Delete DM channels idle for longer than the TTL
    fn cleanup(state: &mut SessionState) {
        let ttl = state.config.timings.dm_channel_ttl;
        for binding in state.mirror.take_expired_dm_channels(Instant::now(), ttl) {
            tracing::debug!(person_id = %binding.person_id, channel_id = %binding.channel_id, "Closing idle DM channel");
            state.debug(
                format!(
                    "Closing idle channel {} for person {}",
                    binding.channel_id, binding.person_id
                ),
                None,
            );

            let rest = Arc::clone(&state.rest);
            let commands = state.commands.clone();
            tokio::spawn(async move {
                if let Err(e) = rest.delete_channel(&binding.channel_id).await {
                    tracing::warn!(channel_id = %binding.channel_id, error = %e, "Failed to delete DM channel");
                    let _ = commands.send(Command::Diagnostic(format!(
                        "Failed to delete channel {}: {e}",
                        binding.channel_id
                    )));
                }
            });
        }
    }

    fn answer(state: &mut SessionState, query: Query) {
        match query {
            Query::IsReady(reply) => {
                let _ = reply.send(state.is_ready());
            }
            Query::ValidServer { guild_id, reply } => {
                let _ = reply.send(state.mirror.valid_server(&guild_id));
            }
            Query::ValidChannel {
                guild_id,
                channel_id,
                reply,
            } => {
                let _ = reply.send(state.mirror.valid_channel(&guild_id, &channel_id));
            }
            Query::CurrentUser(reply) => {
                let _ = reply.send(state.current_user.clone());
            }
            Query::DmChannel {
                person_id,
                touch,
                reply,
            } => {
                let channel = if touch {
                    state.mirror.touch_dm_channel(&person_id, Instant::now())
                } else {
                    state.mirror.dm_channel(&person_id).map(str::to_string)
                };
                let _ = reply.send(channel);
            }
        }
    }
}
