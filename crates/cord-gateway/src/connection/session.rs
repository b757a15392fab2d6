//! Shard session lifecycle
//!
//! Opens shard connections, pumps their frames into the session actor, and
//! decides what happens when a connection closes.

use super::shard::{Shard, ShardCommand};
use crate::client::commands::{Command, CommandSender};
use crate::client::state::SessionState;
use crate::events::{names, ClientEvent};
use crate::handlers::OpcodeDispatcher;
use crate::protocol::{is_authentication_failure, GatewayInfo, GatewayMessage};
use crate::scheduler::FenceToken;
use crate::transport::{TransportConnection, TransportError, TransportEvent};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Shard lifecycle operations run on the session actor
pub(crate) struct ShardSession;

impl ShardSession {
    /// Open every shard the gateway asked for.
    ///
    /// Each shard gets a slot up front so readiness counts shards that have
    /// not connected yet.
    pub(crate) fn connect_all(state: &mut SessionState, info: GatewayInfo) {
        let count = info.shard_count();
        tracing::info!(url = %info.url, shards = count, "Gateway located");
        state.gateway = Some(info);
        for shard in 0..count {
            state.shards.insert(shard, Shard::pending(shard));
            Self::connect(state, shard);
        }
    }

    /// Start opening a connection for `shard`
    pub(crate) fn connect(state: &mut SessionState, shard: u32) {
        if state.disconnecting {
            return;
        }
        let Some(gateway) = &state.gateway else {
            tracing::warn!(shard, "Connect requested before gateway info arrived");
            return;
        };
        let url = gateway.connect_url(state.config.gateway_version);
        state.debug(format!("Connecting shard: {shard}"), None);

        let connector = Arc::clone(&state.connector);
        let commands = state.commands.clone();
        let task = tokio::spawn(async move {
            let result = connector.connect(&url).await;
            let _ = commands.send(Command::ShardOpened { shard, result });
        });
        state.track(task);
    }

    /// The connector finished for `shard`
    pub(crate) fn opened(
        state: &mut SessionState,
        shard: u32,
        result: Result<TransportConnection, TransportError>,
    ) {
        match result {
            Ok(connection) => {
                let TransportConnection { sender, events } = connection;
                let fence = state.fences.issue();
                if let Some(previous) = state.shards.insert(shard, Shard::new(shard, fence, sender)) {
                    let _ = previous.close();
                }
                let pump = tokio::spawn(Self::pump(shard, fence, events, state.commands.clone()));
                state.track(pump);

                tracing::info!(shard, "Shard connected");
                state.debug(format!("Connected shard: {shard}"), None);
                state.emit(ClientEvent::ShardConnected { shard });
            }
            Err(e) => {
                tracing::warn!(shard, error = %e, "Shard connection failed");
                state.emit(ClientEvent::ShardConnectError {
                    shard,
                    error: e.to_string(),
                });
                state.debug(format!("Could not connect shard {shard}: {e}"), None);
                state
                    .timers
                    .once(state.config.timings.connect_retry_delay, Command::ConnectShard { shard });
            }
        }
    }

    /// Forward transport events for one connection into the actor
    async fn pump(
        shard: u32,
        connection: FenceToken,
        mut events: mpsc::Receiver<TransportEvent>,
        commands: CommandSender,
    ) {
        while let Some(event) = events.recv().await {
            let command = match event {
                TransportEvent::Text(text) => Command::Frame {
                    shard,
                    connection,
                    text,
                },
                TransportEvent::Closed { code, reason } => {
                    let _ = commands.send(Command::Closed {
                        shard,
                        connection,
                        code,
                        reason,
                    });
                    return;
                }
            };
            if commands.send(command).is_err() {
                return;
            }
        }

        let _ = commands.send(Command::Closed {
            shard,
            connection,
            code: None,
            reason: "transport dropped".to_string(),
        });
    }

    /// A text frame arrived on `shard`
    pub(crate) fn frame(state: &mut SessionState, shard: u32, connection: FenceToken, text: String) {
        let Some(entry) = state.shards.get_mut(&shard) else {
            return;
        };
        if !entry.is_current_connection(connection) {
            tracing::trace!(shard, "Dropping frame from a replaced connection");
            return;
        }
        entry.on_frame();

        let message = match GatewayMessage::from_json(&text) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!(shard, error = %e, "Undecodable gateway frame");
                state.debug(
                    format!("Undecodable frame on shard {shard}: {e}"),
                    Some(Value::String(text)),
                );
                return;
            }
        };

        if let Err(e) = OpcodeDispatcher::dispatch(state, shard, &message) {
            tracing::warn!(shard, op = message.op, error = %e, "Handler failed");
            state.report_error(&names::opcode(message.op), &e.to_string());
        }

        state.emit(ClientEvent::Opcode {
            shard,
            op: message.op,
            message,
        });
    }

    /// The transport for `shard` reported a close
    pub(crate) fn closed(
        state: &mut SessionState,
        shard: u32,
        connection: FenceToken,
        code: Option<u16>,
        reason: String,
    ) {
        let Some(entry) = state.shards.get_mut(&shard) else {
            return;
        };
        if !entry.is_current_connection(connection) {
            return;
        }
        entry.mark_disconnected();

        let shown = code.map_or_else(|| "none".to_string(), |c| c.to_string());
        tracing::info!(shard, code = %shown, reason = %reason, "Shard closed");
        state.debug(format!("Shard {shard} closed ({shown} - {reason})"), None);
        state.emit(ClientEvent::ShardClosed {
            shard,
            code,
            reason,
        });

        if state.disconnecting {
            return;
        }
        if is_authentication_failure(code) {
            tracing::error!(shard, code = %shown, "Gateway rejected credentials");
            state.message(
                "Error Connecting - authentication error - not attempting to reconnect.",
                None,
            );
            return;
        }

        state.debug(format!("Reconnecting shard: {shard}"), None);
        state
            .timers
            .once(state.config.timings.reconnect_delay, Command::ConnectShard { shard });
    }

    /// Frame and send a command on its shard, bypassing the throttle queue
    pub(crate) fn send_command(state: &mut SessionState, command: ShardCommand) {
        let ShardCommand {
            shard,
            op,
            payload,
            sequence,
            event,
        } = command;
        let text = match GatewayMessage::command(op, payload, sequence, event).to_json() {
            Ok(text) => text,
            Err(e) => {
                state.report_error("send", &e.to_string());
                return;
            }
        };

        let result = match state.shards.get(&shard) {
            Some(entry) => entry.send(text),
            None => Err(TransportError::Closed),
        };
        if let Err(e) = result {
            tracing::warn!(shard, op = %op, error = %e, "Failed to send command");
            state.debug(format!("Failed to send {op} to shard {shard}: {e}"), None);
        }
    }
}
