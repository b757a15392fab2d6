//! Messages posted to the session actor

use crate::connection::ShardCommand;
use crate::events::UserPayload;
use crate::protocol::GatewayInfo;
use crate::rest::RestError;
use crate::scheduler::FenceToken;
use crate::throttle::DeferredAction;
use crate::transport::{TransportConnection, TransportError};
use tokio::sync::{mpsc, oneshot};

pub(crate) type CommandSender = mpsc::UnboundedSender<Command>;
pub(crate) type CommandReceiver = mpsc::UnboundedReceiver<Command>;

/// Everything the session actor reacts to
pub(crate) enum Command {
    // REST completions
    CurrentUserFetched(Result<UserPayload, RestError>),
    GatewayInfoFetched(Result<GatewayInfo, RestError>),

    // Shard lifecycle
    ConnectShard {
        shard: u32,
    },
    ShardOpened {
        shard: u32,
        result: Result<TransportConnection, TransportError>,
    },
    Frame {
        shard: u32,
        connection: FenceToken,
        text: String,
    },
    Closed {
        shard: u32,
        connection: FenceToken,
        code: Option<u16>,
        reason: String,
    },

    // Timers
    HeartbeatTick {
        shard: u32,
        fence: FenceToken,
    },
    DrainTick {
        fence: FenceToken,
    },
    CleanupTick {
        fence: FenceToken,
    },

    // Public API
    Send(ShardCommand),
    QueueThrottled(DeferredAction),
    BindDmChannel {
        person_id: String,
        channel_id: String,
    },
    /// Diagnostic from a background task
    Diagnostic(String),
    Query(Query),
    Disconnect,
}

/// Read-only requests answered by the actor
pub(crate) enum Query {
    IsReady(oneshot::Sender<bool>),
    ValidServer {
        guild_id: String,
        reply: oneshot::Sender<bool>,
    },
    ValidChannel {
        guild_id: String,
        channel_id: String,
        reply: oneshot::Sender<bool>,
    },
    CurrentUser(oneshot::Sender<Option<UserPayload>>),
    /// Channel bound to a person; `touch` refreshes its last use
    DmChannel {
        person_id: String,
        touch: bool,
        reply: oneshot::Sender<Option<String>>,
    },
}

impl Command {
    /// Short name for logging
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::CurrentUserFetched(_) => "current_user_fetched",
            Self::GatewayInfoFetched(_) => "gateway_info_fetched",
            Self::ConnectShard { .. } => "connect_shard",
            Self::ShardOpened { .. } => "shard_opened",
            Self::Frame { .. } => "frame",
            Self::Closed { .. } => "closed",
            Self::HeartbeatTick { .. } => "heartbeat_tick",
            Self::DrainTick { .. } => "drain_tick",
            Self::CleanupTick { .. } => "cleanup_tick",
            Self::Send(_) => "send",
            Self::QueueThrottled(_) => "queue_throttled",
            Self::BindDmChannel { .. } => "bind_dm_channel",
            Self::Diagnostic(_) => "diagnostic",
            Self::Query(_) => "query",
            Self::Disconnect => "disconnect",
        }
    }
}
