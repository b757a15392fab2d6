//! REST boundary
//!
//! The handful of HTTP calls the gateway client needs besides the gateway itself.

mod http;

pub use http::HttpRestClient;

use crate::events::UserPayload;
use crate::protocol::GatewayInfo;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Response of `POST /users/@me/channels`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DmChannel {
    pub id: String,
}

/// Authenticated REST calls
#[async_trait]
pub trait RestApi: Send + Sync {
    /// `GET /users/@me`
    async fn current_user(&self) -> Result<UserPayload, RestError>;

    /// `GET /gateway/bot` for bots, `GET /gateway` otherwise
    async fn gateway_info(&self, bot: bool) -> Result<GatewayInfo, RestError>;

    /// `POST /channels/{channel}/messages`
    async fn create_message(&self, channel_id: &str, content: &str) -> Result<(), RestError>;

    /// `DELETE /channels/{channel}`
    async fn delete_channel(&self, channel_id: &str) -> Result<(), RestError>;

    /// `POST /users/@me/channels`
    async fn create_dm_channel(&self, recipient_id: &str) -> Result<DmChannel, RestError>;

    /// `GET /channels/{channel}/messages`
    async fn channel_messages(&self, channel_id: &str) -> Result<Vec<Value>, RestError>;
}

/// REST errors
#[derive(Debug, Error)]
pub enum RestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}
