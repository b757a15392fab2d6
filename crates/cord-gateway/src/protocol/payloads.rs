//! Handshake payload definitions
//!
//! Payloads exchanged while a shard is starting up, and the REST gateway lookup.

use serde::{Deserialize, Serialize};

/// Payload for op 10 (Hello)
///
/// Sent by the server immediately after connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloPayload {
    /// Heartbeat interval in milliseconds
    pub heartbeat_interval: u64,
}

/// Payload for op 2 (Identify)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentifyPayload {
    /// Authentication token, without scheme
    pub token: String,

    pub properties: IdentifyProperties,

    /// Payload compression; this client never asks for it
    pub compress: bool,

    /// `[shard_index, shard_count]`, only present when sharding is in effect
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard: Option<[u32; 2]>,
}

impl IdentifyPayload {
    /// Copy of this payload safe to put in diagnostics
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            token: "<redacted>".to_string(),
            ..self.clone()
        }
    }
}

/// Client connection properties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyProperties {
    /// Operating system
    #[serde(rename = "$os")]
    pub os: String,

    /// Library identifier
    #[serde(rename = "$browser")]
    pub browser: String,

    /// Device identifier
    #[serde(rename = "$device")]
    pub device: String,
}

impl Default for IdentifyProperties {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            browser: "cord-gateway".to_string(),
            device: "cord-gateway".to_string(),
        }
    }
}

/// Response of `GET /gateway` and `GET /gateway/bot`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayInfo {
    /// WebSocket URL to connect shards to
    pub url: String,

    /// Recommended shard count (bot endpoint only)
    #[serde(default, rename = "shards", skip_serializing_if = "Option::is_none")]
    pub recommended_shard_count: Option<u32>,
}

impl GatewayInfo {
    /// Number of shards to open
    #[must_use]
    pub fn shard_count(&self) -> u32 {
        self.recommended_shard_count.unwrap_or(1).max(1)
    }

    /// Connection URL with protocol version and encoding
    #[must_use]
    pub fn connect_url(&self, version: u8) -> String {
        format!("{}/?v={version}&encoding=json", self.url.trim_end_matches('/'))
    }
}
