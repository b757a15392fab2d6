//! Client configuration structs
//!
//! Loads the gateway client configuration from environment variables.

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Application (client) ID
    #[serde(default)]
    pub client_id: String,
    /// Application secret
    #[serde(default)]
    pub client_secret: String,
    /// Authentication token
    pub token: String,
    /// Whether the token belongs to a bot account
    #[serde(default = "default_is_bot")]
    pub is_bot: bool,
    /// Emit debug diagnostics on the public event surface
    #[serde(default)]
    pub debug: bool,
    /// REST API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Gateway protocol version sent as the `v` query parameter
    #[serde(default = "default_gateway_version")]
    pub gateway_version: u8,
    /// User-Agent sent with every REST call
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Reuse cached direct-message channels instead of opening one per send
    #[serde(default)]
    pub reuse_dm_channels: bool,
    #[serde(default)]
    pub timings: GatewayTimings,
}

/// Fixed protocol timings.
///
/// The defaults are the values the gateway expects; only tests shorten them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GatewayTimings {
    /// Spacing between throttled (identify) commands
    pub throttle_period: Duration,
    /// Period of the direct-message channel cleanup sweep
    pub cleanup_period: Duration,
    /// Idle time after which a direct-message channel is deleted
    pub dm_channel_ttl: Duration,
    /// Delay before retrying a shard whose connection attempt failed
    pub connect_retry_delay: Duration,
    /// Delay before reconnecting a shard whose connection closed
    pub reconnect_delay: Duration,
}

impl Default for GatewayTimings {
    fn default() -> Self {
        Self {
            throttle_period: Duration::from_secs(6),
            cleanup_period: Duration::from_secs(60),
            dm_channel_ttl: Duration::from_secs(300),
            connect_retry_delay: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
        }
    }
}

// Default value functions
fn default_is_bot() -> bool {
    true
}

fn default_api_base() -> String {
    "https://discordapp.com/api/v6".to_string()
}

fn default_gateway_version() -> u8 {
    6
}

fn default_user_agent() -> String {
    format!("cord-gateway ({})", env!("CARGO_PKG_VERSION"))
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue(name, other.to_string())),
    }
}

fn env_bool(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    env::var(name).map_or(Ok(default), |v| parse_bool(name, &v))
}

impl ClientConfig {
    /// Create a configuration for the given token with default settings
    #[must_use]
    pub fn new(token: impl Into<String>, is_bot: bool) -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            token: token.into(),
            is_bot,
            debug: false,
            api_base: default_api_base(),
            gateway_version: default_gateway_version(),
            user_agent: default_user_agent(),
            reuse_dm_channels: false,
            timings: GatewayTimings::default(),
        }
    }

    /// Set the application credentials
    #[must_use]
    pub fn with_credentials(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.client_secret = client_secret.into();
        self
    }

    /// Enable or disable debug diagnostics
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Override the protocol timings
    #[must_use]
    pub fn with_timings(mut self, timings: GatewayTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Value of the `Authorization` header for REST calls.
    ///
    /// User tokens are sent bare, without a scheme.
    #[must_use]
    pub fn authorization(&self) -> String {
        if self.is_bot {
            format!("Bot {}", self.token)
        } else {
            self.token.clone()
        }
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let token = env::var("DISCORD_TOKEN").map_err(|_| ConfigError::MissingVar("DISCORD_TOKEN"))?;
        if token.trim().is_empty() {
            return Err(ConfigError::InvalidValue("DISCORD_TOKEN", "empty".to_string()));
        }

        Ok(Self {
            client_id: env::var("DISCORD_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("DISCORD_CLIENT_SECRET").unwrap_or_default(),
            token,
            is_bot: env_bool("DISCORD_IS_BOT", default_is_bot())?,
            debug: env_bool("DISCORD_DEBUG", false)?,
            api_base: env::var("DISCORD_API_BASE").unwrap_or_else(|_| default_api_base()),
            gateway_version: env::var("DISCORD_GATEWAY_VERSION")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_gateway_version),
            user_agent: env::var("DISCORD_USER_AGENT").unwrap_or_else(|_| default_user_agent()),
            reuse_dm_channels: env_bool("DISCORD_REUSE_DM_CHANNELS", false)?,
            timings: GatewayTimings::default(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
