//! Client error types

use crate::rest::RestError;
use crate::transport::TransportError;
use thiserror::Error;

/// Errors returned by [`GatewayClient`](crate::GatewayClient) operations
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Already connected")]
    AlreadyConnected,

    #[error("Not connected")]
    NotConnected,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("REST error: {0}")]
    Rest(#[from] RestError),

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Listener failed: {0}")]
    Listener(String),

    #[error("Runtime error: {0}")]
    Runtime(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Client result type
pub type ClientResult<T> = Result<T, ClientError>;
