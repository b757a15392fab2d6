//! Handler error types

use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Payload did not have the expected shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Payload could not be (de)serialized
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Frame arrived for a shard the session no longer tracks
    #[error("Unknown shard: {0}")]
    UnknownShard(u32),
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
