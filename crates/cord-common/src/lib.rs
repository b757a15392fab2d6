//! # cord-common
//!
//! Shared utilities for the gateway client: configuration and telemetry.

pub mod config;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use config::{ClientConfig, ConfigError, GatewayTimings};
pub use telemetry::{try_init_tracing, LogFormat, TracingError};
