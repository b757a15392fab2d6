//! Integration test utilities for the gateway client
//!
//! This crate provides mock transports, a mock REST API, and gateway frame
//! fixtures for driving a client end to end without a network.

pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
