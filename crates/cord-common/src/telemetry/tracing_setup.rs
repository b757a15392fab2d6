//! Tracing and logging setup
//!
//! `RUST_LOG` wins when set. Otherwise the client's debug flag decides how
//! verbose the gateway crate is.

use std::env;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format, chosen with `LOG_FORMAT`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Read `LOG_FORMAT` (`json` or `pretty`)
    #[must_use]
    pub fn from_env() -> Self {
        env::var("LOG_FORMAT").map_or(Self::default(), |value| Self::parse(&value))
    }

    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Pretty
        }
    }
}

/// Filter used when `RUST_LOG` is unset
fn default_directives(debug: bool) -> &'static str {
    if debug {
        "info,cord_gateway=debug"
    } else {
        "info"
    }
}

/// Install the global subscriber
///
/// Unlike a plain `init`, this does not panic when a subscriber is already set.
pub fn try_init_tracing(format: LogFormat, debug: bool) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Json => registry.with(fmt::layer().json().with_target(true)).try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_file(debug).with_line_number(debug))
            .try_init(),
    };
    result.map_err(|_| TracingError::AlreadyInitialized)
}

/// Tracing initialization errors
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}
