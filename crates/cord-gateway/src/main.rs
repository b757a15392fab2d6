//! Gateway client entry point
//!
//! Run with:
//! ```bash
//! cargo run -p cord-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use cord_common::{try_init_tracing, ClientConfig, ConfigError, LogFormat};
use cord_gateway::{names, ClientEvent, GatewayClient};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() {
    let config = ClientConfig::from_env();
    let debug = config.as_ref().is_ok_and(|config| config.debug);
    if let Err(e) = try_init_tracing(LogFormat::from_env(), debug) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Gateway client failed");
        std::process::exit(1);
    }
}

async fn run(config: Result<ClientConfig, ConfigError>) -> Result<(), Box<dyn std::error::Error>> {
    let config = config.map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;
    info!(bot = config.is_bot, debug = config.debug, "Configuration loaded");

    let client = GatewayClient::from_config(config)?;

    client.on(names::MESSAGE, |_, event| {
        if let ClientEvent::Message { text, .. } = event {
            info!("{text}");
        }
        Ok(())
    });
    client.on(names::DEBUG, |_, event| {
        if let ClientEvent::Debug { text, detail } = event {
            debug!(detail = ?detail, "{text}");
        }
        Ok(())
    });
    client.on(names::ERROR, |_, event| {
        if let ClientEvent::Error { origin, message } = event {
            warn!(origin = %origin, "{message}");
        }
        Ok(())
    });
    client.on(names::event("MESSAGE_CREATE"), |_, event| {
        if let ClientEvent::Dispatch { shard, data, .. } = event {
            let author = data["author"]["username"].as_str().unwrap_or("unknown");
            let content = data["content"].as_str().unwrap_or_default();
            info!(shard, author, "{content}");
        }
        Ok(())
    });

    client.connect()?;
    info!("Gateway client started, press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    client.disconnect();
    client.disconnected().await;

    Ok(())
}
