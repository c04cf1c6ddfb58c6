//! Review Board server entry point.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `review-board.yaml` and the environment
//! 2. Initialize structured logging (tracing)
//! 3. Build the store and broadcast hub
//! 4. Serve HTTP until `Ctrl-C`

use std::sync::Arc;

use review_server::{AppState, ServerConfig, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!(
        host = config.host,
        port = config.port,
        cors_origin = config.cors_origin,
        keep_alive_secs = config.keep_alive_secs,
        subscriber_buffer = config.subscriber_buffer,
        initial_delay_secs = config.initial_delay_secs,
        "Configuration loaded"
    );

    let state = Arc::new(AppState::from_config(&config)?);
    start_server(&config, state).await?;

    Ok(())
}
