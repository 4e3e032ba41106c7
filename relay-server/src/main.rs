//! Relay server binary: configuration from environment, logging, serve.

use core_runtime::config::ServerConfig;
use core_runtime::logging::{init_logging, LoggingConfig};
use relay_server::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default())?;

    let config = ServerConfig::builder()
        .from_env()
        .build()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    info!(
        feed_url = %config.feed_url,
        bind_addr = %config.bind_addr,
        "Starting relay server"
    );

    let state = AppState::from_config(config)?;
    relay_server::serve(state).await
}
