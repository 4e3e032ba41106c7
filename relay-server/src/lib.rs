//! # Relay Server
//!
//! Axum HTTP server joining the catalog feed and the streaming audio proxy.
//!
//! ## Endpoints
//!
//! | Path | Description |
//! |------|-------------|
//! | `/api/audio?url=...` | Range-respecting streaming proxy for audio sources |
//! | `/api/sets` | Transformed DJ set catalog with shared-cache headers |
//! | `/health` | Liveness probe |
//!
//! When a `public_dir` is configured the static app shell is served as the
//! router fallback, so any non-API path resolves to the presentation layer's
//! files.

pub mod error;
pub mod proxy;
pub mod sets;
pub mod state;

pub use error::{RelayError, Result};
pub use state::AppState;

use axum::routing::get;
use axum::{Json, Router};
use core_runtime::events::{CoreEvent, EventBus, EventSeverity, EventStream, RecvError};
use serde_json::json;
use tower_http::services::ServeDir;
use tracing::{info, warn};

/// Builds the relay router over the given shared state.
pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/api/audio", get(proxy::audio))
        .route("/api/sets", get(sets::sets))
        .route("/health", get(health));

    if let Some(dir) = &state.config.public_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    router.with_state(state)
}

/// Handler for `GET /health`.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Spawns a task that logs catalog events from the bus.
///
/// The feed client publishes refresh outcomes out-of-band; this keeps them
/// visible in the server log regardless of which request triggered the
/// refresh.
pub fn spawn_event_logger(events: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut stream = EventStream::new(events.subscribe())
        .filter(|event| matches!(event, CoreEvent::Catalog(_)));

    tokio::spawn(async move {
        loop {
            match stream.recv().await {
                Ok(event) => {
                    if event.severity() >= EventSeverity::Error {
                        warn!(event = ?event, "{}", event.description());
                    } else {
                        info!(event = ?event, "{}", event.description());
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Event logger fell behind the bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Binds the configured address and serves requests until shutdown.
///
/// # Errors
///
/// Returns an error when the listener cannot bind or the server fails.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = state.config.bind_addr;
    let _event_logger = spawn_event_logger(&state.events);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Relay server listening");

    axum::serve(listener, router).await?;
    Ok(())
}
