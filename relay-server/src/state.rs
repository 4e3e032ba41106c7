//! Shared state passed to all request handlers.

use core_catalog::FeedClient;
use core_runtime::config::ServerConfig;
use core_runtime::events::EventBus;
use std::sync::Arc;

/// Shared application state, cloned per request by the router.
#[derive(Clone)]
pub struct AppState {
    /// Outbound HTTP client, reused across requests for connection pooling.
    pub http: reqwest::Client,
    /// Cached upstream feed client backing `/api/sets`.
    pub feed: Arc<FeedClient>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus for catalog refresh notifications.
    pub events: EventBus,
}

impl AppState {
    /// Builds the shared state from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the outbound HTTP client cannot be constructed.
    pub fn from_config(config: ServerConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .build()?;
        let events = EventBus::default();
        let feed = Arc::new(
            FeedClient::new(http.clone(), &config.feed_url, config.revalidate_window)
                .with_events(events.clone()),
        );

        Ok(Self {
            http,
            feed,
            config: Arc::new(config),
            events,
        })
    }
}
