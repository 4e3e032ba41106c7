//! Upstream Feed Client
//!
//! Fetches the set feed and caches the transformed catalog for a short
//! revalidation window, mirroring the upstream's own cache lifetime so the
//! feed host is polled at most once per window under steady traffic.
//!
//! ## Usage
//!
//! ```ignore
//! use core_catalog::FeedClient;
//! use std::time::Duration;
//!
//! let client = FeedClient::new(
//!     reqwest::Client::new(),
//!     "https://example.com/music/sets.json",
//!     Duration::from_secs(60),
//! );
//!
//! let sets = client.sets().await?;
//! ```

use crate::error::{CatalogError, Result};
use crate::models::{DjSet, RawFeed};
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// A catalog snapshot with the instant it was fetched.
struct Snapshot {
    fetched_at: Instant,
    sets: Arc<Vec<DjSet>>,
}

/// Client for the upstream set feed with a revalidation window.
///
/// The cached snapshot is shared (`Arc`) so concurrent `/api/sets` requests
/// serve the same allocation. Revalidation failures are propagated rather
/// than silently served stale; HTTP-level `stale-while-revalidate` is where
/// staleness policy lives.
pub struct FeedClient {
    http: reqwest::Client,
    feed_url: String,
    revalidate_window: Duration,
    cache: RwLock<Option<Snapshot>>,
    events: Option<EventBus>,
}

impl FeedClient {
    /// Create a new feed client.
    pub fn new(
        http: reqwest::Client,
        feed_url: impl Into<String>,
        revalidate_window: Duration,
    ) -> Self {
        Self {
            http,
            feed_url: feed_url.into(),
            revalidate_window,
            cache: RwLock::new(None),
            events: None,
        }
    }

    /// Publish refresh outcomes on the given event bus.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Returns the current catalog, revalidating against the upstream feed
    /// when the cached snapshot is older than the revalidation window.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::UpstreamStatus` when the feed answers with a
    /// non-success status, `CatalogError::Http` on network failure, and
    /// `CatalogError::InvalidFeed` when a record cannot be transformed.
    pub async fn sets(&self) -> Result<Arc<Vec<DjSet>>> {
        {
            let cache = self.cache.read().await;
            if let Some(snapshot) = cache.as_ref() {
                if snapshot.fetched_at.elapsed() < self.revalidate_window {
                    debug!("Serving cached catalog snapshot");
                    return Ok(Arc::clone(&snapshot.sets));
                }
            }
        }

        self.refresh().await
    }

    /// Fetch the feed unconditionally and replace the cached snapshot.
    pub async fn refresh(&self) -> Result<Arc<Vec<DjSet>>> {
        match self.fetch_and_transform().await {
            Ok(sets) => {
                let sets = Arc::new(sets);
                let mut cache = self.cache.write().await;
                *cache = Some(Snapshot {
                    fetched_at: Instant::now(),
                    sets: Arc::clone(&sets),
                });

                info!(set_count = sets.len(), "Catalog refreshed");
                self.emit(CatalogEvent::Refreshed {
                    set_count: sets.len(),
                });
                Ok(sets)
            }
            Err(e) => {
                warn!(error = %e, "Catalog refresh failed");
                self.emit(CatalogEvent::RefreshFailed {
                    status: e.upstream_status(),
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn fetch_and_transform(&self) -> Result<Vec<DjSet>> {
        let response = self.http.get(&self.feed_url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::UpstreamStatus(status.as_u16()));
        }

        let raw: RawFeed = response.json().await?;
        raw.sets.into_iter().map(DjSet::try_from).collect()
    }

    fn emit(&self, event: CatalogEvent) {
        if let Some(events) = &self.events {
            // No subscribers is fine; the bus reports it as an error.
            events.emit(CoreEvent::Catalog(event)).ok();
        }
    }
}
