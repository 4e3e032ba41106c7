//! # Set Catalog Endpoint
//!
//! `GET /api/sets` returns the transformed DJ set catalog as JSON. The
//! upstream feed is revalidated by [`core_catalog::FeedClient`] on its
//! configured window; responses advertise the matching `Cache-Control`
//! policy so shared caches can serve stale copies while revalidating.

use crate::error::Result;
use crate::state::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::debug;

/// Handler for `GET /api/sets`.
pub async fn sets(State(state): State<AppState>) -> Result<Response> {
    let sets = state.feed.sets().await?;
    debug!(count = sets.len(), "Serving set catalog");

    let cache_control = state.config.sets_cache_control();
    let response = (
        [(header::CACHE_CONTROL, cache_control)],
        Json(sets.as_ref().clone()),
    )
        .into_response();
    Ok(response)
}
