//! # Streaming Audio Proxy
//!
//! `GET /api/audio?url=<absolute URL>` relays a remote audio stream to the
//! browser, preserving HTTP range semantics end to end.
//!
//! ## Overview
//!
//! The proxy is stateless. Each request:
//!
//! 1. Validates the `url` parameter (absolute http(s), allow-listed host)
//!    before any network traffic.
//! 2. Forwards the client's `Range` header to the origin verbatim when
//!    present; otherwise issues an unranged request.
//! 3. Relays origin failure statuses unchanged, and streams successful bodies
//!    through without buffering them in memory.
//!
//! A `206 Partial Content` is returned only when the client actually sent a
//! `Range` *and* the origin honored it; a ranged client hitting a
//! range-oblivious origin gets the full stream as `200`.

use crate::error::{RelayError, Result};
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use serde::Deserialize;
use tracing::{debug, warn};

/// Fallback when the origin does not declare a content type.
const DEFAULT_CONTENT_TYPE: &str = "audio/mpeg";

/// Query parameters for the audio proxy endpoint.
#[derive(Debug, Deserialize)]
pub struct AudioQuery {
    /// Absolute URL of the audio source, percent-encoded by the caller.
    pub url: Option<String>,
}

/// Handler for `GET /api/audio`.
pub async fn audio(
    State(state): State<AppState>,
    Query(query): Query<AudioQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let raw_url = query.url.filter(|u| !u.is_empty()).ok_or(RelayError::MissingUrl)?;
    let source = validate_source(&state, &raw_url)?;

    let client_range = headers.get(header::RANGE).cloned();
    let mut request = state.http.get(source);
    if let Some(range) = &client_range {
        request = request.header(header::RANGE, range);
    }

    let origin = request.send().await.map_err(|e| {
        warn!(url = %raw_url, error = %e, "Audio origin unreachable");
        RelayError::Relay(e.to_string())
    })?;

    let origin_status = origin.status();
    if !origin_status.is_success() {
        debug!(url = %raw_url, status = %origin_status, "Relaying origin failure");
        return Err(RelayError::Upstream {
            status: origin_status.as_u16(),
        });
    }

    // 206 requires both sides to have agreed on a range.
    let status = if client_range.is_some() && origin_status == StatusCode::PARTIAL_CONTENT {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };

    let mut response = Response::builder()
        .status(status)
        .header(header::ACCEPT_RANGES, "bytes");

    let origin_headers = origin.headers();
    let content_type = origin_headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    response = response.header(header::CONTENT_TYPE, content_type);

    for name in [header::CONTENT_LENGTH, header::CONTENT_RANGE] {
        if let Some(value) = origin_headers.get(&name) {
            response = response.header(name, value.clone());
        }
    }

    let body = Body::from_stream(origin.bytes_stream());
    response
        .body(body)
        .map_err(|e| RelayError::Relay(e.to_string()))
}

/// Validates the source URL before any outbound call is made.
fn validate_source(state: &AppState, raw_url: &str) -> Result<reqwest::Url> {
    let source = reqwest::Url::parse(raw_url)
        .map_err(|_| RelayError::InvalidUrl(raw_url.to_string()))?;

    if !matches!(source.scheme(), "http" | "https") {
        return Err(RelayError::InvalidUrl(raw_url.to_string()));
    }

    let host = source
        .host_str()
        .ok_or_else(|| RelayError::InvalidUrl(raw_url.to_string()))?;
    if !state.config.is_host_allowed(host) {
        return Err(RelayError::InvalidUrl(format!(
            "host not allowed: {host}"
        )));
    }

    Ok(source)
}
