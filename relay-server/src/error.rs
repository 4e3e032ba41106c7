//! # Relay Error Types
//!
//! Error taxonomy for the relay server, with a direct mapping onto HTTP
//! responses. Every error renders as `{"error": <message>}` JSON so the
//! player UI has one shape to handle.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors produced while serving relay requests.
#[derive(Error, Debug)]
pub enum RelayError {
    /// The `url` query parameter is absent.
    #[error("Missing 'url' query parameter")]
    MissingUrl,

    /// The `url` query parameter is not a proxyable absolute http(s) URL,
    /// or its host is outside the configured allow-list.
    #[error("Invalid source URL: {0}")]
    InvalidUrl(String),

    /// The origin (audio source or set feed) answered with a failure status,
    /// which is relayed to the client unchanged.
    #[error("Upstream responded with status {status}")]
    Upstream { status: u16 },

    /// The relay itself failed (connect error, body error, serialization).
    #[error("Relay failure: {0}")]
    Relay(String),
}

impl RelayError {
    /// The HTTP status this error renders as.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MissingUrl | RelayError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::Relay(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Relay(e.to_string())
    }
}

impl From<core_catalog::CatalogError> for RelayError {
    fn from(e: core_catalog::CatalogError) -> Self {
        match e {
            core_catalog::CatalogError::UpstreamStatus(status) => RelayError::Upstream { status },
            other => RelayError::Relay(other.to_string()),
        }
    }
}

/// Convenience alias for handler results.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_maps_to_400() {
        assert_eq!(RelayError::MissingUrl.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_status_is_relayed_unchanged() {
        let err = RelayError::Upstream { status: 404 };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn unrepresentable_upstream_status_falls_back_to_502() {
        let err = RelayError::Upstream { status: 42 };
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn relay_failure_maps_to_500() {
        let err = RelayError::Relay("connection reset".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
