//! Error types for catalog operations.

use thiserror::Error;

/// Errors that can occur while fetching or transforming the set feed.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Network-level failure talking to the upstream feed.
    #[error("Feed request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream feed answered with a non-success status.
    #[error("Feed upstream returned status {0}")]
    UpstreamStatus(u16),

    /// The feed body did not match the expected record shape.
    #[error("Invalid feed record: {0}")]
    InvalidFeed(String),
}

impl CatalogError {
    /// Upstream HTTP status associated with this error, when known.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            CatalogError::UpstreamStatus(status) => Some(*status),
            CatalogError::Http(e) => e.status().map(|s| s.as_u16()),
            CatalogError::InvalidFeed(_) => None,
        }
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
