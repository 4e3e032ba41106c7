//! # Server Configuration Module
//!
//! Provides configuration management for the relay server.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `ServerConfig` instance holding all settings the relay server needs. It
//! enforces fail-fast validation so a misconfigured feed URL is rejected at
//! startup rather than on the first request.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::config::ServerConfig;
//!
//! let config = ServerConfig::builder()
//!     .feed_url("https://example.com/music/sets.json")
//!     .bind_addr(([0, 0, 0, 0], 3000))
//!     .build()
//!     .expect("Failed to build config");
//!
//! assert_eq!(config.revalidate_window.as_secs(), 60);
//! ```
//!
//! Environment overrides are applied by [`ServerConfigBuilder::from_env`]:
//! `SETSTREAM_BIND`, `SETSTREAM_FEED_URL`, `SETSTREAM_PUBLIC_DIR`, and
//! `SETSTREAM_ALLOW_HOSTS` (comma-separated).

use crate::error::{Error, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Default upstream revalidation window for the set feed.
pub const DEFAULT_REVALIDATE_WINDOW: Duration = Duration::from_secs(60);

/// Default stale-while-revalidate grace advertised to shared caches.
pub const DEFAULT_SWR_GRACE: Duration = Duration::from_secs(120);

/// Default timeout for upstream requests (feed and audio origin).
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the relay server.
///
/// Use [`ServerConfig::builder`] to construct instances.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    pub bind_addr: SocketAddr,

    /// Absolute URL of the upstream set feed.
    pub feed_url: String,

    /// How long a fetched feed snapshot is served before revalidating.
    pub revalidate_window: Duration,

    /// Stale-while-revalidate grace period advertised in `Cache-Control`.
    pub swr_grace: Duration,

    /// Timeout applied to upstream requests.
    pub upstream_timeout: Duration,

    /// Hosts the audio proxy is allowed to dial. Empty means any http(s)
    /// origin, matching the permissive behavior of the original deployment.
    pub proxy_allow_hosts: Vec<String>,

    /// Directory with the static app shell, served as the router fallback.
    pub public_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Creates a new builder.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// Returns true when `host` may be dialed by the audio proxy.
    pub fn is_host_allowed(&self, host: &str) -> bool {
        self.proxy_allow_hosts.is_empty()
            || self
                .proxy_allow_hosts
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(host))
    }

    /// Renders the `Cache-Control` value for `/api/sets` responses.
    pub fn sets_cache_control(&self) -> String {
        format!(
            "public, s-maxage={}, stale-while-revalidate={}",
            self.revalidate_window.as_secs(),
            self.swr_grace.as_secs()
        )
    }
}

/// Builder for [`ServerConfig`] with fail-fast validation.
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    bind_addr: Option<SocketAddr>,
    feed_url: Option<String>,
    revalidate_window: Option<Duration>,
    swr_grace: Option<Duration>,
    upstream_timeout: Option<Duration>,
    proxy_allow_hosts: Vec<String>,
    public_dir: Option<PathBuf>,
}

impl ServerConfigBuilder {
    /// Set the listener bind address.
    pub fn bind_addr(mut self, addr: impl Into<SocketAddr>) -> Self {
        self.bind_addr = Some(addr.into());
        self
    }

    /// Set the upstream feed URL (required).
    pub fn feed_url(mut self, url: impl Into<String>) -> Self {
        self.feed_url = Some(url.into());
        self
    }

    /// Set the feed revalidation window.
    pub fn revalidate_window(mut self, window: Duration) -> Self {
        self.revalidate_window = Some(window);
        self
    }

    /// Set the stale-while-revalidate grace period.
    pub fn swr_grace(mut self, grace: Duration) -> Self {
        self.swr_grace = Some(grace);
        self
    }

    /// Set the upstream request timeout.
    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = Some(timeout);
        self
    }

    /// Restrict the audio proxy to the given origin hosts.
    pub fn proxy_allow_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proxy_allow_hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    /// Serve the static app shell from this directory.
    pub fn public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = Some(dir.into());
        self
    }

    /// Apply environment variable overrides on top of any values set so far.
    pub fn from_env(mut self) -> Self {
        if let Ok(bind) = std::env::var("SETSTREAM_BIND") {
            if let Ok(addr) = bind.parse() {
                self.bind_addr = Some(addr);
            }
        }
        if let Ok(url) = std::env::var("SETSTREAM_FEED_URL") {
            self.feed_url = Some(url);
        }
        if let Ok(dir) = std::env::var("SETSTREAM_PUBLIC_DIR") {
            self.public_dir = Some(PathBuf::from(dir));
        }
        if let Ok(hosts) = std::env::var("SETSTREAM_ALLOW_HOSTS") {
            self.proxy_allow_hosts = hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(String::from)
                .collect();
        }
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when the feed URL is missing or is not an
    /// absolute http(s) URL.
    pub fn build(self) -> Result<ServerConfig> {
        let feed_url = self
            .feed_url
            .ok_or_else(|| Error::Config("feed_url is required".to_string()))?;

        if !feed_url.starts_with("http://") && !feed_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "feed_url must be an absolute http(s) URL, got: {}",
                feed_url
            )));
        }

        Ok(ServerConfig {
            bind_addr: self
                .bind_addr
                .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 3000))),
            feed_url,
            revalidate_window: self.revalidate_window.unwrap_or(DEFAULT_REVALIDATE_WINDOW),
            swr_grace: self.swr_grace.unwrap_or(DEFAULT_SWR_GRACE),
            upstream_timeout: self.upstream_timeout.unwrap_or(DEFAULT_UPSTREAM_TIMEOUT),
            proxy_allow_hosts: self.proxy_allow_hosts,
            public_dir: self.public_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_with_defaults() {
        let config = ServerConfig::builder()
            .feed_url("https://example.com/sets.json")
            .build()
            .unwrap();

        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.revalidate_window, DEFAULT_REVALIDATE_WINDOW);
        assert_eq!(config.swr_grace, DEFAULT_SWR_GRACE);
        assert!(config.proxy_allow_hosts.is_empty());
        assert!(config.public_dir.is_none());
    }

    #[test]
    fn missing_feed_url_fails_fast() {
        let result = ServerConfig::builder().build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn non_http_feed_url_is_rejected() {
        let result = ServerConfig::builder().feed_url("ftp://example.com/sets").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn empty_allow_list_permits_any_host() {
        let config = ServerConfig::builder()
            .feed_url("https://example.com/sets.json")
            .build()
            .unwrap();

        assert!(config.is_host_allowed("anything.example.org"));
    }

    #[test]
    fn allow_list_is_case_insensitive() {
        let config = ServerConfig::builder()
            .feed_url("https://example.com/sets.json")
            .proxy_allow_hosts(["Cdn.Example.com"])
            .build()
            .unwrap();

        assert!(config.is_host_allowed("cdn.example.com"));
        assert!(!config.is_host_allowed("other.example.com"));
    }

    #[test]
    fn cache_control_header_reflects_windows() {
        let config = ServerConfig::builder()
            .feed_url("https://example.com/sets.json")
            .revalidate_window(Duration::from_secs(30))
            .swr_grace(Duration::from_secs(90))
            .build()
            .unwrap();

        assert_eq!(
            config.sets_cache_control(),
            "public, s-maxage=30, stale-while-revalidate=90"
        );
    }
}
