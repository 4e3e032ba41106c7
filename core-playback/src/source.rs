//! Source URL resolution.
//!
//! First-party paths and in-memory object references play directly; remote
//! URLs are routed through the streaming proxy so the browser-facing origin
//! stays single and range requests work against hosts with awkward CORS.

/// Returns `true` when the URL can be handed to the transport as-is: a
/// first-party path or an in-memory object reference.
pub fn is_direct_source(url: &str) -> bool {
    url.starts_with('/') || url.starts_with("blob:") || url.starts_with("data:")
}

/// Resolve a catalog audio URL to the URL the transport should load.
///
/// Direct sources are returned unchanged; anything else is routed through the
/// proxy endpoint with the origin URL percent-encoded into the `url` query
/// parameter.
pub fn resolve_source_url(audio_url: &str, proxy_base: &str) -> String {
    if is_direct_source(audio_url) {
        return audio_url.to_string();
    }
    format!("{}?url={}", proxy_base, urlencoding::encode(audio_url))
}
