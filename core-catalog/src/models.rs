//! Domain models for the set catalog
//!
//! This module contains the upstream feed record shape, the transformed
//! [`DjSet`] model served to clients, and the duration/date helpers shared
//! with the presentation layer.

use crate::error::{CatalogError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Upstream feed shapes
// =============================================================================

/// Envelope of the upstream feed document.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeed {
    /// Records in feed order; feed order is display order.
    pub sets: Vec<RawSet>,
}

/// One record as published by the upstream feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSet {
    pub id: String,
    pub title: String,
    /// Calendar date, ISO `YYYY-MM-DD`.
    pub date: String,
    /// Duration as an `"HH:MM:SS"` string.
    pub duration: String,
    /// Ordered genre tags.
    #[serde(default)]
    pub genre: Vec<String>,
    pub cover: String,
    pub audio: String,
    /// Optional precomputed two-channel waveform peaks, passed through
    /// untouched for clients that render them.
    #[serde(default)]
    pub peaks: Option<Vec<Vec<f32>>>,
}

// =============================================================================
// DjSet
// =============================================================================

/// One recorded DJ performance with metadata and an audio URL.
///
/// Immutable per catalog fetch. Serialized for `/api/sets` with the client
/// wire names (`duration` in seconds, `coverUrl`, `audioUrl`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DjSet {
    pub id: String,
    pub title: String,
    pub date: NaiveDate,
    /// Total length in seconds, parsed from the upstream duration string.
    #[serde(rename = "duration")]
    pub duration_secs: u64,
    pub genres: Vec<String>,
    pub cover_url: String,
    pub audio_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peaks: Option<Vec<Vec<f32>>>,
}

impl TryFrom<RawSet> for DjSet {
    type Error = CatalogError;

    fn try_from(raw: RawSet) -> Result<Self> {
        let date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d").map_err(|e| {
            CatalogError::InvalidFeed(format!("set {}: invalid date {:?}: {}", raw.id, raw.date, e))
        })?;

        Ok(Self {
            id: raw.id,
            title: raw.title,
            date,
            duration_secs: parse_duration(&raw.duration),
            genres: raw.genre,
            cover_url: raw.cover,
            audio_url: raw.audio,
            peaks: raw.peaks,
        })
    }
}

// =============================================================================
// Duration & date helpers
// =============================================================================

/// Parse an `"HH:MM:SS"` duration string into seconds.
///
/// Absent or non-numeric parts default to 0, so `"01:30"` parses as one hour
/// thirty minutes and an empty string parses as 0.
pub fn parse_duration(duration: &str) -> u64 {
    let mut parts = duration.split(':');
    let hours: u64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let minutes: u64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    let seconds: u64 = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    hours * 3600 + minutes * 60 + seconds
}

/// Format seconds as a zero-padded `"HH:MM:SS"` string.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Format a date for display as `DD.MM.YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

// =============================================================================
// Tests
// =============================================================================
