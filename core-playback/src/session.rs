//! # Playback Session State
//!
//! The session is the single UI-observable snapshot of playback: which set is
//! active, whether the transport is ready and playing, position, duration,
//! and the volume/mute pair. One session exists at a time, owned by the
//! controller; it is reset whenever a new set is selected.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default volume for a fresh session.
pub const DEFAULT_VOLUME: f32 = 0.8;

/// The set a session is currently bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSet {
    /// Catalog ID of the set.
    pub id: String,
    /// Display title.
    pub title: String,
    /// The set's audio URL as published in the catalog (pre-resolution).
    pub audio_url: String,
}

/// Coarse player state derived from the session flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerState {
    /// No set selected.
    Empty,
    /// Source bound, awaiting metadata.
    Loading,
    /// Ready with playback paused.
    Paused,
    /// Ready and playing.
    Playing,
}

/// UI-observable playback state for the active set.
///
/// Invariants: `position <= duration` once ready; before ready both are zero
/// and `is_playing` is false.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSession {
    /// The selected set, if any.
    pub active_set: Option<ActiveSet>,
    /// Whether the transport reported metadata for the active set.
    pub is_ready: bool,
    /// Whether the transport acknowledged playback.
    pub is_playing: bool,
    /// Current playback position.
    pub position: Duration,
    /// Total stream duration (zero until ready).
    pub duration: Duration,
    /// Stored volume in `[0.0, 1.0]`, preserved under mute.
    pub volume: f32,
    /// Whether output is muted.
    pub is_muted: bool,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            active_set: None,
            is_ready: false,
            is_playing: false,
            position: Duration::ZERO,
            duration: Duration::ZERO,
            volume: DEFAULT_VOLUME,
            is_muted: false,
        }
    }
}

impl PlaybackSession {
    /// Derive the coarse player state.
    pub fn state(&self) -> PlayerState {
        match (&self.active_set, self.is_ready, self.is_playing) {
            (None, _, _) => PlayerState::Empty,
            (Some(_), false, _) => PlayerState::Loading,
            (Some(_), true, false) => PlayerState::Paused,
            (Some(_), true, true) => PlayerState::Playing,
        }
    }

    /// Effective volume applied to the transport.
    pub fn effective_volume(&self) -> f32 {
        if self.is_muted {
            0.0
        } else {
            self.volume
        }
    }

    /// Fraction of the stream played, in `[0.0, 1.0]`; zero until ready.
    pub fn progress_fraction(&self) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.position.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Reset for a newly selected set. Volume and mute persist across
    /// selections; position, duration, and readiness do not.
    pub fn begin_loading(&mut self, set: ActiveSet) {
        self.active_set = Some(set);
        self.is_ready = false;
        self.is_playing = false;
        self.position = Duration::ZERO;
        self.duration = Duration::ZERO;
    }
}
