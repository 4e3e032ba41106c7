//! # Playback Module
//!
//! Provides the playback-controller state machine for the set streaming
//! player.
//!
//! ## Overview
//!
//! This module handles:
//! - The [`Transport`] abstraction over the host's media engine
//! - The [`PlaybackSession`] state owned by the controller
//! - The [`PlaybackController`] state machine translating UI commands into
//!   transport calls and transport events into UI-observable state
//! - Proxy-or-direct source URL resolution
//!
//! ## Architecture
//!
//! The controller owns at most one live transport handle. Selecting a set is
//! an atomic destroy-then-create: the previous transport is shut down and its
//! event sink invalidated before the new transport is constructed, so events
//! from old and new transports are never interleaved.

pub mod controller;
pub mod error;
pub mod session;
pub mod source;
pub mod traits;

pub use controller::{PlaybackController, PlayerCommand, RemoteHandle};
pub use error::{PlaybackError, Result};
pub use session::{ActiveSet, PlaybackSession, PlayerState, DEFAULT_VOLUME};
pub use source::resolve_source_url;
pub use traits::{
    Transport, TransportEvent, TransportEventSink, TransportFactory, TransportGeneration,
};
