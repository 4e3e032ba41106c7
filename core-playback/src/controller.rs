//! # Playback Controller
//!
//! The state machine mediating between UI commands and the transport.
//!
//! ## Overview
//!
//! The controller owns at most one live transport. States move
//! `Empty → Loading → Ready/Paused ⇄ Ready/Playing`; selecting a set from any
//! state forcibly tears the current transport down and re-enters `Loading`.
//!
//! Two channels feed the controller besides its direct methods:
//!
//! - Transport events arrive on an internal generation-tagged channel and are
//!   drained by [`PlaybackController::process_events`]. Events from a
//!   torn-down transport carry a stale generation and are discarded, so a
//!   source switch can never leak old events into the new session.
//! - [`RemoteHandle`] is a cloneable command channel for UI surfaces that do
//!   not hold the controller (a minimized player, media keys). Commands are
//!   drained by [`PlaybackController::process_commands`] and applied exactly
//!   as the direct methods would.
//!
//! The transport's asynchronous acknowledgements are the source of truth for
//! `is_playing`: the controller only flips the flag on `Playing` / `Paused` /
//! `Ended` events, never on the request itself, so a rejected play request
//! (autoplay restrictions) cannot drift the session state.

use crate::error::Result;
use crate::session::{ActiveSet, PlaybackSession};
use crate::source::resolve_source_url;
use crate::traits::{
    Transport, TransportEvent, TransportEventSink, TransportFactory, TransportGeneration,
};
use core_catalog::DjSet;
use core_runtime::events::{CoreEvent, EventBus, PlayerEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Commands accepted on the out-of-band channel.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Same action as [`PlaybackController::toggle_play`].
    TogglePlayback,
    /// Relative seek in seconds; negative is backward.
    Skip(f64),
    /// Set the stored volume.
    SetVolume(f32),
    /// Mute or unmute without touching the stored volume.
    SetMuted(bool),
}

/// Cloneable handle for UI surfaces without a controller reference.
#[derive(Debug, Clone)]
pub struct RemoteHandle {
    tx: mpsc::UnboundedSender<PlayerCommand>,
}

impl RemoteHandle {
    /// Request the same action as [`PlaybackController::toggle_play`].
    pub fn toggle_playback(&self) {
        self.tx.send(PlayerCommand::TogglePlayback).ok();
    }

    /// Request a relative seek.
    pub fn skip(&self, delta_secs: f64) {
        self.tx.send(PlayerCommand::Skip(delta_secs)).ok();
    }

    /// Request a volume change.
    pub fn set_volume(&self, volume: f32) {
        self.tx.send(PlayerCommand::SetVolume(volume)).ok();
    }

    /// Request mute or unmute.
    pub fn set_muted(&self, muted: bool) {
        self.tx.send(PlayerCommand::SetMuted(muted)).ok();
    }
}

/// The playback-controller state machine.
pub struct PlaybackController {
    factory: Arc<dyn TransportFactory>,
    events: EventBus,
    proxy_base: String,
    session: PlaybackSession,
    transport: Option<Box<dyn Transport>>,
    generation: TransportGeneration,
    transport_tx: mpsc::UnboundedSender<(TransportGeneration, TransportEvent)>,
    transport_rx: mpsc::UnboundedReceiver<(TransportGeneration, TransportEvent)>,
    command_tx: mpsc::UnboundedSender<PlayerCommand>,
    command_rx: mpsc::UnboundedReceiver<PlayerCommand>,
}

impl PlaybackController {
    /// Create a controller with no set selected.
    ///
    /// `proxy_base` is the streaming-proxy endpoint remote sources are routed
    /// through, e.g. `/api/audio`.
    pub fn new(
        factory: Arc<dyn TransportFactory>,
        events: EventBus,
        proxy_base: impl Into<String>,
    ) -> Self {
        let (transport_tx, transport_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        Self {
            factory,
            events,
            proxy_base: proxy_base.into(),
            session: PlaybackSession::default(),
            transport: None,
            generation: 0,
            transport_tx,
            transport_rx,
            command_tx,
            command_rx,
        }
    }

    /// The current UI-observable session state.
    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    /// A command handle for secondary UI surfaces.
    pub fn remote(&self) -> RemoteHandle {
        RemoteHandle {
            tx: self.command_tx.clone(),
        }
    }

    // ========================================================================
    // Transport lifecycle
    // ========================================================================

    /// Select a set for playback.
    ///
    /// Always transitions to `Loading`: the previous transport is shut down
    /// and its event sink invalidated before the new transport is
    /// constructed, and the session is reset optimistically regardless of
    /// when the new source becomes ready.
    pub async fn select_set(&mut self, set: &DjSet) -> Result<()> {
        self.teardown_transport().await;

        self.session.begin_loading(ActiveSet {
            id: set.id.clone(),
            title: set.title.clone(),
            audio_url: set.audio_url.clone(),
        });
        self.emit(PlayerEvent::Loading {
            set_id: set.id.clone(),
        });

        let sink = TransportEventSink::new(self.generation, self.transport_tx.clone());
        let transport = match self.factory.create(sink).await {
            Ok(transport) => transport,
            Err(e) => {
                self.emit(PlayerEvent::Error {
                    message: e.to_string(),
                    recoverable: e.is_transient(),
                });
                return Err(e);
            }
        };

        let url = resolve_source_url(&set.audio_url, &self.proxy_base);
        debug!(set_id = %set.id, url = %url, "Loading source");
        let load_result = transport.load(&url).await;
        // The transport is kept even when the load fails: the session stays
        // in Loading and the UI owns the retry affordance.
        self.transport = Some(transport);

        if let Err(e) = load_result {
            self.emit(PlayerEvent::Error {
                message: e.to_string(),
                recoverable: e.is_transient(),
            });
            return Err(e);
        }

        Ok(())
    }

    /// Tear down playback entirely, e.g. when the owning view unmounts.
    pub async fn shutdown(&mut self) {
        self.teardown_transport().await;
        self.session = PlaybackSession {
            volume: self.session.volume,
            is_muted: self.session.is_muted,
            ..PlaybackSession::default()
        };
    }

    /// Shut down and drop the current transport, invalidating its event sink
    /// before anything new is attached.
    async fn teardown_transport(&mut self) {
        self.generation += 1;
        if let Some(transport) = self.transport.take() {
            if let Err(e) = transport.shutdown().await {
                warn!(error = %e, "Transport shutdown failed");
            }
        }
    }

    // ========================================================================
    // Transport commands
    // ========================================================================

    /// Toggle between play and pause. No-op while not ready.
    pub async fn toggle_play(&mut self) -> Result<()> {
        if !self.session.is_ready {
            return Ok(());
        }
        let Some(transport) = &self.transport else {
            return Ok(());
        };

        if self.session.is_playing {
            transport.pause().await
        } else {
            transport.play().await
        }
    }

    /// Seek relative to the current position, clamped to `[0, duration]` in
    /// both directions. No-op while not ready or when the delta is not a
    /// finite number.
    pub async fn skip(&mut self, delta_secs: f64) -> Result<()> {
        // NaN survives clamp and would panic in Duration construction.
        if !self.session.is_ready || !delta_secs.is_finite() {
            return Ok(());
        }

        let target = (self.session.position.as_secs_f64() + delta_secs)
            .clamp(0.0, self.session.duration.as_secs_f64());
        self.seek_to(Duration::from_secs_f64(target)).await
    }

    /// Seek to a fraction of the stream (progress-bar interaction). The
    /// fraction is clamped to `[0, 1]` defensively. No-op while not ready,
    /// when the duration is zero, or when the fraction is not a finite
    /// number.
    pub async fn seek_to_fraction(&mut self, fraction: f64) -> Result<()> {
        // NaN survives clamp and would panic in Duration construction.
        if !self.session.is_ready || self.session.duration.is_zero() || !fraction.is_finite() {
            return Ok(());
        }

        let target = self.session.duration.as_secs_f64() * fraction.clamp(0.0, 1.0);
        self.seek_to(Duration::from_secs_f64(target)).await
    }

    async fn seek_to(&mut self, target: Duration) -> Result<()> {
        let Some(transport) = &self.transport else {
            return Ok(());
        };
        transport.seek(target).await?;

        // Mirror the target immediately; subsequent progress events re-assert
        // the transport's own position.
        self.session.position = target;
        self.emit(PlayerEvent::Progress {
            position_secs: target.as_secs_f64(),
        });
        Ok(())
    }

    /// Set the stored volume, clamped to `[0, 1]`. Applied to the transport
    /// immediately when one exists; while muted the stored value changes but
    /// the effective output stays silent.
    pub async fn set_volume(&mut self, volume: f32) -> Result<()> {
        if !volume.is_finite() {
            return Ok(());
        }
        self.session.volume = volume.clamp(0.0, 1.0);
        self.apply_effective_volume().await?;
        self.emit(PlayerEvent::VolumeChanged {
            volume: self.session.volume,
            muted: self.session.is_muted,
        });
        Ok(())
    }

    /// Mute or unmute. Unmuting restores the stored volume.
    pub async fn set_muted(&mut self, muted: bool) -> Result<()> {
        self.session.is_muted = muted;
        self.apply_effective_volume().await?;
        self.emit(PlayerEvent::VolumeChanged {
            volume: self.session.volume,
            muted: self.session.is_muted,
        });
        Ok(())
    }

    async fn apply_effective_volume(&self) -> Result<()> {
        if let Some(transport) = &self.transport {
            transport.set_volume(self.session.effective_volume()).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Event & command pumps
    // ========================================================================

    /// Drain and apply all pending out-of-band commands.
    pub async fn process_commands(&mut self) -> Result<()> {
        while let Ok(command) = self.command_rx.try_recv() {
            match command {
                PlayerCommand::TogglePlayback => self.toggle_play().await?,
                PlayerCommand::Skip(delta) => self.skip(delta).await?,
                PlayerCommand::SetVolume(volume) => self.set_volume(volume).await?,
                PlayerCommand::SetMuted(muted) => self.set_muted(muted).await?,
            }
        }
        Ok(())
    }

    /// Drain all pending transport events into the session.
    pub async fn process_events(&mut self) {
        while let Ok((generation, event)) = self.transport_rx.try_recv() {
            if generation != self.generation {
                debug!(
                    stale = generation,
                    current = self.generation,
                    "Discarding event from torn-down transport"
                );
                continue;
            }
            self.handle_transport_event(event).await;
        }
    }

    /// Convenience pump: commands first, then events.
    pub async fn process_pending(&mut self) -> Result<()> {
        self.process_commands().await?;
        self.process_events().await;
        Ok(())
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::MetadataLoaded { duration } => {
                self.session.duration = duration;
                self.session.is_ready = true;
                if let Err(e) = self.apply_effective_volume().await {
                    warn!(error = %e, "Failed to apply volume on ready");
                }
                let set_id = self
                    .session
                    .active_set
                    .as_ref()
                    .map(|s| s.id.clone())
                    .unwrap_or_default();
                self.emit(PlayerEvent::Ready {
                    set_id,
                    duration_secs: duration.as_secs_f64(),
                });
            }
            TransportEvent::Progress { position } => {
                self.session.position = position.min(self.session.duration);
                self.emit(PlayerEvent::Progress {
                    position_secs: self.session.position.as_secs_f64(),
                });
            }
            TransportEvent::Playing => {
                self.session.is_playing = true;
                self.emit(PlayerEvent::Playing);
            }
            TransportEvent::Paused => {
                self.session.is_playing = false;
                self.emit(PlayerEvent::Paused);
            }
            TransportEvent::Ended { position } => {
                // Position is left where the transport reports it rather than
                // reset to zero.
                self.session.is_playing = false;
                self.session.position = position.min(self.session.duration);
                self.emit(PlayerEvent::Ended {
                    position_secs: self.session.position.as_secs_f64(),
                });
            }
            TransportEvent::Failed { message } => {
                warn!(message = %message, "Transport reported failure");
                self.emit(PlayerEvent::Error {
                    message,
                    recoverable: true,
                });
            }
        }
    }

    fn emit(&self, event: PlayerEvent) {
        // No subscribers is fine; the bus reports it as an error.
        self.events.emit(CoreEvent::Player(event)).ok();
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("state", &self.session.state())
            .field("generation", &self.generation)
            .field("has_transport", &self.transport.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use crate::traits::{MockTransport, MockTransportFactory};
    use chrono::NaiveDate;
    use mockall::predicate::eq;

    fn test_set(audio_url: &str) -> DjSet {
        DjSet {
            id: "set-1".to_string(),
            title: "Midnight Warehouse Session".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 11, 15).unwrap(),
            duration_secs: 5400,
            genres: vec!["Techno".to_string()],
            cover_url: "/covers/warehouse.jpg".to_string(),
            audio_url: audio_url.to_string(),
            peaks: None,
        }
    }

    fn controller_with(factory: MockTransportFactory) -> PlaybackController {
        PlaybackController::new(Arc::new(factory), EventBus::new(16), "/api/audio")
    }

    #[tokio::test]
    async fn select_set_routes_remote_source_through_proxy() {
        let mut factory = MockTransportFactory::new();
        factory.expect_create().times(1).returning(|_| {
            let mut transport = MockTransport::new();
            transport
                .expect_load()
                .with(eq(
                    "/api/audio?url=https%3A%2F%2Fcdn.example.com%2Fwarehouse.mp3",
                ))
                .times(1)
                .returning(|_| Ok(()));
            Ok(Box::new(transport) as Box<dyn Transport>)
        });

        let mut controller = controller_with(factory);
        let set = test_set("https://cdn.example.com/warehouse.mp3");

        controller.select_set(&set).await.unwrap();
        assert_eq!(controller.session().state(), crate::PlayerState::Loading);
    }

    #[tokio::test]
    async fn select_set_uses_local_source_directly() {
        let mut factory = MockTransportFactory::new();
        factory.expect_create().times(1).returning(|_| {
            let mut transport = MockTransport::new();
            transport
                .expect_load()
                .with(eq("/music/warehouse.mp3"))
                .times(1)
                .returning(|_| Ok(()));
            Ok(Box::new(transport) as Box<dyn Transport>)
        });

        let mut controller = controller_with(factory);
        controller
            .select_set(&test_set("/music/warehouse.mp3"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn toggle_play_is_a_noop_before_ready() {
        let mut factory = MockTransportFactory::new();
        factory.expect_create().times(1).returning(|_| {
            let mut transport = MockTransport::new();
            transport.expect_load().returning(|_| Ok(()));
            // No play expectation: it must not be called.
            Ok(Box::new(transport) as Box<dyn Transport>)
        });

        let mut controller = controller_with(factory);
        controller
            .select_set(&test_set("/music/warehouse.mp3"))
            .await
            .unwrap();

        controller.toggle_play().await.unwrap();
        assert!(!controller.session().is_playing);
    }

    #[tokio::test]
    async fn load_failure_keeps_session_loading() {
        let mut factory = MockTransportFactory::new();
        factory.expect_create().times(1).returning(|_| {
            let mut transport = MockTransport::new();
            transport.expect_load().returning(|_| {
                Err(PlaybackError::SourceUnavailable("origin 503".to_string()))
            });
            Ok(Box::new(transport) as Box<dyn Transport>)
        });

        let mut controller = controller_with(factory);
        let result = controller
            .select_set(&test_set("/music/warehouse.mp3"))
            .await;

        assert!(result.is_err());
        assert_eq!(controller.session().state(), crate::PlayerState::Loading);
    }
}
