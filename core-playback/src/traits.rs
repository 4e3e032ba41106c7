//! # Transport Traits
//!
//! Defines the seam between the playback controller and the host's media
//! engine. A `Transport` wraps one buffered audio stream (a native media
//! element or equivalent); the controller never touches the stream directly.
//!
//! ## Threading Model
//!
//! Transport commands are issued from the controller's single event-processing
//! task. Implementations must be fast and non-blocking; buffering and decoding
//! happen behind the trait. Events flow back through a generation-tagged
//! [`TransportEventSink`], which lets the controller discard events from a
//! transport it has already torn down.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

/// Monotonically increasing tag identifying one transport binding.
///
/// The controller bumps the generation on every `select_set`; events carrying
/// an older generation are dropped on arrival.
pub type TransportGeneration = u64;

/// Events a transport reports back to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Stream metadata loaded; playback controls may go live.
    MetadataLoaded {
        /// Total stream duration.
        duration: Duration,
    },
    /// Playback position advanced at the transport's natural cadence, or a
    /// seek completed.
    Progress {
        /// Current position.
        position: Duration,
    },
    /// The transport acknowledged a play request (autoplay restrictions and
    /// the like mean a request is not an acknowledgement).
    Playing,
    /// The transport acknowledged a pause request.
    Paused,
    /// The stream reached its natural end.
    Ended {
        /// Final position; transports normally report the stream end here.
        position: Duration,
    },
    /// Loading or playback failed (network error, unsupported format).
    Failed {
        /// Human-readable failure message.
        message: String,
    },
}

/// Generation-tagged channel through which a transport delivers events.
#[derive(Debug, Clone)]
pub struct TransportEventSink {
    generation: TransportGeneration,
    tx: mpsc::UnboundedSender<(TransportGeneration, TransportEvent)>,
}

impl TransportEventSink {
    /// Create a sink bound to one transport generation.
    pub fn new(
        generation: TransportGeneration,
        tx: mpsc::UnboundedSender<(TransportGeneration, TransportEvent)>,
    ) -> Self {
        Self { generation, tx }
    }

    /// The generation this sink is bound to.
    pub fn generation(&self) -> TransportGeneration {
        self.generation
    }

    /// Deliver an event to the controller.
    ///
    /// Delivery after the controller has moved on is harmless: the stale
    /// generation tag causes the event to be discarded.
    pub fn emit(&self, event: TransportEvent) {
        self.tx.send((self.generation, event)).ok();
    }
}

/// Trait for host-specific audio transports.
///
/// One transport instance wraps one audio stream for one selected set. All
/// commands are asynchronous and should return promptly; completion of the
/// underlying operation is reported through the event sink.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Bind a source URL and begin buffering. Metadata arrival is reported
    /// via [`TransportEvent::MetadataLoaded`].
    async fn load(&self, url: &str) -> Result<()>;

    /// Request playback. Acknowledged via [`TransportEvent::Playing`].
    async fn play(&self) -> Result<()>;

    /// Request pause. Acknowledged via [`TransportEvent::Paused`].
    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position in the stream.
    async fn seek(&self, position: Duration) -> Result<()>;

    /// Set the effective output volume in `[0.0, 1.0]`.
    async fn set_volume(&self, volume: f32) -> Result<()>;

    /// Stop playback, abort in-flight fetches, and release resources.
    ///
    /// After shutdown the transport must emit no further events.
    async fn shutdown(&self) -> Result<()>;
}

/// Factory constructing one transport per set selection.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Construct a transport wired to the given event sink.
    async fn create(&self, sink: TransportEventSink) -> Result<Box<dyn Transport>>;
}
