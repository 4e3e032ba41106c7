//! Controller state-machine tests against a scriptable fake transport.

use async_trait::async_trait;
use chrono::NaiveDate;
use core_catalog::DjSet;
use core_playback::{
    PlaybackController, PlayerState, Transport, TransportEvent, TransportEventSink,
    TransportFactory, DEFAULT_VOLUME,
};
use core_runtime::events::{CoreEvent, EventBus, PlayerEvent};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Everything a fake transport was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
enum Call {
    Load(String),
    Play,
    Pause,
    Seek(Duration),
    SetVolume(f32),
    Shutdown,
}

#[derive(Clone)]
struct FakeTransport {
    calls: Arc<Mutex<Vec<Call>>>,
    sink: TransportEventSink,
}

impl FakeTransport {
    fn emit(&self, event: TransportEvent) {
        self.sink.emit(event);
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn load(&self, url: &str) -> core_playback::Result<()> {
        self.calls.lock().unwrap().push(Call::Load(url.to_string()));
        Ok(())
    }

    async fn play(&self) -> core_playback::Result<()> {
        self.calls.lock().unwrap().push(Call::Play);
        Ok(())
    }

    async fn pause(&self) -> core_playback::Result<()> {
        self.calls.lock().unwrap().push(Call::Pause);
        Ok(())
    }

    async fn seek(&self, position: Duration) -> core_playback::Result<()> {
        self.calls.lock().unwrap().push(Call::Seek(position));
        Ok(())
    }

    async fn set_volume(&self, volume: f32) -> core_playback::Result<()> {
        self.calls.lock().unwrap().push(Call::SetVolume(volume));
        Ok(())
    }

    async fn shutdown(&self) -> core_playback::Result<()> {
        self.calls.lock().unwrap().push(Call::Shutdown);
        Ok(())
    }
}

/// Factory that records every transport it hands out so tests can drive
/// their event sinks and inspect their call logs afterwards.
#[derive(Default)]
struct FakeFactory {
    created: Mutex<Vec<FakeTransport>>,
}

impl FakeFactory {
    fn transport(&self, index: usize) -> FakeTransport {
        self.created.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl TransportFactory for FakeFactory {
    async fn create(
        &self,
        sink: TransportEventSink,
    ) -> core_playback::Result<Box<dyn Transport>> {
        let transport = FakeTransport {
            calls: Arc::new(Mutex::new(Vec::new())),
            sink,
        };
        self.created.lock().unwrap().push(transport.clone());
        Ok(Box::new(transport))
    }
}

fn dj_set(id: &str, audio_url: &str) -> DjSet {
    DjSet {
        id: id.to_string(),
        title: format!("Set {id}"),
        date: NaiveDate::from_ymd_opt(2024, 11, 15).unwrap(),
        duration_secs: 3600,
        genres: vec!["House".to_string()],
        cover_url: "/covers/a.jpg".to_string(),
        audio_url: audio_url.to_string(),
        peaks: None,
    }
}

fn harness() -> (PlaybackController, Arc<FakeFactory>, EventBus) {
    let factory = Arc::new(FakeFactory::default());
    let events = EventBus::new(64);
    let controller = PlaybackController::new(factory.clone(), events.clone(), "/api/audio");
    (controller, factory, events)
}

/// Load a set and drive the transport to ready with the given duration.
async fn load_ready(
    controller: &mut PlaybackController,
    factory: &FakeFactory,
    duration_secs: u64,
) -> FakeTransport {
    controller
        .select_set(&dj_set("set-a", "https://cdn.example.com/a.mp3"))
        .await
        .unwrap();
    let transport = factory.transport(0);
    transport.emit(TransportEvent::MetadataLoaded {
        duration: Duration::from_secs(duration_secs),
    });
    controller.process_events().await;
    transport
}

#[tokio::test]
async fn ready_event_completes_loading() {
    let (mut controller, factory, _events) = harness();
    assert_eq!(controller.session().state(), PlayerState::Empty);

    load_ready(&mut controller, &factory, 3600).await;

    assert_eq!(controller.session().state(), PlayerState::Paused);
    assert!(controller.session().is_ready);
    assert_eq!(controller.session().duration, Duration::from_secs(3600));
    // The stored volume is pushed to the transport once metadata arrives.
    assert!(factory
        .transport(0)
        .calls
        .lock()
        .unwrap()
        .contains(&Call::SetVolume(DEFAULT_VOLUME)));
}

#[tokio::test]
async fn is_playing_follows_transport_acknowledgement() {
    let (mut controller, factory, _events) = harness();
    let transport = load_ready(&mut controller, &factory, 3600).await;

    // The request alone does not flip the flag.
    controller.toggle_play().await.unwrap();
    assert!(!controller.session().is_playing);
    assert!(transport.calls.lock().unwrap().contains(&Call::Play));

    transport.emit(TransportEvent::Playing);
    controller.process_events().await;
    assert_eq!(controller.session().state(), PlayerState::Playing);

    controller.toggle_play().await.unwrap();
    transport.emit(TransportEvent::Paused);
    controller.process_events().await;
    assert_eq!(controller.session().state(), PlayerState::Paused);
}

#[tokio::test]
async fn skip_clamps_at_both_ends() {
    let (mut controller, factory, _events) = harness();
    let transport = load_ready(&mut controller, &factory, 100).await;

    transport.emit(TransportEvent::Progress {
        position: Duration::from_secs(10),
    });
    controller.process_events().await;

    controller.skip(-15.0).await.unwrap();
    assert_eq!(controller.session().position, Duration::ZERO);

    transport.emit(TransportEvent::Progress {
        position: Duration::from_secs(95),
    });
    controller.process_events().await;

    controller.skip(15.0).await.unwrap();
    assert_eq!(controller.session().position, Duration::from_secs(100));

    let calls = transport.calls.lock().unwrap();
    assert!(calls.contains(&Call::Seek(Duration::ZERO)));
    assert!(calls.contains(&Call::Seek(Duration::from_secs(100))));
}

#[tokio::test]
async fn seek_to_fraction_clamps_and_scales() {
    let (mut controller, factory, _events) = harness();
    let transport = load_ready(&mut controller, &factory, 200).await;

    controller.seek_to_fraction(0.25).await.unwrap();
    assert_eq!(controller.session().position, Duration::from_secs(50));

    controller.seek_to_fraction(1.5).await.unwrap();
    assert_eq!(controller.session().position, Duration::from_secs(200));

    controller.seek_to_fraction(-0.1).await.unwrap();
    assert_eq!(controller.session().position, Duration::ZERO);

    drop(transport);
}

#[tokio::test]
async fn non_finite_seek_inputs_are_ignored() {
    let (mut controller, factory, _events) = harness();
    let transport = load_ready(&mut controller, &factory, 100).await;

    transport.emit(TransportEvent::Progress {
        position: Duration::from_secs(40),
    });
    controller.process_events().await;

    controller.skip(f64::NAN).await.unwrap();
    controller.seek_to_fraction(f64::NAN).await.unwrap();
    controller.skip(f64::INFINITY).await.unwrap();
    controller.seek_to_fraction(f64::NEG_INFINITY).await.unwrap();

    // A garbage seek from a remote surface must not kill the controller
    // either.
    let remote = controller.remote();
    remote.skip(f64::NAN);
    controller.process_pending().await.unwrap();

    assert_eq!(controller.session().position, Duration::from_secs(40));
    let seeks = transport
        .calls
        .lock()
        .unwrap()
        .iter()
        .filter(|c| matches!(c, Call::Seek(_)))
        .count();
    assert_eq!(seeks, 0);
}

#[tokio::test]
async fn non_finite_volume_is_ignored() {
    let (mut controller, factory, _events) = harness();
    load_ready(&mut controller, &factory, 100).await;

    controller.set_volume(f32::NAN).await.unwrap();

    assert_eq!(controller.session().volume, DEFAULT_VOLUME);
}

#[tokio::test]
async fn selecting_new_set_shuts_down_and_silences_old_transport() {
    let (mut controller, factory, _events) = harness();
    let first = load_ready(&mut controller, &factory, 3600).await;
    first.emit(TransportEvent::Playing);
    controller.process_events().await;
    assert_eq!(controller.session().state(), PlayerState::Playing);

    controller
        .select_set(&dj_set("set-b", "https://cdn.example.com/b.mp3"))
        .await
        .unwrap();

    let first_calls = first.calls.lock().unwrap().clone();
    assert_eq!(
        first_calls.iter().filter(|c| **c == Call::Shutdown).count(),
        1
    );
    assert_eq!(controller.session().state(), PlayerState::Loading);
    assert!(!controller.session().is_playing);

    // Late events from the torn-down transport must not disturb the new
    // session.
    first.emit(TransportEvent::Playing);
    first.emit(TransportEvent::Progress {
        position: Duration::from_secs(1234),
    });
    controller.process_events().await;
    assert_eq!(controller.session().state(), PlayerState::Loading);
    assert_eq!(controller.session().position, Duration::ZERO);
}

#[tokio::test]
async fn mute_preserves_stored_volume() {
    let (mut controller, factory, _events) = harness();
    let transport = load_ready(&mut controller, &factory, 3600).await;

    controller.set_muted(true).await.unwrap();
    controller.set_volume(0.5).await.unwrap();
    assert_eq!(controller.session().volume, 0.5);

    controller.set_muted(false).await.unwrap();

    let volumes: Vec<f32> = transport
        .calls
        .lock()
        .unwrap()
        .iter()
        .filter_map(|c| match c {
            Call::SetVolume(v) => Some(*v),
            _ => None,
        })
        .collect();
    // Ready push, mute, volume change while muted, unmute restore.
    assert_eq!(volumes, vec![DEFAULT_VOLUME, 0.0, 0.0, 0.5]);
}

#[tokio::test]
async fn volume_survives_set_switch() {
    let (mut controller, factory, _events) = harness();
    load_ready(&mut controller, &factory, 3600).await;
    controller.set_volume(0.3).await.unwrap();

    controller
        .select_set(&dj_set("set-b", "https://cdn.example.com/b.mp3"))
        .await
        .unwrap();
    let second = factory.transport(1);
    second.emit(TransportEvent::MetadataLoaded {
        duration: Duration::from_secs(1800),
    });
    controller.process_events().await;

    assert!(second
        .calls
        .lock()
        .unwrap()
        .contains(&Call::SetVolume(0.3)));
}

#[tokio::test]
async fn remote_commands_apply_on_drain() {
    let (mut controller, factory, _events) = harness();
    let transport = load_ready(&mut controller, &factory, 3600).await;
    let remote = controller.remote();

    remote.toggle_playback();
    remote.set_volume(0.6);
    controller.process_pending().await.unwrap();

    let calls = transport.calls.lock().unwrap();
    assert!(calls.contains(&Call::Play));
    assert!(calls.contains(&Call::SetVolume(0.6)));
    drop(calls);
    assert_eq!(controller.session().volume, 0.6);
}

#[tokio::test]
async fn ended_leaves_position_at_end() {
    let (mut controller, factory, _events) = harness();
    let transport = load_ready(&mut controller, &factory, 3600).await;
    transport.emit(TransportEvent::Playing);
    controller.process_events().await;

    transport.emit(TransportEvent::Ended {
        position: Duration::from_secs(3600),
    });
    controller.process_events().await;

    assert_eq!(controller.session().state(), PlayerState::Paused);
    assert_eq!(controller.session().position, Duration::from_secs(3600));
}

#[tokio::test]
async fn loading_and_ready_events_reach_subscribers() {
    let (mut controller, factory, events) = harness();
    let mut stream = events.subscribe();

    load_ready(&mut controller, &factory, 3600).await;

    let first = stream.try_recv().unwrap();
    assert!(matches!(
        first,
        CoreEvent::Player(PlayerEvent::Loading { ref set_id }) if set_id == "set-a"
    ));
    let second = stream.try_recv().unwrap();
    assert!(matches!(
        second,
        CoreEvent::Player(PlayerEvent::Ready { duration_secs, .. }) if duration_secs == 3600.0
    ));
}
