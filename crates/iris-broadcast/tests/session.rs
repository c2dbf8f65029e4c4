//! End-to-end tests of the broadcast session facade against a scriptable
//! mock engine. Signals are injected by hand through the attached channel
//! and delegate callbacks are collected over a channel, never with sleeps.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use iris_broadcast::{BroadcastDelegate, BroadcastSession, SessionError};
use iris_core::{BroadcastConfig, BroadcastPhase, ErrorCode, Orientation, Snapshot, TalkbackState};
use iris_native::sim::SimulatedBroadcastEngine;
use iris_native::{BroadcastEngine, BroadcastSignal, CaptureSettings, DeviceCapabilities, EngineError};

/// Commands the mock engine has been asked to run, for assertions.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    StartCapture,
    StartBroadcast,
    StopBroadcast,
    AcceptTalkback(i32),
    DeclineTalkback(i32),
    EndTalkback,
    Linktest,
    SetZoom(f32),
    SetOrientation(Orientation),
    UpdateTitle(String),
}

#[derive(Clone, Default)]
struct MockHandle {
    signals: Arc<Mutex<Option<Sender<BroadcastSignal>>>>,
    commands: Arc<Mutex<Vec<Command>>>,
}

impl MockHandle {
    fn send(&self, signal: BroadcastSignal) {
        let guard = self.signals.lock().unwrap();
        guard.as_ref().expect("engine not attached").send(signal).unwrap();
    }

    fn commands(&self) -> Vec<Command> {
        self.commands.lock().unwrap().clone()
    }
}

struct MockEngine {
    handle: MockHandle,
    capabilities: DeviceCapabilities,
}

impl MockEngine {
    fn new() -> (Self, MockHandle) {
        let handle = MockHandle::default();
        let engine = Self {
            handle: handle.clone(),
            capabilities: DeviceCapabilities::default(),
        };
        (engine, handle)
    }

    fn record(&self, command: Command) {
        self.handle.commands.lock().unwrap().push(command);
    }
}

impl Drop for MockEngine {
    // Close the signal channel so the dispatcher (joined in the session's
    // Drop) drains out even though the test still holds the handle.
    fn drop(&mut self) {
        self.handle.signals.lock().unwrap().take();
    }
}

impl BroadcastEngine for MockEngine {
    fn attach(&mut self, signals: Sender<BroadcastSignal>) {
        *self.handle.signals.lock().unwrap() = Some(signals);
    }

    fn start_capture(&mut self, _settings: &CaptureSettings) -> Result<(), EngineError> {
        self.record(Command::StartCapture);
        Ok(())
    }

    fn start_broadcast(&mut self, _config: &BroadcastConfig) -> Result<(), EngineError> {
        self.record(Command::StartBroadcast);
        Ok(())
    }

    fn stop_broadcast(&mut self) {
        self.record(Command::StopBroadcast);
    }

    fn swap_camera(&mut self) {}

    fn set_torch(&mut self, _on: bool) {}

    fn set_zoom(&mut self, zoom: f32) {
        self.record(Command::SetZoom(zoom));
    }

    fn take_snapshot(&mut self) {}

    fn accept_talkback(&mut self, talkback_id: i32) {
        self.record(Command::AcceptTalkback(talkback_id));
    }

    fn decline_talkback(&mut self, talkback_id: i32) {
        self.record(Command::DeclineTalkback(talkback_id));
    }

    fn end_talkback(&mut self) {
        self.record(Command::EndTalkback);
    }

    fn start_linktest(&mut self) {
        self.record(Command::Linktest);
    }

    fn update_title(&mut self, title: &str) {
        self.record(Command::UpdateTitle(title.to_string()));
    }

    fn update_custom_data(&mut self, _data: &str) {}

    fn set_orientation(&mut self, orientation: Orientation) {
        self.record(Command::SetOrientation(orientation));
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }
}

/// Delegate callbacks, forwarded over a channel for the test to drain.
#[derive(Debug, Clone, PartialEq)]
enum Event {
    Started,
    Stopped,
    Error(ErrorCode, String),
    Uplink(f32, bool),
    Health(u8),
    TalkbackRequest(String, String, i32),
    TalkbackState(TalkbackState),
    BroadcastId(String),
    Recording(PathBuf),
    Chat(String),
    SnapshotReady(Snapshot),
}

struct Recorder {
    events: Sender<Event>,
}

impl Recorder {
    fn new() -> (Arc<Self>, Receiver<Event>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Arc::new(Self { events: tx }), rx)
    }
}

impl BroadcastDelegate for Recorder {
    fn broadcast_started(&self) {
        self.events.send(Event::Started).unwrap();
    }

    fn broadcast_stopped(&self) {
        self.events.send(Event::Stopped).unwrap();
    }

    fn error(&self, code: ErrorCode, message: &str) {
        self.events.send(Event::Error(code, message.to_string())).unwrap();
    }

    fn uplink_test_complete(&self, speed: f32, recommendation: bool) {
        self.events.send(Event::Uplink(speed, recommendation)).unwrap();
    }

    fn chat_message_received(&self, message: &str) {
        self.events.send(Event::Chat(message.to_string())).unwrap();
    }

    fn recording_complete(&self, path: &std::path::Path) {
        self.events.send(Event::Recording(path.to_path_buf())).unwrap();
    }

    fn health_updated(&self, health: u8) {
        self.events.send(Event::Health(health)).unwrap();
    }

    fn talkback_request(&self, request: &str, caller: &str, talkback_id: i32) {
        self.events
            .send(Event::TalkbackRequest(
                request.to_string(),
                caller.to_string(),
                talkback_id,
            ))
            .unwrap();
    }

    fn talkback_state_changed(&self, state: TalkbackState) {
        self.events.send(Event::TalkbackState(state)).unwrap();
    }

    fn broadcast_id_received(&self, broadcast_id: &str) {
        self.events.send(Event::BroadcastId(broadcast_id.to_string())).unwrap();
    }

    fn snapshot_taken(&self, snapshot: Snapshot) {
        self.events.send(Event::SnapshotReady(snapshot)).unwrap();
    }
}

const TIMEOUT: Duration = Duration::from_secs(2);

fn recv(rx: &Receiver<Event>) -> Event {
    rx.recv_timeout(TIMEOUT).expect("timed out waiting for callback")
}

fn configured() -> BroadcastConfig {
    BroadcastConfig {
        application_id: "app-id".to_string(),
        title: "test broadcast".to_string(),
        ..BroadcastConfig::default()
    }
}

/// Builds a session that has already reached the Capturing phase.
fn capturing_session(
) -> (BroadcastSession, MockHandle, Arc<Recorder>, Receiver<Event>) {
    let (engine, handle) = MockEngine::new();
    let (recorder, rx) = Recorder::new();
    let sink: Arc<dyn BroadcastDelegate> = recorder.clone();
    let session = BroadcastSession::new(engine, Arc::downgrade(&sink));
    session.configure(configured()).unwrap();
    session.start_capture().unwrap();
    (session, handle, recorder, rx)
}

/// Drives the session to Live through the injected Connected signal.
fn go_live(session: &BroadcastSession, handle: &MockHandle, rx: &Receiver<Event>) {
    session.start_broadcasting().unwrap();
    handle.send(BroadcastSignal::Connected);
    assert_eq!(recv(rx), Event::Started);
    assert_eq!(session.phase(), BroadcastPhase::Live);
}

#[test]
fn test_lifecycle_capture_connect_live_stop() {
    let (session, handle, _recorder, rx) = capturing_session();
    assert_eq!(session.phase(), BroadcastPhase::Capturing);
    assert!(session.can_start());

    session.start_broadcasting().unwrap();
    assert_eq!(session.phase(), BroadcastPhase::Connecting);
    assert!(!session.can_start());

    handle.send(BroadcastSignal::BroadcastId("b123".to_string()));
    handle.send(BroadcastSignal::Connected);
    assert_eq!(recv(&rx), Event::BroadcastId("b123".to_string()));
    assert_eq!(recv(&rx), Event::Started);
    assert_eq!(session.broadcast_id().as_deref(), Some("b123"));

    session.stop_broadcasting();
    assert!(handle.commands().contains(&Command::StopBroadcast));
    handle.send(BroadcastSignal::Disconnected);
    assert_eq!(recv(&rx), Event::Stopped);
    assert_eq!(session.phase(), BroadcastPhase::Stopped);
    assert!(session.can_start());
}

#[test]
fn test_start_rejected_while_connecting_or_live() {
    let (session, handle, _recorder, rx) = capturing_session();
    session.start_broadcasting().unwrap();
    assert!(matches!(
        session.start_broadcasting(),
        Err(SessionError::AlreadyBroadcasting)
    ));

    handle.send(BroadcastSignal::Connected);
    assert_eq!(recv(&rx), Event::Started);
    assert!(matches!(
        session.start_broadcasting(),
        Err(SessionError::AlreadyBroadcasting)
    ));
    // Exactly one connect reached the engine.
    let starts = handle
        .commands()
        .iter()
        .filter(|c| **c == Command::StartBroadcast)
        .count();
    assert_eq!(starts, 1);
}

#[test]
fn test_start_requires_capture_and_application_id() {
    let (engine, _handle) = MockEngine::new();
    let (recorder, _rx) = Recorder::new();
    let sink: Arc<dyn BroadcastDelegate> = recorder.clone();
    let session = BroadcastSession::new(engine, Arc::downgrade(&sink));

    // Idle: capture has not started yet.
    assert!(!session.can_start());
    assert!(matches!(
        session.start_broadcasting(),
        Err(SessionError::AlreadyBroadcasting)
    ));

    session.start_capture().unwrap();
    assert!(matches!(
        session.start_broadcasting(),
        Err(SessionError::MissingApplicationId)
    ));
}

#[test]
fn test_double_stop_single_callback() {
    let (session, handle, _recorder, rx) = capturing_session();
    go_live(&session, &handle, &rx);

    session.stop_broadcasting();
    handle.send(BroadcastSignal::Disconnected);
    assert_eq!(recv(&rx), Event::Stopped);

    // Second stop is a no-op and a stray disconnect is suppressed.
    session.stop_broadcasting();
    handle.send(BroadcastSignal::Disconnected);
    handle.send(BroadcastSignal::ChatMessage("fence".to_string()));
    assert_eq!(recv(&rx), Event::Chat("fence".to_string()));

    let stops = handle
        .commands()
        .iter()
        .filter(|c| **c == Command::StopBroadcast)
        .count();
    assert_eq!(stops, 1);
}

#[test]
fn test_connect_failure_returns_to_stopped() {
    let (session, handle, _recorder, rx) = capturing_session();
    session.start_broadcasting().unwrap();
    handle.send(BroadcastSignal::ConnectFailed {
        code: ErrorCode::ConnectionLost,
        message: "connection refused".to_string(),
    });
    assert_eq!(
        recv(&rx),
        Event::Error(ErrorCode::ConnectionLost, "connection refused".to_string())
    );
    assert_eq!(session.phase(), BroadcastPhase::Stopped);
    assert!(session.can_start());
}

#[test]
fn test_mid_broadcast_error_stops() {
    let (session, handle, _recorder, rx) = capturing_session();
    go_live(&session, &handle, &rx);

    handle.send(BroadcastSignal::ConnectFailed {
        code: ErrorCode::ConnectionLost,
        message: "uplink lost".to_string(),
    });
    assert_eq!(
        recv(&rx),
        Event::Error(ErrorCode::ConnectionLost, "uplink lost".to_string())
    );
    assert_eq!(recv(&rx), Event::Stopped);
    assert_eq!(session.phase(), BroadcastPhase::Stopped);
    assert_eq!(session.health(), 0);
    assert!(session.can_start());

    // A trailing disconnect from the engine is suppressed.
    handle.send(BroadcastSignal::Disconnected);
    handle.send(BroadcastSignal::ChatMessage("fence".to_string()));
    assert_eq!(recv(&rx), Event::Chat("fence".to_string()));
}

#[test]
fn test_talkback_accept_flow() {
    let (session, handle, _recorder, rx) = capturing_session();
    go_live(&session, &handle, &rx);

    handle.send(BroadcastSignal::TalkbackRequest {
        request: "join me".to_string(),
        caller: "studio".to_string(),
        talkback_id: 7,
    });
    assert_eq!(
        recv(&rx),
        Event::TalkbackRequest("join me".to_string(), "studio".to_string(), 7)
    );
    assert_eq!(recv(&rx), Event::TalkbackState(TalkbackState::NeedsAccept));
    assert_eq!(session.talkback_state(), TalkbackState::NeedsAccept);

    session.accept_talkback_request(7);
    assert!(handle.commands().contains(&Command::AcceptTalkback(7)));

    handle.send(BroadcastSignal::TalkbackState(TalkbackState::Accepted));
    handle.send(BroadcastSignal::TalkbackState(TalkbackState::Playing));
    assert_eq!(recv(&rx), Event::TalkbackState(TalkbackState::Accepted));
    assert_eq!(recv(&rx), Event::TalkbackState(TalkbackState::Playing));
    assert_eq!(session.talkback_state(), TalkbackState::Playing);

    session.end_talkback();
    handle.send(BroadcastSignal::TalkbackState(TalkbackState::Idle));
    assert_eq!(recv(&rx), Event::TalkbackState(TalkbackState::Idle));
}

#[test]
fn test_talkback_decline_and_unknown_id() {
    let (session, handle, _recorder, rx) = capturing_session();
    go_live(&session, &handle, &rx);

    handle.send(BroadcastSignal::TalkbackRequest {
        request: "q".to_string(),
        caller: "studio".to_string(),
        talkback_id: 3,
    });
    assert_eq!(recv(&rx), Event::TalkbackRequest("q".to_string(), "studio".to_string(), 3));
    assert_eq!(recv(&rx), Event::TalkbackState(TalkbackState::NeedsAccept));

    // Unknown ids never reach the engine.
    session.accept_talkback_request(99);
    session.decline_talkback_request(42);
    assert!(!handle.commands().contains(&Command::AcceptTalkback(99)));
    assert!(!handle.commands().contains(&Command::DeclineTalkback(42)));

    session.decline_talkback_request(3);
    assert!(handle.commands().contains(&Command::DeclineTalkback(3)));
    handle.send(BroadcastSignal::TalkbackState(TalkbackState::Idle));
    assert_eq!(recv(&rx), Event::TalkbackState(TalkbackState::Idle));
    assert_eq!(session.talkback_state(), TalkbackState::Idle);

    // Declining again is a silent no-op.
    session.decline_talkback_request(3);
    let declines = handle
        .commands()
        .iter()
        .filter(|c| **c == Command::DeclineTalkback(3))
        .count();
    assert_eq!(declines, 1);
}

#[test]
fn test_health_only_reported_while_live() {
    let (session, handle, _recorder, rx) = capturing_session();

    // Not live yet: health signals are dropped.
    handle.send(BroadcastSignal::Health(80));
    go_live(&session, &handle, &rx);

    handle.send(BroadcastSignal::Health(90));
    handle.send(BroadcastSignal::Health(250));
    assert_eq!(recv(&rx), Event::Health(90));
    assert_eq!(recv(&rx), Event::Health(100));
    assert_eq!(session.health(), 100);

    session.stop_broadcasting();
    handle.send(BroadcastSignal::Disconnected);
    assert_eq!(recv(&rx), Event::Stopped);
    assert_eq!(session.health(), 0);
}

#[test]
fn test_linktest_requires_application_id_and_caches_result() {
    let (engine, handle) = MockEngine::new();
    let (recorder, rx) = Recorder::new();
    let sink: Arc<dyn BroadcastDelegate> = recorder.clone();
    let session = BroadcastSession::new(engine, Arc::downgrade(&sink));

    assert!(matches!(
        session.start_linktest(),
        Err(SessionError::MissingApplicationId)
    ));

    session.configure(configured()).unwrap();
    session.start_linktest().unwrap();
    assert!(handle.commands().contains(&Command::Linktest));

    handle.send(BroadcastSignal::LinktestComplete {
        speed_bytes_per_sec: 512_000.0,
        should_broadcast: true,
    });
    assert_eq!(recv(&rx), Event::Uplink(512_000.0, true));
    assert_eq!(session.uplink_speed(), 512_000.0);
    assert!(session.uplink_recommendation());

    // A poor recommendation never gates starting.
    handle.send(BroadcastSignal::LinktestComplete {
        speed_bytes_per_sec: 1_000.0,
        should_broadcast: false,
    });
    assert_eq!(recv(&rx), Event::Uplink(1_000.0, false));
    session.start_capture().unwrap();
    session.start_broadcasting().unwrap();
}

#[test]
fn test_configure_rejected_after_capture() {
    let (session, _handle, _recorder, _rx) = capturing_session();
    assert!(matches!(
        session.configure(configured()),
        Err(SessionError::CaptureAlreadyStarted)
    ));
    assert!(matches!(
        session.start_capture(),
        Err(SessionError::AlreadyCapturing)
    ));
}

#[test]
fn test_prestart_fields_locked_while_broadcasting() {
    let (session, handle, _recorder, rx) = capturing_session();
    session.set_author("alice").unwrap();
    session.set_save_locally(true).unwrap();
    go_live(&session, &handle, &rx);

    assert!(matches!(
        session.set_author("bob"),
        Err(SessionError::LockedWhileBroadcasting { field: "author" })
    ));
    assert!(matches!(
        session.set_talkback(true),
        Err(SessionError::LockedWhileBroadcasting { .. })
    ));
    assert_eq!(session.config().author, "alice");

    // Title and custom data stay mutable and reach the engine live.
    session.set_title("updated");
    assert!(handle
        .commands()
        .contains(&Command::UpdateTitle("updated".to_string())));
}

#[test]
fn test_orientation_flip_only_while_broadcasting() {
    let (session, handle, _recorder, rx) = capturing_session();
    session.set_orientation(Orientation::LandscapeLeft).unwrap();
    go_live(&session, &handle, &rx);

    assert!(matches!(
        session.set_orientation(Orientation::Portrait),
        Err(SessionError::OrientationLocked)
    ));
    session.set_orientation(Orientation::LandscapeRight).unwrap();
    assert_eq!(session.orientation(), Orientation::LandscapeRight);
    assert_eq!(session.preview_orientation(), Orientation::LandscapeRight);
    assert!(handle
        .commands()
        .contains(&Command::SetOrientation(Orientation::LandscapeRight)));
}

#[test]
fn test_zoom_and_framerate_clamping() {
    let (session, handle, _recorder, _rx) = capturing_session();

    session.set_zoom(100.0);
    assert_eq!(session.zoom(), session.max_zoom());
    session.set_zoom(0.1);
    assert_eq!(session.zoom(), 1.0);
    assert!(handle.commands().contains(&Command::SetZoom(1.0)));

    session.set_framerate(60.0, 5.0);
    assert_eq!(session.framerate(), 30.0);
    session.set_framerate(10.0, 5.0);
    assert_eq!(session.framerate(), 24.0);
}

#[test]
fn test_custom_data_size_limit() {
    let (session, _handle, _recorder, _rx) = capturing_session();
    session.set_custom_data("small payload").unwrap();
    let oversized = "x".repeat(10_001);
    assert!(session.set_custom_data(&oversized).is_err());
    assert_eq!(session.config().custom_data, "small payload");
}

#[test]
fn test_enable_option_known_and_unknown() {
    let (session, _handle, _recorder, _rx) = capturing_session();
    session.enable_option("talkback", true);
    session.enable_option("saveLocally", true);
    session.enable_option("definitely-not-an-option", true);
    assert_eq!(session.enabled_options(), vec!["saveLocally", "talkback"]);

    session.enable_option("talkback", false);
    assert_eq!(session.enabled_options(), vec!["saveLocally"]);
}

#[test]
fn test_video_quality_preset() {
    let (session, handle, _recorder, rx) = capturing_session();
    assert!(session.set_video_quality_preset("auto"));
    assert!(!session.set_video_quality_preset("hd1080"));
    go_live(&session, &handle, &rx);
    assert!(!session.set_video_quality_preset("auto"));
}

#[test]
fn test_recording_complete_path_forwarded() {
    let (session, handle, _recorder, rx) = capturing_session();
    go_live(&session, &handle, &rx);
    session.stop_broadcasting();
    handle.send(BroadcastSignal::Disconnected);
    handle.send(BroadcastSignal::RecordingComplete(PathBuf::from(
        "/tmp/rec.mp4",
    )));
    assert_eq!(recv(&rx), Event::Stopped);
    assert_eq!(recv(&rx), Event::Recording(PathBuf::from("/tmp/rec.mp4")));
}

#[test]
fn test_snapshot_via_simulated_engine() {
    let engine = SimulatedBroadcastEngine::new();
    let (recorder, rx) = Recorder::new();
    let sink: Arc<dyn BroadcastDelegate> = recorder.clone();
    let session = BroadcastSession::new(engine, Arc::downgrade(&sink));
    session.configure(configured()).unwrap();
    session.start_capture().unwrap();

    session.take_snapshot();
    match recv(&rx) {
        Event::SnapshotReady(snapshot) => {
            assert_eq!(snapshot.width, 16);
            assert_eq!(snapshot.height, 9);
            assert!(!snapshot.data.is_empty());
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn test_dropped_delegate_discards_events() {
    let (session, handle, recorder, rx) = capturing_session();
    go_live(&session, &handle, &rx);
    drop(rx);
    drop(recorder);

    // Nothing to observe the events, but state keeps tracking and no
    // callback panics the dispatcher.
    handle.send(BroadcastSignal::Health(42));
    session.stop_broadcasting();
    handle.send(BroadcastSignal::Disconnected);

    // Drop joins the dispatcher; a hang here would fail the test run.
    drop(session);
}
