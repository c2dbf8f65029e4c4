//! The broadcast session facade.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use iris_core::{
    option, signal_channel, AudioQuality, BroadcastConfig, BroadcastPhase, Orientation,
    TalkbackState,
};
use iris_native::{BroadcastEngine, BroadcastSignal, CaptureSettings, DeviceCapabilities};

use crate::delegate::BroadcastDelegate;
use crate::error::SessionError;
use crate::talkback::TalkbackTracker;

/// State shared between the facade and its dispatcher thread.
struct Shared {
    phase: BroadcastPhase,
    config: BroadcastConfig,
    capture_started: bool,
    health: u8,
    talkback: TalkbackTracker,
    uplink_speed: f32,
    uplink_recommendation: bool,
    zoom: f32,
    preview_orientation: Orientation,
    enabled_options: HashSet<&'static str>,
    broadcast_id: Option<String>,
}

impl Shared {
    fn new(config: BroadcastConfig) -> Self {
        let preview_orientation = config.orientation;
        Self {
            phase: BroadcastPhase::Idle,
            config,
            capture_started: false,
            health: 0,
            talkback: TalkbackTracker::default(),
            uplink_speed: 0.0,
            uplink_recommendation: false,
            zoom: 1.0,
            preview_orientation,
            enabled_options: HashSet::new(),
            broadcast_id: None,
        }
    }
}

/// Facade over the native capture/ingest engine.
///
/// Lifecycle: `configure` -> `start_capture` -> `start_broadcasting` ->
/// live -> `stop_broadcasting`. No method blocks; multi-step operations
/// report completion or failure exclusively through the
/// [`BroadcastDelegate`] supplied at construction, on a single dispatcher
/// thread, in engine arrival order.
pub struct BroadcastSession {
    engine: Mutex<Option<Box<dyn BroadcastEngine>>>,
    shared: Arc<Mutex<Shared>>,
    capabilities: DeviceCapabilities,
    dispatcher: Option<JoinHandle<()>>,
}

impl BroadcastSession {
    /// Creates a session around the given engine and delegate.
    ///
    /// The delegate is held weakly: the caller keeps the owning `Arc`, and
    /// events arriving after it is dropped are discarded.
    pub fn new<E>(mut engine: E, delegate: Weak<dyn BroadcastDelegate>) -> Self
    where
        E: BroadcastEngine,
    {
        let (tx, rx) = signal_channel();
        engine.attach(tx);
        let capabilities = engine.capabilities();

        let shared = Arc::new(Mutex::new(Shared::new(BroadcastConfig::default())));
        let dispatcher = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || dispatch_loop(rx, shared, delegate))
        };

        Self {
            engine: Mutex::new(Some(Box::new(engine))),
            shared,
            capabilities,
            dispatcher: Some(dispatcher),
        }
    }

    fn with_engine<R>(&self, f: impl FnOnce(&mut dyn BroadcastEngine) -> R) -> Option<R> {
        self.engine.lock().as_mut().map(|engine| f(engine.as_mut()))
    }

    /// Replaces the whole configuration.
    ///
    /// Only valid before `start_capture`; afterwards individual setters
    /// apply, each enforcing its own mutability rule.
    pub fn configure(&self, mut config: BroadcastConfig) -> Result<(), SessionError> {
        config.validate()?;
        config.clamp_framerates();

        let mut shared = self.shared.lock();
        if shared.capture_started {
            return Err(SessionError::CaptureAlreadyStarted);
        }
        shared.preview_orientation = config.orientation;
        shared.config = config;
        Ok(())
    }

    /// Starts camera and microphone capture. Must be called exactly once,
    /// before `start_broadcasting`.
    #[instrument(name = "start_capture", skip(self))]
    pub fn start_capture(&self) -> Result<(), SessionError> {
        let settings = {
            let shared = self.shared.lock();
            if shared.capture_started {
                return Err(SessionError::AlreadyCapturing);
            }
            CaptureSettings::from_config(&shared.config)
        };

        self.with_engine(|engine| engine.start_capture(&settings))
            .transpose()?;

        let mut shared = self.shared.lock();
        shared.capture_started = true;
        shared.phase = BroadcastPhase::Capturing;
        info!("capture started");
        Ok(())
    }

    /// Connects to an ingest server and starts a new broadcast.
    ///
    /// Valid only while [`can_start`](Self::can_start) is true. The connect
    /// is asynchronous: success arrives as `broadcast_started`, failure as
    /// an `error` callback followed by a return to the Stopped phase.
    #[instrument(name = "start_broadcasting", skip(self))]
    pub fn start_broadcasting(&self) -> Result<(), SessionError> {
        let (config, previous) = {
            let mut shared = self.shared.lock();
            if !shared.phase.can_start() {
                return Err(SessionError::AlreadyBroadcasting);
            }
            if shared.config.application_id.is_empty() {
                return Err(SessionError::MissingApplicationId);
            }
            let previous = shared.phase;
            shared.phase = BroadcastPhase::Connecting;
            (shared.config.clone(), previous)
        };

        info!(title = %config.title, "connecting");
        let result = self
            .with_engine(|engine| engine.start_broadcast(&config))
            .transpose();

        if let Err(e) = result {
            self.shared.lock().phase = previous;
            return Err(e.into());
        }
        Ok(())
    }

    /// Stops the broadcast and disconnects. Valid in any state and
    /// idempotent; the `broadcast_stopped` callback may fire after this
    /// call returns.
    #[instrument(name = "stop_broadcasting", skip(self))]
    pub fn stop_broadcasting(&self) {
        let broadcasting = self.shared.lock().phase.is_broadcasting();
        if !broadcasting {
            debug!("no broadcast ongoing, stop is a no-op");
            return;
        }
        self.with_engine(|engine| engine.stop_broadcast());
    }

    /// Toggles between available cameras. Valid at any time.
    pub fn swap_camera(&self) {
        self.with_engine(|engine| engine.swap_camera());
    }

    /// Turns the LED torch on or off. Valid at any time.
    pub fn set_torch(&self, on: bool) {
        self.with_engine(|engine| engine.set_torch(on));
    }

    /// Requests a snapshot from the camera; the image arrives via the
    /// `snapshot_taken` callback.
    pub fn take_snapshot(&self) {
        self.with_engine(|engine| engine.take_snapshot());
    }

    /// Sets the zoom level, clamped to `[1.0, max_zoom]`. Ignored when the
    /// device does not support zooming.
    pub fn set_zoom(&self, zoom: f32) {
        if self.capabilities.max_zoom < 1.0 {
            debug!("zoom unsupported on this device");
            return;
        }
        let zoom = zoom.clamp(1.0, self.capabilities.max_zoom);
        self.shared.lock().zoom = zoom;
        self.with_engine(|engine| engine.set_zoom(zoom));
    }

    /// Sets the maximum and minimum capture framerate. The maximum is
    /// clamped to the accepted 24-30 range.
    pub fn set_framerate(&self, framerate: f32, min_framerate: f32) {
        let mut shared = self.shared.lock();
        shared.config.framerate = framerate;
        shared.config.min_framerate = min_framerate;
        shared.config.clamp_framerates();
    }

    /// Updates the broadcast title. Valid at any time, including while
    /// live.
    pub fn set_title(&self, title: &str) {
        let broadcasting = {
            let mut shared = self.shared.lock();
            shared.config.title = title.to_string();
            shared.phase.is_broadcasting()
        };
        if broadcasting {
            self.with_engine(|engine| engine.update_title(title));
        }
    }

    /// Updates the custom data field. Valid at any time; limited to 10 000
    /// bytes serverside.
    pub fn set_custom_data(&self, data: &str) -> Result<(), SessionError> {
        let broadcasting = {
            let mut shared = self.shared.lock();
            let mut candidate = shared.config.clone();
            candidate.custom_data = data.to_string();
            candidate.validate()?;
            shared.config = candidate;
            shared.phase.is_broadcasting()
        };
        if broadcasting {
            self.with_engine(|engine| engine.update_custom_data(data));
        }
        Ok(())
    }

    /// Sets the author field. Must be set before starting the broadcast.
    pub fn set_author(&self, author: &str) -> Result<(), SessionError> {
        self.set_prestart_field("author", |config| {
            config.author = author.to_string();
        })
    }

    /// Changes the capture orientation. During a broadcast only a 180
    /// degree flip of the current orientation is accepted.
    pub fn set_orientation(&self, orientation: Orientation) -> Result<(), SessionError> {
        {
            let mut shared = self.shared.lock();
            if shared.phase.is_broadcasting()
                && !shared.config.orientation.is_flip_of(orientation)
            {
                return Err(SessionError::OrientationLocked);
            }
            shared.config.orientation = orientation;
            shared.preview_orientation = orientation;
        }
        self.with_engine(|engine| engine.set_orientation(orientation));
        Ok(())
    }

    /// Sets the audio quality preset. Immutable during a broadcast.
    pub fn set_audio_quality(&self, quality: AudioQuality) -> Result<(), SessionError> {
        self.set_prestart_field("audio quality", |config| config.audio_quality = quality)
    }

    /// Keep the broadcast available on demand after it ends. Immutable
    /// during a broadcast.
    pub fn set_save_on_server(&self, enabled: bool) -> Result<(), SessionError> {
        self.set_prestart_field("save on server", |config| config.save_on_server = enabled)
    }

    /// Also record the broadcast to a local file. Immutable during a
    /// broadcast.
    pub fn set_save_locally(&self, enabled: bool) -> Result<(), SessionError> {
        self.set_prestart_field("save locally", |config| config.save_locally = enabled)
    }

    /// Signal the server that talkback requests are accepted. Immutable
    /// during a broadcast.
    pub fn set_talkback(&self, enabled: bool) -> Result<(), SessionError> {
        self.set_prestart_field("talkback", |config| config.talkback = enabled)
    }

    /// Mix talkback audio into the recorded and broadcast signal.
    /// Immutable during a broadcast.
    pub fn set_talkback_mix(&self, enabled: bool) -> Result<(), SessionError> {
        self.set_prestart_field("talkback mix", |config| config.talkback_mix = enabled)
    }

    /// Continuously send device position during the broadcast. Immutable
    /// during a broadcast.
    pub fn set_send_position(&self, enabled: bool) -> Result<(), SessionError> {
        self.set_prestart_field("send position", |config| config.send_position = enabled)
    }

    /// List the broadcast as private. Immutable during a broadcast.
    pub fn set_private_mode(&self, enabled: bool) -> Result<(), SessionError> {
        self.set_prestart_field("private mode", |config| config.private_mode = enabled)
    }

    /// Path for the local recording; None picks a unique name in the
    /// platform temp directory. Immutable during a broadcast.
    pub fn set_local_filename(&self, path: Option<PathBuf>) -> Result<(), SessionError> {
        self.set_prestart_field("local filename", |config| config.local_filename = path)
    }

    /// Max size for any broadcast dimension; 0 means unlimited. Immutable
    /// during a broadcast.
    pub fn set_max_broadcast_dimension(&self, dimension: u32) -> Result<(), SessionError> {
        self.set_prestart_field("max broadcast dimension", |config| {
            config.max_broadcast_dimension = dimension
        })
    }

    fn set_prestart_field(
        &self,
        field: &'static str,
        apply: impl FnOnce(&mut BroadcastConfig),
    ) -> Result<(), SessionError> {
        let mut shared = self.shared.lock();
        if shared.phase.is_broadcasting() {
            return Err(SessionError::LockedWhileBroadcasting { field });
        }
        apply(&mut shared.config);
        Ok(())
    }

    /// Accepts a pending talkback request. Unknown ids are ignored.
    ///
    /// The Accepted and Playing transitions arrive from the native side
    /// through `talkback_state_changed`.
    pub fn accept_talkback_request(&self, talkback_id: i32) {
        {
            let mut shared = self.shared.lock();
            if !shared.talkback.is_pending(talkback_id) {
                debug!(talkback_id, "ignoring accept for unknown talkback id");
                return;
            }
            shared.talkback.remove_pending(talkback_id);
        }
        self.with_engine(|engine| engine.accept_talkback(talkback_id));
    }

    /// Declines a pending talkback request. Unknown ids are ignored.
    ///
    /// The resulting state change (back to Idle when no request remains)
    /// is confirmed by the native side through `talkback_state_changed`.
    pub fn decline_talkback_request(&self, talkback_id: i32) {
        {
            let mut shared = self.shared.lock();
            if !shared.talkback.is_pending(talkback_id) {
                debug!(talkback_id, "ignoring decline for unknown talkback id");
                return;
            }
            shared.talkback.remove_pending(talkback_id);
        }
        self.with_engine(|engine| engine.decline_talkback(talkback_id));
    }

    /// Ends an ongoing talkback session.
    pub fn end_talkback(&self) {
        self.with_engine(|engine| engine.end_talkback());
    }

    /// Starts an uplink test. Requires a non-empty application id; the
    /// result arrives via `uplink_test_complete` and is cached on the
    /// session. The recommendation never gates `start_broadcasting`.
    pub fn start_linktest(&self) -> Result<(), SessionError> {
        if self.shared.lock().config.application_id.is_empty() {
            return Err(SessionError::MissingApplicationId);
        }
        self.with_engine(|engine| engine.start_linktest());
        Ok(())
    }

    /// Toggles the visibility of a named option in the native settings
    /// view. Unknown names are accepted but have no effect.
    pub fn enable_option(&self, name: &str, enabled: bool) {
        let Some(known) = option::KNOWN_OPTIONS.iter().copied().find(|n| *n == name) else {
            debug!(name, "unknown settings option accepted without effect");
            return;
        };
        let mut shared = self.shared.lock();
        if enabled {
            shared.enabled_options.insert(known);
        } else {
            shared.enabled_options.remove(known);
        }
    }

    /// Sets the video quality preset. Returns true only for the automatic
    /// preset while no broadcast is ongoing, mirroring the native method.
    pub fn set_video_quality_preset(&self, preset: &str) -> bool {
        preset == option::SESSION_PRESET_AUTO && !self.shared.lock().phase.is_broadcasting()
    }

    // Read accessors.

    /// Current lifecycle phase.
    pub fn phase(&self) -> BroadcastPhase {
        self.shared.lock().phase
    }

    /// True if `start_broadcasting` may be called: capture has started and
    /// the session is neither connecting nor live.
    pub fn can_start(&self) -> bool {
        self.shared.lock().phase.can_start()
    }

    /// Stream health, 0-100. Always 0 when not live.
    pub fn health(&self) -> u8 {
        self.shared.lock().health
    }

    /// Current talkback state.
    pub fn talkback_state(&self) -> TalkbackState {
        self.shared.lock().talkback.state()
    }

    /// Result of the last uplink test in bytes per second; 0 before any
    /// test.
    pub fn uplink_speed(&self) -> f32 {
        self.shared.lock().uplink_speed
    }

    /// Recommendation of the last uplink test; false before any test.
    pub fn uplink_recommendation(&self) -> bool {
        self.shared.lock().uplink_recommendation
    }

    /// Current zoom level.
    pub fn zoom(&self) -> f32 {
        self.shared.lock().zoom
    }

    /// Highest accepted zoom value; negative when zooming is unsupported.
    pub fn max_zoom(&self) -> f32 {
        self.capabilities.max_zoom
    }

    /// Whether the device has an LED torch.
    pub fn has_torch(&self) -> bool {
        self.capabilities.has_torch
    }

    /// Whether the device has a front-facing camera.
    pub fn has_front_camera(&self) -> bool {
        self.capabilities.has_front_camera
    }

    /// Maximum capture framerate.
    pub fn framerate(&self) -> f32 {
        self.shared.lock().config.framerate
    }

    /// Minimum capture framerate.
    pub fn min_framerate(&self) -> f32 {
        self.shared.lock().config.min_framerate
    }

    /// Capture orientation.
    pub fn orientation(&self) -> Orientation {
        self.shared.lock().config.orientation
    }

    /// Orientation of the preview UI; follows `set_orientation`.
    pub fn preview_orientation(&self) -> Orientation {
        self.shared.lock().preview_orientation
    }

    /// Server-assigned id of the current or last broadcast.
    pub fn broadcast_id(&self) -> Option<String> {
        self.shared.lock().broadcast_id.clone()
    }

    /// Names of the settings options currently visible.
    pub fn enabled_options(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.shared.lock().enabled_options.iter().copied().collect();
        names.sort_unstable();
        names
    }

    /// A copy of the current configuration.
    pub fn config(&self) -> BroadcastConfig {
        self.shared.lock().config.clone()
    }
}

impl Drop for BroadcastSession {
    fn drop(&mut self) {
        // Stop and drop the engine first so its signal sender closes and
        // the dispatcher drains out.
        let engine = self.engine.lock().take();
        if let Some(mut engine) = engine {
            engine.stop_broadcast();
        }
        if let Some(handle) = self.dispatcher.take() {
            let _ = handle.join();
        }
    }
}

/// Pending delegate invocation computed under the shared lock.
enum Callback {
    Started,
    Stopped,
    Error(iris_core::ErrorCode, String),
    Uplink(f32, bool),
    HideSettings,
    Chat(String),
    Recording(PathBuf),
    Health(u8),
    CurrentViewers(u32),
    TotalViewers(u32),
    TalkbackRequest(String, String, i32),
    TalkbackState(TalkbackState),
    BroadcastId(String),
    Snapshot(iris_core::Snapshot),
}

/// Dispatcher loop: the single designated context for delegate callbacks.
///
/// State is updated under the shared lock, then the lock is released before
/// the delegate runs so a callback may call back into the session.
fn dispatch_loop(
    rx: Receiver<BroadcastSignal>,
    shared: Arc<Mutex<Shared>>,
    delegate: Weak<dyn BroadcastDelegate>,
) {
    for signal in rx.iter() {
        let mut callbacks = Vec::new();
        {
            let mut state = shared.lock();
            apply_signal(&mut state, signal, &mut callbacks);
        }
        for callback in callbacks {
            deliver(&delegate, callback);
        }
    }
    debug!("broadcast dispatcher exiting");
}

fn apply_signal(state: &mut Shared, signal: BroadcastSignal, out: &mut Vec<Callback>) {
    match signal {
        BroadcastSignal::Connected => {
            if state.phase == BroadcastPhase::Connecting {
                state.phase = BroadcastPhase::Live;
                out.push(Callback::Started);
            } else {
                warn!(phase = state.phase.name(), "unexpected connect signal");
            }
        }
        BroadcastSignal::BroadcastId(id) => {
            state.broadcast_id = Some(id.clone());
            out.push(Callback::BroadcastId(id));
        }
        BroadcastSignal::ConnectFailed { code, message } => {
            let was_live = state.phase == BroadcastPhase::Live;
            if state.phase.is_broadcasting() {
                state.phase = BroadcastPhase::Stopped;
            }
            state.health = 0;
            out.push(Callback::Error(code, message));
            // A fatal error while live ends the broadcast; a failed
            // connect never started one, so no Stopped there.
            if was_live {
                out.push(Callback::Stopped);
            }
        }
        BroadcastSignal::Disconnected => {
            // Suppressed unless a broadcast was actually ongoing, which
            // keeps double stops down to a single Stopped callback.
            if state.phase.is_broadcasting() {
                state.phase = BroadcastPhase::Stopped;
                state.health = 0;
                out.push(Callback::Stopped);
            }
        }
        BroadcastSignal::Health(health) => {
            if state.phase == BroadcastPhase::Live {
                state.health = health.min(100);
                out.push(Callback::Health(state.health));
            }
        }
        BroadcastSignal::ChatMessage(message) => out.push(Callback::Chat(message)),
        BroadcastSignal::CurrentViewers(n) => out.push(Callback::CurrentViewers(n)),
        BroadcastSignal::TotalViewers(n) => out.push(Callback::TotalViewers(n)),
        BroadcastSignal::TalkbackRequest {
            request,
            caller,
            talkback_id,
        } => {
            let changed = state.talkback.request(talkback_id);
            out.push(Callback::TalkbackRequest(request, caller, talkback_id));
            if let Some(new_state) = changed {
                out.push(Callback::TalkbackState(new_state));
            }
        }
        BroadcastSignal::TalkbackState(talkback_state) => {
            if let Some(new_state) = state.talkback.apply(talkback_state) {
                out.push(Callback::TalkbackState(new_state));
            }
        }
        BroadcastSignal::SnapshotReady(snapshot) => out.push(Callback::Snapshot(snapshot)),
        BroadcastSignal::LinktestComplete {
            speed_bytes_per_sec,
            should_broadcast,
        } => {
            state.uplink_speed = speed_bytes_per_sec;
            state.uplink_recommendation = should_broadcast;
            out.push(Callback::Uplink(speed_bytes_per_sec, should_broadcast));
        }
        BroadcastSignal::RecordingComplete(path) => out.push(Callback::Recording(path)),
        BroadcastSignal::HideSettings => out.push(Callback::HideSettings),
    }
}

fn deliver(delegate: &Weak<dyn BroadcastDelegate>, callback: Callback) {
    let Some(delegate) = delegate.upgrade() else {
        debug!("delegate gone, dropping event");
        return;
    };
    match callback {
        Callback::Started => delegate.broadcast_started(),
        Callback::Stopped => delegate.broadcast_stopped(),
        Callback::Error(code, message) => delegate.error(code, &message),
        Callback::Uplink(speed, recommend) => delegate.uplink_test_complete(speed, recommend),
        Callback::HideSettings => delegate.hide_settings_view(),
        Callback::Chat(message) => delegate.chat_message_received(&message),
        Callback::Recording(path) => delegate.recording_complete(&path),
        Callback::Health(health) => delegate.health_updated(health),
        Callback::CurrentViewers(n) => delegate.current_viewer_count_updated(n),
        Callback::TotalViewers(n) => delegate.total_viewer_count_updated(n),
        Callback::TalkbackRequest(request, caller, id) => {
            delegate.talkback_request(&request, &caller, id)
        }
        Callback::TalkbackState(talkback_state) => {
            delegate.talkback_state_changed(talkback_state)
        }
        Callback::BroadcastId(id) => delegate.broadcast_id_received(&id),
        Callback::Snapshot(snapshot) => delegate.snapshot_taken(snapshot),
    }
}
