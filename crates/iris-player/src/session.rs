//! The playback session facade.

use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use iris_core::{signal_channel, BroadcastStateFilter, PlayerStatus, VideoScaleMode};
use iris_native::{LoadRequest, PlaybackEngine, PlaybackSignal};

use crate::delegate::PlayerDelegate;
use crate::error::PlayerError;

/// State shared between the facade and its dispatcher thread.
struct Shared {
    status: PlayerStatus,
    resource_uri: Option<String>,
    application_id: String,
    required_state: BroadcastStateFilter,
    timeshift: bool,
    live: bool,
    duration: Option<f64>,
    seekable: Option<(f64, f64)>,
    position: f64,
    volume: f32,
    scale_mode: VideoScaleMode,
}

impl Default for Shared {
    fn default() -> Self {
        Self {
            status: PlayerStatus::Stopped,
            resource_uri: None,
            application_id: String::new(),
            required_state: BroadcastStateFilter::Any,
            timeshift: false,
            live: false,
            duration: None,
            seekable: None,
            position: 0.0,
            volume: 1.0,
            scale_mode: VideoScaleMode::AspectFit,
        }
    }
}

/// Facade over the native playback engine.
///
/// Status machine: Stopped -> Loading -> Playing <-> Paused -> Stopped.
/// No method blocks; load success, failure and progress report exclusively
/// through the [`PlayerDelegate`] supplied at construction, on a single
/// dispatcher thread, in engine arrival order.
pub struct PlaybackSession {
    engine: Mutex<Option<Box<dyn PlaybackEngine>>>,
    shared: Arc<Mutex<Shared>>,
    dispatcher: Option<JoinHandle<()>>,
}

impl PlaybackSession {
    /// Creates a session around the given engine and delegate.
    ///
    /// The delegate is held weakly: the caller keeps the owning `Arc`, and
    /// events arriving after it is dropped are discarded.
    pub fn new<E>(mut engine: E, delegate: Weak<dyn PlayerDelegate>) -> Self
    where
        E: PlaybackEngine,
    {
        let (tx, rx) = signal_channel();
        engine.attach(tx);

        let shared = Arc::new(Mutex::new(Shared::default()));
        let dispatcher = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || dispatch_loop(rx, shared, delegate))
        };

        Self {
            engine: Mutex::new(Some(Box::new(engine))),
            shared,
            dispatcher: Some(dispatcher),
        }
    }

    fn with_engine<R>(&self, f: impl FnOnce(&mut dyn PlaybackEngine) -> R) -> Option<R> {
        self.engine.lock().as_mut().map(|engine| f(engine.as_mut()))
    }

    /// Sets the application id used for authorized requests.
    pub fn set_application_id(&self, application_id: &str) {
        self.shared.lock().application_id = application_id.to_string();
    }

    /// Requires the broadcast to be in a specific state for playback.
    /// Applies to the next `play_video`.
    pub fn set_required_state(&self, filter: BroadcastStateFilter) {
        self.shared.lock().required_state = filter;
    }

    /// Requests that seeking is enabled during live playback, at a latency
    /// cost. Can only change while playback is stopped.
    pub fn set_timeshift_enabled(&self, enabled: bool) -> Result<(), PlayerError> {
        let mut shared = self.shared.lock();
        if shared.status != PlayerStatus::Stopped {
            return Err(PlayerError::TimeshiftLocked);
        }
        shared.timeshift = enabled;
        Ok(())
    }

    /// Loads and plays the broadcast behind the given signed resource URI.
    ///
    /// The URI must parse as a URL; beyond that it is opaque to this layer.
    /// Fetch or decode failures arrive asynchronously as `video_load_fail`.
    #[instrument(name = "play_video", skip(self, resource_uri))]
    pub fn play_video(&self, resource_uri: &str) -> Result<(), PlayerError> {
        url::Url::parse(resource_uri)?;

        let request = {
            let mut shared = self.shared.lock();
            shared.resource_uri = Some(resource_uri.to_string());
            shared.status = PlayerStatus::Loading;
            shared.live = false;
            shared.duration = None;
            shared.seekable = None;
            shared.position = 0.0;
            LoadRequest {
                resource_uri: resource_uri.to_string(),
                application_id: shared.application_id.clone(),
                required_state: shared.required_state,
                timeshift: shared.timeshift,
            }
        };

        info!("loading resource");
        if let Some(Err(err)) = self.with_engine(|engine| engine.load(&request)) {
            self.shared.lock().status = PlayerStatus::Stopped;
            return Err(err.into());
        }
        Ok(())
    }

    /// Resumes playback of a paused, non-live broadcast. A silent no-op in
    /// any other state; live playback must be re-requested via
    /// [`play_video`](Self::play_video).
    pub fn resume(&self) {
        let resumable = {
            let shared = self.shared.lock();
            shared.status == PlayerStatus::Paused && !shared.live
        };
        if !resumable {
            debug!("resume ignored: not paused or content is live");
            return;
        }
        self.with_engine(|engine| engine.play());
    }

    /// Pauses playback. For live broadcasts this behaves exactly like
    /// [`stop_video`](Self::stop_video).
    pub fn pause_video(&self) {
        let (playing, live) = {
            let shared = self.shared.lock();
            (shared.status == PlayerStatus::Playing, shared.live)
        };
        if !playing {
            debug!("pause ignored: not playing");
            return;
        }
        if live {
            self.with_engine(|engine| engine.stop());
        } else {
            self.with_engine(|engine| engine.pause());
        }
    }

    /// Stops playback. Valid in any state and idempotent; the
    /// `playback_stopped` callback may fire after this call returns.
    pub fn stop_video(&self) {
        if self.shared.lock().status == PlayerStatus::Stopped {
            debug!("already stopped");
            return;
        }
        self.with_engine(|engine| engine.stop());
    }

    /// Seeks to the given position in seconds.
    ///
    /// Valid for archived content (clamped to `[0, duration]`) and for
    /// live content with timeshift enabled (clamped to the seekable
    /// range). Live content without timeshift is not seekable.
    pub fn seek_to(&self, time: f64) -> Result<(), PlayerError> {
        let clamped = {
            let shared = self.shared.lock();
            if shared.status == PlayerStatus::Stopped {
                return Err(PlayerError::SeekUnavailable);
            }
            if shared.live {
                let (start, end) = match shared.seekable {
                    Some(range) if shared.timeshift => range,
                    _ => return Err(PlayerError::SeekUnavailable),
                };
                time.clamp(start, end)
            } else {
                let end = shared.duration.filter(|d| *d >= 0.0).unwrap_or(f64::MAX);
                time.clamp(0.0, end)
            }
        };

        self.shared.lock().position = clamped;
        self.with_engine(|engine| engine.seek_to(clamped));
        Ok(())
    }

    /// Sets playback volume, clamped to `[0.0, 1.0]`.
    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.shared.lock().volume = volume;
        self.with_engine(|engine| engine.set_volume(volume));
    }

    /// Sets how video is fitted within the player bounds.
    pub fn set_scale_mode(&self, mode: VideoScaleMode) {
        self.shared.lock().scale_mode = mode;
        self.with_engine(|engine| engine.set_scale_mode(mode));
    }

    // Read accessors.

    /// Current playback status.
    pub fn status(&self) -> PlayerStatus {
        self.shared.lock().status
    }

    /// Current playback position in seconds.
    pub fn position(&self) -> f64 {
        self.shared.lock().position
    }

    /// Whether the loaded broadcast is currently live. Derived from the
    /// loaded resource, never settable.
    pub fn is_live(&self) -> bool {
        self.shared.lock().live
    }

    /// Duration of the loaded archived broadcast, if known.
    pub fn duration(&self) -> Option<f64> {
        self.shared.lock().duration
    }

    /// Seekable `[start, end]` range; only available in timeshift mode.
    pub fn seekable_range(&self) -> Option<(f64, f64)> {
        self.shared.lock().seekable
    }

    /// Current playback volume.
    pub fn volume(&self) -> f32 {
        self.shared.lock().volume
    }

    /// How video is fitted within the player bounds.
    pub fn scale_mode(&self) -> VideoScaleMode {
        self.shared.lock().scale_mode
    }

    /// Whether timeshift mode is requested for the next load.
    pub fn timeshift_enabled(&self) -> bool {
        self.shared.lock().timeshift
    }

    /// Resource URI of the currently loaded broadcast.
    pub fn resource_uri(&self) -> Option<String> {
        self.shared.lock().resource_uri.clone()
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        // Stop and drop the engine first so its signal sender closes and
        // the dispatcher drains out.
        let engine = self.engine.lock().take();
        if let Some(mut engine) = engine {
            engine.stop();
        }
        if let Some(handle) = self.dispatcher.take() {
            let _ = handle.join();
        }
    }
}

/// Pending delegate invocation computed under the shared lock.
enum Callback {
    LoadFail,
    Started,
    Paused,
    Stopped,
    Completed,
    DurationKnown(f64),
    CurrentViewers(u32),
    TotalViewers(u32),
}

/// Dispatcher loop: the single designated context for delegate callbacks.
fn dispatch_loop(
    rx: Receiver<PlaybackSignal>,
    shared: Arc<Mutex<Shared>>,
    delegate: Weak<dyn PlayerDelegate>,
) {
    for signal in rx.iter() {
        let callback = {
            let mut state = shared.lock();
            apply_signal(&mut state, signal)
        };
        if let Some(callback) = callback {
            deliver(&delegate, callback);
        }
    }
    debug!("playback dispatcher exiting");
}

fn apply_signal(state: &mut Shared, signal: PlaybackSignal) -> Option<Callback> {
    match signal {
        PlaybackSignal::Loaded {
            live,
            duration,
            seekable_start,
            seekable_end,
        } => {
            state.live = live;
            state.duration = duration;
            // A degenerate range from the engine means no seeking.
            state.seekable = (seekable_start >= 0.0 && seekable_end >= seekable_start)
                .then_some((seekable_start, seekable_end));
            None
        }
        PlaybackSignal::LoadFailed => {
            state.status = PlayerStatus::Stopped;
            Some(Callback::LoadFail)
        }
        PlaybackSignal::Started => {
            state.status = PlayerStatus::Playing;
            Some(Callback::Started)
        }
        PlaybackSignal::Paused => {
            if state.status != PlayerStatus::Playing {
                warn!(status = state.status.name(), "unexpected pause signal");
                return None;
            }
            state.status = PlayerStatus::Paused;
            Some(Callback::Paused)
        }
        PlaybackSignal::Stopped => {
            // Suppressed when already stopped, which keeps double stops
            // down to a single Stopped callback.
            if state.status == PlayerStatus::Stopped {
                return None;
            }
            state.status = PlayerStatus::Stopped;
            Some(Callback::Stopped)
        }
        PlaybackSignal::Completed => {
            state.status = PlayerStatus::Stopped;
            Some(Callback::Completed)
        }
        PlaybackSignal::DurationKnown(duration) => {
            state.duration = Some(duration);
            Some(Callback::DurationKnown(duration))
        }
        PlaybackSignal::Position(position) => {
            state.position = position;
            None
        }
        PlaybackSignal::CurrentViewers(n) => Some(Callback::CurrentViewers(n)),
        PlaybackSignal::TotalViewers(n) => Some(Callback::TotalViewers(n)),
    }
}

fn deliver(delegate: &Weak<dyn PlayerDelegate>, callback: Callback) {
    let Some(delegate) = delegate.upgrade() else {
        debug!("delegate gone, dropping event");
        return;
    };
    match callback {
        Callback::LoadFail => delegate.video_load_fail(),
        Callback::Started => delegate.playback_started(),
        Callback::Paused => delegate.playback_paused(),
        Callback::Stopped => delegate.playback_stopped(),
        Callback::Completed => delegate.playback_completed(),
        Callback::DurationKnown(duration) => delegate.duration_known(duration),
        Callback::CurrentViewers(n) => delegate.current_viewer_count_updated(n),
        Callback::TotalViewers(n) => delegate.total_viewer_count_updated(n),
    }
}
