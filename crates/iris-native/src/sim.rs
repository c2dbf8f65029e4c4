//! Thread-backed simulated engines.
//!
//! The simulator stands in for the closed native library in the demo apps
//! and the facade integration tests. Each long-running command spawns a
//! worker thread that feeds the attached signal channel; scripts make the
//! outcomes deterministic enough to assert on.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use tracing::{debug, warn};

use iris_core::{BroadcastConfig, ErrorCode, Orientation, Snapshot, TalkbackState};

use crate::broadcast::{BroadcastEngine, BroadcastSignal, CaptureSettings, DeviceCapabilities};
use crate::error::EngineError;
use crate::playback::{LoadRequest, PlaybackEngine, PlaybackSignal};

fn send<T>(tx: &Sender<T>, signal: T) {
    if tx.send(signal).is_err() {
        warn!("signal channel closed, dropping signal");
    }
}

/// Scripted behavior for a [`SimulatedBroadcastEngine`].
#[derive(Debug, Clone)]
pub struct BroadcastScript {
    /// Delay before the connect outcome is reported.
    pub connect_delay: Duration,

    /// Fail the connect with this error instead of going live.
    pub fail_with: Option<(ErrorCode, String)>,

    /// Broadcast id assigned by the "server".
    pub broadcast_id: String,

    /// Number of health updates emitted after going live.
    pub health_ticks: u32,

    /// Interval between health updates.
    pub tick: Duration,

    /// Talkback request injected shortly after going live.
    pub talkback_request: Option<(String, String, i32)>,

    /// Linktest result.
    pub uplink_speed: f32,
    pub uplink_recommendation: bool,

    /// Reported device capabilities.
    pub capabilities: DeviceCapabilities,
}

impl Default for BroadcastScript {
    fn default() -> Self {
        Self {
            connect_delay: Duration::from_millis(30),
            fail_with: None,
            broadcast_id: "sim-broadcast-1".to_string(),
            health_ticks: 3,
            tick: Duration::from_millis(20),
            talkback_request: None,
            uplink_speed: 480_000.0,
            uplink_recommendation: true,
            capabilities: DeviceCapabilities::default(),
        }
    }
}

/// Simulated broadcast engine.
pub struct SimulatedBroadcastEngine {
    script: BroadcastScript,
    signals: Option<Sender<BroadcastSignal>>,
    live: Arc<AtomicBool>,
    cancel: Arc<AtomicBool>,
    pending_talkback: Arc<Mutex<Option<i32>>>,
    recording: Option<PathBuf>,
}

impl SimulatedBroadcastEngine {
    /// Creates an engine with default scripting.
    pub fn new() -> Self {
        Self::with_script(BroadcastScript::default())
    }

    /// Creates an engine with the given script.
    pub fn with_script(script: BroadcastScript) -> Self {
        Self {
            script,
            signals: None,
            live: Arc::new(AtomicBool::new(false)),
            cancel: Arc::new(AtomicBool::new(false)),
            pending_talkback: Arc::new(Mutex::new(None)),
            recording: None,
        }
    }

    fn tx(&self) -> Result<&Sender<BroadcastSignal>, EngineError> {
        self.signals.as_ref().ok_or(EngineError::NotAttached)
    }
}

impl Default for SimulatedBroadcastEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastEngine for SimulatedBroadcastEngine {
    fn attach(&mut self, signals: Sender<BroadcastSignal>) {
        self.signals = Some(signals);
    }

    fn start_capture(&mut self, settings: &CaptureSettings) -> Result<(), EngineError> {
        self.tx()?;
        debug!(?settings, "sim capture started");
        Ok(())
    }

    fn start_broadcast(&mut self, config: &BroadcastConfig) -> Result<(), EngineError> {
        let tx = self.tx()?.clone();
        let script = self.script.clone();
        let live = Arc::clone(&self.live);
        let cancel = Arc::clone(&self.cancel);
        let pending = Arc::clone(&self.pending_talkback);

        cancel.store(false, Ordering::SeqCst);

        self.recording = if config.save_locally {
            Some(config.local_filename.clone().unwrap_or_else(|| {
                let stamp = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_millis();
                std::env::temp_dir().join(format!("iris-recording-{stamp}.mp4"))
            }))
        } else {
            None
        };

        thread::spawn(move || {
            thread::sleep(script.connect_delay);

            if let Some((code, message)) = script.fail_with {
                send(&tx, BroadcastSignal::ConnectFailed { code, message });
                return;
            }

            if cancel.load(Ordering::SeqCst) {
                send(&tx, BroadcastSignal::Disconnected);
                return;
            }

            live.store(true, Ordering::SeqCst);
            send(&tx, BroadcastSignal::BroadcastId(script.broadcast_id.clone()));
            send(&tx, BroadcastSignal::Connected);

            if let Some((request, caller, id)) = script.talkback_request.clone() {
                *pending.lock() = Some(id);
                send(
                    &tx,
                    BroadcastSignal::TalkbackRequest {
                        request,
                        caller,
                        talkback_id: id,
                    },
                );
            }

            send(&tx, BroadcastSignal::CurrentViewers(1));
            send(&tx, BroadcastSignal::TotalViewers(1));

            for i in 0..script.health_ticks {
                if !live.load(Ordering::SeqCst) {
                    break;
                }
                let health = (70 + i * 10).min(100) as u8;
                send(&tx, BroadcastSignal::Health(health));
                thread::sleep(script.tick);
            }
        });

        Ok(())
    }

    fn stop_broadcast(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if self.live.swap(false, Ordering::SeqCst) {
            let recording = self.recording.take();
            if let Ok(tx) = self.tx() {
                send(tx, BroadcastSignal::Disconnected);
                if let Some(path) = recording {
                    send(tx, BroadcastSignal::RecordingComplete(path));
                }
            }
        }
    }

    fn swap_camera(&mut self) {
        debug!("sim camera swapped");
    }

    fn set_torch(&mut self, on: bool) {
        debug!(on, "sim torch");
    }

    fn set_zoom(&mut self, zoom: f32) {
        debug!(zoom, "sim zoom");
    }

    fn take_snapshot(&mut self) {
        if let Ok(tx) = self.tx() {
            // Tiny solid-gray stand-in for a camera frame.
            let snapshot = Snapshot {
                width: 16,
                height: 9,
                data: Bytes::from(vec![0x80u8; 16 * 9]),
            };
            send(tx, BroadcastSignal::SnapshotReady(snapshot));
        }
    }

    fn accept_talkback(&mut self, talkback_id: i32) {
        let mut pending = self.pending_talkback.lock();
        if *pending == Some(talkback_id) {
            *pending = None;
            drop(pending);
            if let Ok(tx) = self.tx() {
                send(tx, BroadcastSignal::TalkbackState(TalkbackState::Accepted));
                send(tx, BroadcastSignal::TalkbackState(TalkbackState::Playing));
            }
        }
    }

    fn decline_talkback(&mut self, talkback_id: i32) {
        let mut pending = self.pending_talkback.lock();
        if *pending == Some(talkback_id) {
            *pending = None;
            drop(pending);
            if let Ok(tx) = self.tx() {
                send(tx, BroadcastSignal::TalkbackState(TalkbackState::Idle));
            }
        }
    }

    fn end_talkback(&mut self) {
        if let Ok(tx) = self.tx() {
            send(tx, BroadcastSignal::TalkbackState(TalkbackState::Idle));
        }
    }

    fn start_linktest(&mut self) {
        if let Ok(tx) = self.tx() {
            let tx = tx.clone();
            let speed = self.script.uplink_speed;
            let should_broadcast = self.script.uplink_recommendation;
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                send(
                    &tx,
                    BroadcastSignal::LinktestComplete {
                        speed_bytes_per_sec: speed,
                        should_broadcast,
                    },
                );
            });
        }
    }

    fn update_title(&mut self, title: &str) {
        debug!(title, "sim title updated");
    }

    fn update_custom_data(&mut self, data: &str) {
        debug!(len = data.len(), "sim custom data updated");
    }

    fn set_orientation(&mut self, orientation: Orientation) {
        debug!(?orientation, "sim orientation");
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.script.capabilities
    }
}

/// Scripted behavior for a [`SimulatedPlaybackEngine`].
#[derive(Debug, Clone)]
pub struct PlaybackScript {
    /// Whether the "resource" is a live broadcast.
    pub live: bool,

    /// Duration in seconds when archived.
    pub duration: f64,

    /// Delay before the load outcome is reported.
    pub load_delay: Duration,

    /// Fail the load unconditionally.
    pub fail_load: bool,

    /// Length of the seekable window when timeshift is requested.
    pub seekable_window: f64,

    /// Position advance per tick, in seconds.
    pub position_step: f64,

    /// Interval between position updates.
    pub tick: Duration,
}

impl Default for PlaybackScript {
    fn default() -> Self {
        Self {
            live: false,
            duration: 0.2,
            load_delay: Duration::from_millis(30),
            fail_load: false,
            seekable_window: 60.0,
            position_step: 0.05,
            tick: Duration::from_millis(15),
        }
    }
}

/// Simulated playback engine.
pub struct SimulatedPlaybackEngine {
    script: PlaybackScript,
    signals: Option<Sender<PlaybackSignal>>,
    playing: Arc<AtomicBool>,
    generation: Arc<AtomicU64>,
    position: Arc<Mutex<f64>>,
}

impl SimulatedPlaybackEngine {
    /// Creates an engine with default scripting (a short archived clip).
    pub fn new() -> Self {
        Self::with_script(PlaybackScript::default())
    }

    /// Creates an engine with the given script.
    pub fn with_script(script: PlaybackScript) -> Self {
        Self {
            script,
            signals: None,
            playing: Arc::new(AtomicBool::new(false)),
            generation: Arc::new(AtomicU64::new(0)),
            position: Arc::new(Mutex::new(0.0)),
        }
    }

    fn tx(&self) -> Result<&Sender<PlaybackSignal>, EngineError> {
        self.signals.as_ref().ok_or(EngineError::NotAttached)
    }

    fn matches_filter(&self, request: &LoadRequest) -> bool {
        match request.required_state {
            iris_core::BroadcastStateFilter::Any => true,
            iris_core::BroadcastStateFilter::Live => self.script.live,
            iris_core::BroadcastStateFilter::Archived => !self.script.live,
        }
    }
}

impl Default for SimulatedPlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackEngine for SimulatedPlaybackEngine {
    fn attach(&mut self, signals: Sender<PlaybackSignal>) {
        self.signals = Some(signals);
    }

    fn load(&mut self, request: &LoadRequest) -> Result<(), EngineError> {
        let tx = self.tx()?.clone();
        let script = self.script.clone();
        let playing = Arc::clone(&self.playing);
        let generation = Arc::clone(&self.generation);
        let position = Arc::clone(&self.position);
        let fail = script.fail_load || !self.matches_filter(request);
        let timeshift = request.timeshift;

        let my_gen = generation.fetch_add(1, Ordering::SeqCst) + 1;
        *position.lock() = 0.0;

        thread::spawn(move || {
            thread::sleep(script.load_delay);

            if fail {
                send(&tx, PlaybackSignal::LoadFailed);
                return;
            }

            let (seek_start, seek_end) = if script.live && timeshift {
                (0.0, script.seekable_window)
            } else {
                (-1.0, -1.0)
            };

            send(
                &tx,
                PlaybackSignal::Loaded {
                    live: script.live,
                    duration: (!script.live).then_some(script.duration),
                    seekable_start: seek_start,
                    seekable_end: seek_end,
                },
            );

            if !script.live {
                send(&tx, PlaybackSignal::DurationKnown(script.duration));
            }

            playing.store(true, Ordering::SeqCst);
            send(&tx, PlaybackSignal::Started);
            send(&tx, PlaybackSignal::CurrentViewers(1));
            send(&tx, PlaybackSignal::TotalViewers(1));

            while generation.load(Ordering::SeqCst) == my_gen {
                thread::sleep(script.tick);
                if !playing.load(Ordering::SeqCst) {
                    continue;
                }

                let pos = {
                    let mut pos = position.lock();
                    *pos += script.position_step;
                    *pos
                };

                if tx.send(PlaybackSignal::Position(pos)).is_err() {
                    return;
                }

                if !script.live && pos >= script.duration {
                    playing.store(false, Ordering::SeqCst);
                    send(&tx, PlaybackSignal::Completed);
                    return;
                }
            }
        });

        Ok(())
    }

    fn play(&mut self) {
        self.playing.store(true, Ordering::SeqCst);
        if let Ok(tx) = self.tx() {
            send(tx, PlaybackSignal::Started);
        }
    }

    fn pause(&mut self) {
        self.playing.store(false, Ordering::SeqCst);
        if let Ok(tx) = self.tx() {
            send(tx, PlaybackSignal::Paused);
        }
    }

    fn stop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.playing.store(false, Ordering::SeqCst);
        if let Ok(tx) = self.tx() {
            send(tx, PlaybackSignal::Stopped);
        }
    }

    fn seek_to(&mut self, time: f64) {
        *self.position.lock() = time;
        if let Ok(tx) = self.tx() {
            send(tx, PlaybackSignal::Position(time));
        }
    }

    fn set_volume(&mut self, volume: f32) {
        debug!(volume, "sim volume");
    }

    fn set_scale_mode(&mut self, mode: iris_core::VideoScaleMode) {
        debug!(?mode, "sim scale mode");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iris_core::signal_channel;

    #[test]
    fn test_broadcast_requires_attach() {
        let mut engine = SimulatedBroadcastEngine::new();
        let settings = CaptureSettings::from_config(&BroadcastConfig::default());
        assert!(matches!(
            engine.start_capture(&settings),
            Err(EngineError::NotAttached)
        ));
    }

    #[test]
    fn test_broadcast_connect_sequence() {
        let (tx, rx) = signal_channel();
        let mut engine = SimulatedBroadcastEngine::new();
        engine.attach(tx);
        engine
            .start_broadcast(&BroadcastConfig::default())
            .expect("start");

        let timeout = Duration::from_secs(1);
        assert!(matches!(
            rx.recv_timeout(timeout).expect("broadcast id"),
            BroadcastSignal::BroadcastId(_)
        ));
        assert!(matches!(
            rx.recv_timeout(timeout).expect("connected"),
            BroadcastSignal::Connected
        ));
    }

    #[test]
    fn test_broadcast_scripted_failure() {
        let (tx, rx) = signal_channel();
        let mut engine = SimulatedBroadcastEngine::with_script(BroadcastScript {
            fail_with: Some((ErrorCode::ServerFull, "full".to_string())),
            ..Default::default()
        });
        engine.attach(tx);
        engine
            .start_broadcast(&BroadcastConfig::default())
            .expect("start");

        match rx.recv_timeout(Duration::from_secs(1)).expect("failure") {
            BroadcastSignal::ConnectFailed { code, .. } => {
                assert_eq!(code, ErrorCode::ServerFull)
            }
            other => panic!("unexpected signal: {other:?}"),
        }
    }

    #[test]
    fn test_broadcast_stop_reports_recording() {
        let (tx, rx) = signal_channel();
        let mut engine = SimulatedBroadcastEngine::new();
        engine.attach(tx);
        let config = BroadcastConfig {
            save_locally: true,
            local_filename: Some(PathBuf::from("/tmp/clip.mp4")),
            ..BroadcastConfig::default()
        };
        engine.start_broadcast(&config).expect("start");

        let timeout = Duration::from_secs(1);
        loop {
            if matches!(
                rx.recv_timeout(timeout).expect("signal"),
                BroadcastSignal::Connected
            ) {
                break;
            }
        }

        engine.stop_broadcast();
        let mut saw_disconnect = false;
        loop {
            match rx.recv_timeout(timeout).expect("signal") {
                BroadcastSignal::Disconnected => saw_disconnect = true,
                BroadcastSignal::RecordingComplete(path) => {
                    assert_eq!(path, PathBuf::from("/tmp/clip.mp4"));
                    break;
                }
                _ => {}
            }
        }
        assert!(saw_disconnect);
    }

    #[test]
    fn test_playback_archived_reaches_completion() {
        let (tx, rx) = signal_channel();
        let mut engine = SimulatedPlaybackEngine::new();
        engine.attach(tx);
        engine
            .load(&LoadRequest {
                resource_uri: "https://example/resource".to_string(),
                application_id: String::new(),
                required_state: iris_core::BroadcastStateFilter::Archived,
                timeshift: false,
            })
            .expect("load");

        let timeout = Duration::from_secs(2);
        let mut saw_duration = false;
        loop {
            match rx.recv_timeout(timeout).expect("signal") {
                PlaybackSignal::DurationKnown(_) => saw_duration = true,
                PlaybackSignal::Completed => break,
                _ => {}
            }
        }
        assert!(saw_duration);
    }

    #[test]
    fn test_playback_filter_mismatch_fails_load() {
        let (tx, rx) = signal_channel();
        let mut engine = SimulatedPlaybackEngine::new(); // archived clip
        engine.attach(tx);
        engine
            .load(&LoadRequest {
                resource_uri: "https://example/resource".to_string(),
                application_id: String::new(),
                required_state: iris_core::BroadcastStateFilter::Live,
                timeshift: false,
            })
            .expect("load");

        assert!(matches!(
            rx.recv_timeout(Duration::from_secs(1)).expect("signal"),
            PlaybackSignal::LoadFailed
        ));
    }
}
