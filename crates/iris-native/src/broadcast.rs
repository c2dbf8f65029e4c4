//! Broadcast side of the engine boundary.

use std::path::PathBuf;

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use iris_core::{
    AudioQuality, BroadcastConfig, ErrorCode, Orientation, Snapshot, TalkbackState,
};

use crate::error::EngineError;

/// Capture-related parameters applied when capture starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Capture orientation.
    pub orientation: Orientation,

    /// Maximum capture framerate.
    pub framerate: f32,

    /// Minimum capture framerate. Restricts the camera from lowering the
    /// rate for better exposure in low light.
    pub min_framerate: f32,

    /// Audio quality preset.
    pub audio_quality: AudioQuality,

    /// Max size for any broadcast dimension; 0 means unlimited.
    pub max_broadcast_dimension: u32,
}

impl CaptureSettings {
    /// Extracts the capture-related subset of a broadcast configuration.
    pub fn from_config(config: &BroadcastConfig) -> Self {
        Self {
            orientation: config.orientation,
            framerate: config.framerate,
            min_framerate: config.min_framerate,
            audio_quality: config.audio_quality,
            max_broadcast_dimension: config.max_broadcast_dimension,
        }
    }
}

/// Fixed capabilities of the capture device.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Whether the device has an LED torch.
    pub has_torch: bool,

    /// Whether the device has a front-facing camera.
    pub has_front_camera: bool,

    /// Highest accepted zoom value; negative means zoom is unsupported.
    pub max_zoom: f32,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            has_torch: true,
            has_front_camera: true,
            max_zoom: 4.0,
        }
    }
}

/// Signals the broadcast engine emits on its attached channel.
#[derive(Debug, Clone)]
pub enum BroadcastSignal {
    /// Connected to an ingest server; the broadcast is live.
    Connected,

    /// The server assigned the broadcast its unique id.
    BroadcastId(String),

    /// A fatal broadcast error: connecting failed, or an ongoing
    /// broadcast was lost.
    ConnectFailed { code: ErrorCode, message: String },

    /// Disconnected from the ingest server.
    Disconnected,

    /// Stream health changed (0-100).
    Health(u8),

    /// A chat message arrived from the server.
    ChatMessage(String),

    /// Number of current viewers changed.
    CurrentViewers(u32),

    /// Accumulated total viewer count changed.
    TotalViewers(u32),

    /// A viewer requested talkback.
    TalkbackRequest {
        request: String,
        caller: String,
        talkback_id: i32,
    },

    /// Talkback state changed on the native side.
    TalkbackState(TalkbackState),

    /// A requested snapshot is ready.
    SnapshotReady(Snapshot),

    /// An uplink test finished.
    LinktestComplete {
        speed_bytes_per_sec: f32,
        should_broadcast: bool,
    },

    /// The local recording has been written.
    RecordingComplete(PathBuf),

    /// The native settings view requested dismissal.
    HideSettings,
}

/// Command interface of the native broadcast engine.
///
/// All commands are non-blocking; multi-step outcomes arrive as
/// [`BroadcastSignal`]s on the channel handed to [`attach`].
///
/// [`attach`]: BroadcastEngine::attach
pub trait BroadcastEngine: Send + 'static {
    /// Hands the engine the sender half of its signal channel. Called once
    /// by the session at construction, before any other command.
    fn attach(&mut self, signals: Sender<BroadcastSignal>);

    /// Starts camera and microphone capture.
    fn start_capture(&mut self, settings: &CaptureSettings) -> Result<(), EngineError>;

    /// Begins the asynchronous connect of a new broadcast.
    fn start_broadcast(&mut self, config: &BroadcastConfig) -> Result<(), EngineError>;

    /// Stops the broadcast and disconnects. Tolerates being called when no
    /// broadcast is ongoing.
    fn stop_broadcast(&mut self);

    /// Toggles between available cameras.
    fn swap_camera(&mut self);

    /// Turns the LED torch on or off.
    fn set_torch(&mut self, on: bool);

    /// Sets the zoom level. The caller clamps to the device range.
    fn set_zoom(&mut self, zoom: f32);

    /// Requests a snapshot; resolves via [`BroadcastSignal::SnapshotReady`].
    fn take_snapshot(&mut self);

    /// Accepts a pending talkback request.
    fn accept_talkback(&mut self, talkback_id: i32);

    /// Declines a pending talkback request.
    fn decline_talkback(&mut self, talkback_id: i32);

    /// Ends an ongoing talkback session.
    fn end_talkback(&mut self);

    /// Starts an uplink test; resolves via
    /// [`BroadcastSignal::LinktestComplete`].
    fn start_linktest(&mut self);

    /// Updates the title of an ongoing broadcast.
    fn update_title(&mut self, title: &str);

    /// Updates the custom data of an ongoing broadcast.
    fn update_custom_data(&mut self, data: &str);

    /// Changes the capture orientation.
    fn set_orientation(&mut self, orientation: Orientation);

    /// Reports the fixed capabilities of the capture device.
    fn capabilities(&self) -> DeviceCapabilities;
}
