//! Playback side of the engine boundary.

use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use iris_core::{BroadcastStateFilter, VideoScaleMode};

use crate::error::EngineError;

/// A request to load a broadcast for playback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadRequest {
    /// Signed resource URI from the metadata API. Opaque to this layer.
    pub resource_uri: String,

    /// Application id for authorized requests.
    pub application_id: String,

    /// Required broadcast state of the resource.
    pub required_state: BroadcastStateFilter,

    /// Whether timeshift mode (seek during live playback) was requested.
    pub timeshift: bool,
}

/// Signals the playback engine emits on its attached channel.
#[derive(Debug, Clone)]
pub enum PlaybackSignal {
    /// The resource has been resolved and priming succeeded.
    Loaded {
        /// Whether the loaded broadcast is currently live.
        live: bool,

        /// Duration in seconds, known for archived broadcasts.
        duration: Option<f64>,

        /// Earliest seekable position in timeshift mode; negative when
        /// unavailable.
        seekable_start: f64,

        /// Latest seekable position in timeshift mode; negative when
        /// unavailable.
        seekable_end: f64,
    },

    /// The resource could not be fetched or decoded.
    LoadFailed,

    /// Playback started.
    Started,

    /// Playback paused.
    Paused,

    /// Playback stopped.
    Stopped,

    /// The broadcast reached its end.
    Completed,

    /// Duration of an archived broadcast is known, in seconds.
    DurationKnown(f64),

    /// Playback position advanced, in seconds.
    Position(f64),

    /// Number of current viewers changed.
    CurrentViewers(u32),

    /// Accumulated total viewer count changed.
    TotalViewers(u32),
}

/// Command interface of the native playback engine.
///
/// All commands are non-blocking; outcomes arrive as [`PlaybackSignal`]s on
/// the channel handed to [`attach`].
///
/// [`attach`]: PlaybackEngine::attach
pub trait PlaybackEngine: Send + 'static {
    /// Hands the engine the sender half of its signal channel. Called once
    /// by the session at construction, before any other command.
    fn attach(&mut self, signals: Sender<PlaybackSignal>);

    /// Begins loading and playing the requested resource.
    fn load(&mut self, request: &LoadRequest) -> Result<(), EngineError>;

    /// Resumes paused playback.
    fn play(&mut self);

    /// Pauses playback.
    fn pause(&mut self);

    /// Stops playback. Tolerates being called when already stopped.
    fn stop(&mut self);

    /// Seeks to the given position in seconds. The caller clamps to the
    /// seekable range.
    fn seek_to(&mut self, time: f64);

    /// Sets playback volume in [0.0, 1.0].
    fn set_volume(&mut self, volume: f32);

    /// Sets how video is fitted within the player bounds.
    fn set_scale_mode(&mut self, mode: VideoScaleMode);
}
