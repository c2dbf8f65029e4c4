//! Tagged event variants emitted by the session facades.
//!
//! Each variant corresponds 1:1 to a delegate callback. Consumers that
//! prefer a queue of tagged events over a delegate implementation (for
//! instance the demo apps, which log events as JSON) use these directly.

use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::types::TalkbackState;

/// A camera snapshot delivered asynchronously after a snapshot request.
///
/// The dimensions are limited by the active camera resolution and vary by
/// device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,

    /// Raw image bytes, format as produced by the engine.
    pub data: Bytes,
}

/// Events emitted by a broadcast session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BroadcastEvent {
    /// Connected to an ingest server; the broadcast is live.
    Started,

    /// Disconnected from the ingest server; broadcasting has stopped.
    Stopped,

    /// The engine reported an error.
    Error {
        /// Taxonomy code.
        code: ErrorCode,

        /// User-readable message, where available.
        message: String,
    },

    /// An uplink test finished. The recommendation is advisory only.
    UplinkTestComplete {
        /// Measured uplink speed in bytes per second.
        speed_bytes_per_sec: f32,

        /// Whether attempting to broadcast is advisable.
        should_broadcast: bool,
    },

    /// The native settings view requested dismissal.
    HideSettingsView,

    /// A chat message arrived from the server.
    ChatMessage(String),

    /// Broadcasting stopped and the local copy has been saved.
    RecordingComplete(PathBuf),

    /// Stream health changed (0-100, only meaningful while live).
    HealthUpdated(u8),

    /// Number of current viewers changed.
    CurrentViewerCount(u32),

    /// Accumulated total viewer count changed.
    TotalViewerCount(u32),

    /// A viewer requested talkback.
    TalkbackRequest {
        /// Free-form request text set by the caller.
        request: String,

        /// The caller's name.
        caller: String,

        /// Unique per broadcast and request; used to accept or decline.
        talkback_id: i32,
    },

    /// Talkback state changed.
    TalkbackStateChanged(TalkbackState),

    /// The server assigned the broadcast its unique id.
    BroadcastIdReceived(String),

    /// A requested snapshot is ready.
    SnapshotTaken(Snapshot),
}

/// Events emitted by a player session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlayerEvent {
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

    /// Number of current viewers changed.
    CurrentViewerCount(u32),

    /// Accumulated total viewer count changed.
    TotalViewerCount(u32),
}
