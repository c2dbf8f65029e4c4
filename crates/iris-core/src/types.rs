//! Enums mirrored 1:1 from the native engine.
//!
//! These are closed sets: no variant may be added without the native engine
//! changing first.

use serde::{Deserialize, Serialize};

/// Audio quality preset for an upcoming broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioQuality {
    /// Audio disabled.
    Off,

    /// 11kHz mono AAC.
    Low,

    /// 22kHz mono AAC.
    #[default]
    High,
}

/// Capture orientation for a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,

    /// Default orientation of the native engine.
    #[default]
    LandscapeRight,
}

impl Orientation {
    /// Returns the 180-degree flipped orientation.
    pub fn flipped(self) -> Self {
        match self {
            Self::Portrait => Self::PortraitUpsideDown,
            Self::PortraitUpsideDown => Self::Portrait,
            Self::LandscapeLeft => Self::LandscapeRight,
            Self::LandscapeRight => Self::LandscapeLeft,
        }
    }

    /// True if `other` is this orientation or its flipped counterpart.
    ///
    /// During a broadcast the orientation may only change to a
    /// flip-equivalent value.
    pub fn is_flip_of(self, other: Self) -> bool {
        self == other || self.flipped() == other
    }
}

/// The different states of talkback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TalkbackState {
    /// No request pending and no session ongoing.
    #[default]
    Idle,

    /// At least one request is pending, none accepted yet.
    NeedsAccept,

    /// A request has been accepted but playback has not started.
    Accepted,

    /// Talkback audio is playing.
    Playing,
}

impl TalkbackState {
    /// Returns a simple string representation of the state.
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::NeedsAccept => "NeedsAccept",
            Self::Accepted => "Accepted",
            Self::Playing => "Playing",
        }
    }
}

/// Lifecycle phase of a broadcast session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastPhase {
    /// Created, capture not started.
    #[default]
    Idle,

    /// Capture running, never broadcast or broadcast ended long ago.
    Capturing,

    /// Connecting to the ingest server.
    Connecting,

    /// Broadcasting.
    Live,

    /// A previous broadcast has ended; capture still running.
    Stopped,
}

impl BroadcastPhase {
    /// True if `start_broadcasting` may be called in this phase.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Capturing | Self::Stopped)
    }

    /// True while connecting or live.
    pub fn is_broadcasting(self) -> bool {
        matches!(self, Self::Connecting | Self::Live)
    }

    /// Returns a simple string representation of the phase.
    pub fn name(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Capturing => "Capturing",
            Self::Connecting => "Connecting",
            Self::Live => "Live",
            Self::Stopped => "Stopped",
        }
    }
}

/// Playback status of a player session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    /// Playback is stopped.
    #[default]
    Stopped,

    /// Playback has been requested but not yet started.
    Loading,

    /// Playback is in progress.
    Playing,

    /// Playback is paused.
    Paused,
}

impl PlayerStatus {
    /// Returns a simple string representation of the status.
    pub fn name(self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Loading => "Loading",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
        }
    }
}

/// Required broadcast state for playback of a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastStateFilter {
    /// Accept any broadcast.
    #[default]
    Any,

    /// Only live broadcasts.
    Live,

    /// Only archived broadcasts.
    Archived,
}

/// How video is fitted within the player's bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoScaleMode {
    /// Preserve aspect ratio, fit within bounds.
    #[default]
    AspectFit,

    /// Preserve aspect ratio, fill bounds.
    AspectFill,

    /// Stretch to fill bounds.
    Fill,
}
