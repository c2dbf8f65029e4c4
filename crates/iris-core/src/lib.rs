//! Shared types for the Iris client SDK.
//!
//! This crate defines the enums mirrored from the native engine, the closed
//! error taxonomy, the event vocabulary both session facades emit, and the
//! broadcast configuration record.

mod config;
mod error;
mod events;
pub mod option;
mod types;

pub use config::BroadcastConfig;
pub use error::{ConfigError, ErrorCode};
pub use events::{BroadcastEvent, PlayerEvent, Snapshot};
pub use types::{
    AudioQuality, BroadcastPhase, BroadcastStateFilter, Orientation, PlayerStatus, TalkbackState,
    VideoScaleMode,
};

use crossbeam_channel::{Receiver, Sender};

/// Channel capacity for engine-originated signals (engine -> session).
pub const SIGNAL_CHANNEL_CAPACITY: usize = 256;

/// Creates a bounded signal channel of the given payload type.
///
/// Both session facades hand the sender half to their native engine and
/// drain the receiver half on their dispatcher thread.
pub fn signal_channel<T>() -> (Sender<T>, Receiver<T>) {
    crossbeam_channel::bounded(SIGNAL_CHANNEL_CAPACITY)
}
