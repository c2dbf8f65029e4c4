//! Boundary to the opaque native Iris engine.
//!
//! The actual capture, encoding, ingest and playback machinery lives inside
//! a closed native library. This crate defines the command-style traits the
//! session facades drive, and the signal enums the engine feeds back over a
//! channel. A thread-backed simulator is included for the demo apps and the
//! facade integration tests; it exercises the contract, it does not emulate
//! media behavior.

mod broadcast;
mod error;
mod playback;
pub mod sim;

pub use broadcast::{
    BroadcastEngine, BroadcastSignal, CaptureSettings, DeviceCapabilities,
};
pub use error::EngineError;
pub use playback::{LoadRequest, PlaybackEngine, PlaybackSignal};
