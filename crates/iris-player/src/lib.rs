//! Playback session facade.
//!
//! Wraps the native playback engine behind the status machine
//! Stopped -> Loading -> Playing <-> Paused -> Stopped. All asynchronous
//! outcomes are delivered in arrival order on a single dispatcher thread
//! through a caller-supplied [`PlayerDelegate`].

mod delegate;
mod error;
mod session;

pub use delegate::PlayerDelegate;
pub use error::PlayerError;
pub use session::PlaybackSession;
