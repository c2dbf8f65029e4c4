//! Broadcast session facade.
//!
//! Wraps the native capture/ingest engine behind a lifecycle state machine:
//! configure, start capture, start broadcasting, live, stop. All
//! asynchronous outcomes are delivered in arrival order on a single
//! dispatcher thread through a caller-supplied [`BroadcastDelegate`].

mod delegate;
mod error;
mod session;
mod talkback;

pub use delegate::BroadcastDelegate;
pub use error::SessionError;
pub use session::BroadcastSession;
