//! Error types for the playback session facade.

use thiserror::Error;

use iris_native::EngineError;

/// Synchronous misuse errors raised at the facade boundary.
///
/// Asynchronous failures (fetch or decode errors) arrive through the
/// delegate's `video_load_fail` callback instead.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The resource URI is not a parseable URL.
    #[error("invalid resource uri: {0}")]
    InvalidResourceUri(#[from] url::ParseError),

    /// Timeshift mode can only change while playback is stopped.
    #[error("timeshift mode is locked while a resource is loaded")]
    TimeshiftLocked,

    /// Seeking requires archived content, or live content with timeshift
    /// mode enabled.
    #[error("seeking is not available for this resource")]
    SeekUnavailable,

    /// The engine rejected a command synchronously.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
