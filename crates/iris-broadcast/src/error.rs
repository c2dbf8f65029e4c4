//! Error types for the broadcast session facade.

use thiserror::Error;

use iris_core::ConfigError;
use iris_native::EngineError;

/// Synchronous misuse errors raised at the facade boundary.
///
/// These cover calling sequence violations the native layer's tolerance for
/// which is undocumented; asynchronous failures arrive through the delegate
/// as [`iris_core::ErrorCode`]s instead.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The full configuration is locked once capture has started.
    #[error("configuration is locked once capture has started")]
    CaptureAlreadyStarted,

    /// Capture must be started exactly once per session.
    #[error("capture has already been started")]
    AlreadyCapturing,

    /// A broadcast is already connecting or live, or capture has not been
    /// started yet.
    #[error("cannot start broadcasting in the current state")]
    AlreadyBroadcasting,

    /// A non-empty application id is required for this operation.
    #[error("application id must be set")]
    MissingApplicationId,

    /// The field cannot change while connecting or live.
    #[error("{field} cannot be changed during a broadcast")]
    LockedWhileBroadcasting { field: &'static str },

    /// During a broadcast the orientation may only flip 180 degrees.
    #[error("orientation can only flip during a broadcast")]
    OrientationLocked,

    /// Configuration validation failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The engine rejected a command synchronously.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
