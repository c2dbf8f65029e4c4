//! Error types for the engine boundary.

use thiserror::Error;

/// Errors that an engine command can fail with synchronously.
///
/// Asynchronous failures (connect errors, load errors) arrive as signals,
/// not as return values.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No signal channel has been attached yet.
    #[error("engine not attached")]
    NotAttached,

    /// Capture could not be started.
    #[error("capture failed: {0}")]
    Capture(String),

    /// The load request was rejected before any network activity.
    #[error("load rejected: {0}")]
    LoadRejected(String),
}
