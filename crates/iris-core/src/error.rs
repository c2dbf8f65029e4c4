//! The closed error taxonomy delivered via the broadcast error event.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by the native engine during a broadcast.
///
/// This is a closed, native-defined set; it arrives through the delegate's
/// error callback, never as a return value. The numeric codes match the
/// native header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ErrorCode {
    /// Server is full.
    #[error("server full")]
    ServerFull,

    /// Server rejected the client because of incorrect credentials.
    #[error("incorrect credentials")]
    IncorrectCredentials,

    /// Server disconnected.
    #[error("server disconnected")]
    ServerDisconnected,

    /// No camera available.
    #[error("no camera available")]
    NoCamera,

    /// Location sharing disabled by the user.
    #[error("location disabled")]
    LocationDisabled,

    /// Connection to the server was lost.
    #[error("connection lost")]
    ConnectionLost,

    /// Connection could not be established.
    #[error("unable to connect")]
    UnableToConnect,

    /// A broadcast is already ongoing.
    #[error("already broadcasting")]
    AlreadyBroadcasting,

    /// Privacy settings prohibit video or audio capture.
    #[error("capture restricted by privacy settings")]
    PrivacyRestricted,

    /// Not enough free space to continue local recording.
    #[error("no free space for local recording")]
    NoFreeSpace,

    /// The local recording file is not writable.
    #[error("local recording not writable")]
    WriteError,

    /// Failed to retrieve ingest server or credentials.
    #[error("broadcast ticket fetch failed")]
    TicketFailed,

    /// The encoder failed.
    #[error("encoder failed")]
    EncoderFailed,

    /// Server rejected the client for another reason; the accompanying
    /// message should be shown to the user.
    #[error("server rejected")]
    ServerRejected,
}

impl ErrorCode {
    /// The numeric code used by the native engine.
    pub fn code(self) -> i32 {
        match self {
            Self::ServerFull => -1,
            Self::IncorrectCredentials => -2,
            Self::ServerDisconnected => -3,
            Self::NoCamera => -4,
            Self::LocationDisabled => -5,
            Self::ConnectionLost => -6,
            Self::UnableToConnect => -7,
            Self::AlreadyBroadcasting => -8,
            Self::PrivacyRestricted => -9,
            Self::NoFreeSpace => -10,
            Self::WriteError => -11,
            Self::TicketFailed => -12,
            Self::EncoderFailed => -13,
            Self::ServerRejected => -14,
        }
    }
}

/// Errors raised when validating a [`crate::BroadcastConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Custom data exceeds the serverside limit.
    #[error("custom data is {len} bytes, limit is {limit}")]
    CustomDataTooLarge { len: usize, limit: usize },
}
