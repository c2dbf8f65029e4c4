//! Broadcast configuration record.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{AudioQuality, Orientation};

/// Serverside limit for the custom data field, in bytes.
pub const CUSTOM_DATA_LIMIT: usize = 10_000;

/// Lowest accepted maximum capture framerate.
pub const MIN_MAX_FRAMERATE: f32 = 24.0;

/// Highest accepted maximum capture framerate.
pub const MAX_MAX_FRAMERATE: f32 = 30.0;

/// Configuration held by a broadcast session.
///
/// Most fields are locked once a broadcast is connecting or live; the
/// session facade enforces which fields stay mutable (title and custom data
/// any time, orientation flip-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Application id. Depending on serverside setup this redirects to a
    /// suitable ingest server and sets broadcasting credentials. Required
    /// before starting a broadcast or a linktest.
    pub application_id: String,

    /// Title for the upcoming broadcast; may be updated while live.
    pub title: String,

    /// Author field associated with the broadcast; set before starting.
    pub author: String,

    /// Arbitrary data associated with the broadcast, limited serverside to
    /// [`CUSTOM_DATA_LIMIT`] bytes.
    pub custom_data: String,

    /// Capture orientation.
    pub orientation: Orientation,

    /// Audio quality preset.
    pub audio_quality: AudioQuality,

    /// Keep the broadcast available on demand after it ends.
    pub save_on_server: bool,

    /// Also record the broadcast to a local file.
    pub save_locally: bool,

    /// Signal the server that talkback requests are accepted.
    pub talkback: bool,

    /// Mix talkback audio into the recorded and broadcast signal.
    pub talkback_mix: bool,

    /// Continuously send device position during the broadcast.
    pub send_position: bool,

    /// List the broadcast as private.
    pub private_mode: bool,

    /// Path for the local recording. None means a unique filename in the
    /// platform temp directory.
    pub local_filename: Option<PathBuf>,

    /// Max size for any dimension of the broadcast; 0 means unlimited.
    pub max_broadcast_dimension: u32,

    /// Maximum capture framerate, clamped to 24..=30.
    pub framerate: f32,

    /// Minimum capture framerate.
    pub min_framerate: f32,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            application_id: String::new(),
            title: String::new(),
            author: String::new(),
            custom_data: String::new(),
            orientation: Orientation::default(),
            audio_quality: AudioQuality::default(),
            save_on_server: false,
            save_locally: false,
            talkback: false,
            talkback_mix: false,
            send_position: false,
            private_mode: false,
            local_filename: None,
            max_broadcast_dimension: 0,
            framerate: 30.0,
            min_framerate: 15.0,
        }
    }
}

impl BroadcastConfig {
    /// Validates serverside limits.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let len = self.custom_data.len();
        if len > CUSTOM_DATA_LIMIT {
            return Err(ConfigError::CustomDataTooLarge {
                len,
                limit: CUSTOM_DATA_LIMIT,
            });
        }
        Ok(())
    }

    /// Clamps the framerate pair into the accepted capture range.
    pub fn clamp_framerates(&mut self) {
        self.framerate = self.framerate.clamp(MIN_MAX_FRAMERATE, MAX_MAX_FRAMERATE);
        if self.min_framerate > self.framerate {
            self.min_framerate = self.framerate;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_framerates() {
        let config = BroadcastConfig::default();
        assert_eq!(config.framerate, 30.0);
        assert_eq!(config.min_framerate, 15.0);
    }

    #[test]
    fn test_custom_data_limit() {
        let mut config = BroadcastConfig::default();
        config.custom_data = "x".repeat(CUSTOM_DATA_LIMIT);
        assert!(config.validate().is_ok());

        config.custom_data.push('x');
        assert_eq!(
            config.validate(),
            Err(ConfigError::CustomDataTooLarge {
                len: CUSTOM_DATA_LIMIT + 1,
                limit: CUSTOM_DATA_LIMIT,
            })
        );
    }

    #[test]
    fn test_framerate_clamping() {
        let mut config = BroadcastConfig {
            framerate: 60.0,
            min_framerate: 40.0,
            ..Default::default()
        };
        config.clamp_framerates();
        assert_eq!(config.framerate, 30.0);
        assert_eq!(config.min_framerate, 30.0);

        config.framerate = 10.0;
        config.min_framerate = 5.0;
        config.clamp_framerates();
        assert_eq!(config.framerate, 24.0);
        assert_eq!(config.min_framerate, 5.0);
    }
}
