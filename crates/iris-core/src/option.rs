//! Named identifiers for options in the native settings view.
//!
//! Passed to the broadcast session's `enable_option`. Unknown names are
//! accepted by the native engine and have no effect.

/// The 'save locally' settings toggle.
pub const SAVE_LOCALLY: &str = "saveLocally";

/// The talkback-capability settings toggle.
pub const TALKBACK: &str = "talkback";

/// The audio quality selector.
pub const AUDIO_QUALITY: &str = "audioQuality";

/// The 'save on server' settings toggle.
pub const ARCHIVE: &str = "archive";

/// The location-sharing settings toggle.
pub const POSITION: &str = "position";

/// The 'private mode' settings toggle.
pub const PRIVATE_MODE: &str = "privateMode";

/// The only accepted video quality preset: adapt to connection quality.
pub const SESSION_PRESET_AUTO: &str = "auto";

/// All option names the settings view understands.
pub const KNOWN_OPTIONS: [&str; 6] = [
    SAVE_LOCALLY,
    TALKBACK,
    AUDIO_QUALITY,
    ARCHIVE,
    POSITION,
    PRIVATE_MODE,
];

/// True if `name` is a settings option the native view understands.
pub fn is_known(name: &str) -> bool {
    KNOWN_OPTIONS.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_options() {
        assert!(is_known(TALKBACK));
        assert!(is_known(PRIVATE_MODE));
        assert!(!is_known("fogMachine"));
    }
}
