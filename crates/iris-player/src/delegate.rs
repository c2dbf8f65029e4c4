//! Event sink for playback sessions.

/// Receives playback session events.
///
/// Every method is invoked on the session's dispatcher thread, in the order
/// the native engine delivered the underlying signals. All methods default
/// to no-ops. The session holds the sink weakly; events arriving after the
/// sink is dropped are discarded.
#[allow(unused_variables)]
pub trait PlayerDelegate: Send + Sync {
    /// The resource could not be fetched or decoded after `play_video`.
    fn video_load_fail(&self) {}

    /// Playback started.
    fn playback_started(&self) {}

    /// Playback paused.
    fn playback_paused(&self) {}

    /// Playback stopped.
    fn playback_stopped(&self) {}

    /// The broadcast reached its end, archived or live.
    fn playback_completed(&self) {}

    /// Duration of an archived broadcast is known, in seconds.
    fn duration_known(&self, duration: f64) {}

    /// Number of current viewers changed.
    fn current_viewer_count_updated(&self, viewers: u32) {}

    /// Accumulated total viewer count changed.
    fn total_viewer_count_updated(&self, viewers: u32) {}
}
