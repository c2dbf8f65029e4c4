//! Event sink for broadcast sessions.

use std::path::Path;

use iris_core::{ErrorCode, Snapshot, TalkbackState};

/// Receives broadcast session events.
///
/// Every method is invoked on the session's dispatcher thread, in the order
/// the native engine delivered the underlying signals. All methods default
/// to no-ops so a sink only implements what it cares about. The session
/// holds the sink weakly; events arriving after the sink is dropped are
/// discarded.
#[allow(unused_variables)]
pub trait BroadcastDelegate: Send + Sync {
    /// Connected to an ingest server; the broadcast is live.
    fn broadcast_started(&self) {}

    /// Disconnected from the ingest server; broadcasting has stopped.
    fn broadcast_stopped(&self) {}

    /// The engine reported an error from the closed taxonomy.
    fn error(&self, code: ErrorCode, message: &str) {}

    /// An uplink test finished. Advisory only; broadcasting is allowed
    /// regardless of the result.
    fn uplink_test_complete(&self, speed_bytes_per_sec: f32, should_broadcast: bool) {}

    /// The native settings view requested dismissal.
    fn hide_settings_view(&self) {}

    /// A chat message arrived from the server.
    fn chat_message_received(&self, message: &str) {}

    /// Broadcasting stopped and the local copy has been saved. Moving or
    /// removing the file is the consumer's responsibility.
    fn recording_complete(&self, filename: &Path) {}

    /// Stream health changed (0-100).
    fn health_updated(&self, health: u8) {}

    /// Number of current viewers changed.
    fn current_viewer_count_updated(&self, viewers: u32) {}

    /// Accumulated total viewer count changed.
    fn total_viewer_count_updated(&self, viewers: u32) {}

    /// A viewer requested talkback; `talkback_id` is used to accept or
    /// decline.
    fn talkback_request(&self, request: &str, caller: &str, talkback_id: i32) {}

    /// Talkback state changed.
    fn talkback_state_changed(&self, state: TalkbackState) {}

    /// The server assigned the broadcast its unique id.
    fn broadcast_id_received(&self, broadcast_id: &str) {}

    /// A requested snapshot is ready.
    fn snapshot_taken(&self, snapshot: Snapshot) {}
}
