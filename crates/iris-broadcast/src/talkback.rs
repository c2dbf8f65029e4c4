//! Talkback request tracking.

use iris_core::TalkbackState;

/// Tracks pending talkback requests and the talkback state.
///
/// Requests surface from the native side; accept/decline are keyed on the
/// request id. Unknown ids never change state.
#[derive(Debug, Default)]
pub(crate) struct TalkbackTracker {
    state: TalkbackState,
    pending: Vec<i32>,
}

impl TalkbackTracker {
    pub fn state(&self) -> TalkbackState {
        self.state
    }

    pub fn is_pending(&self, talkback_id: i32) -> bool {
        self.pending.contains(&talkback_id)
    }

    /// Records an incoming request. Returns the new state if it changed.
    pub fn request(&mut self, talkback_id: i32) -> Option<TalkbackState> {
        if !self.pending.contains(&talkback_id) {
            self.pending.push(talkback_id);
        }
        if self.state == TalkbackState::Idle {
            self.state = TalkbackState::NeedsAccept;
            return Some(self.state);
        }
        None
    }

    /// Removes a request once accept or decline has been forwarded. The
    /// state itself only changes when the native side confirms.
    pub fn remove_pending(&mut self, talkback_id: i32) {
        self.pending.retain(|id| *id != talkback_id);
    }

    /// Applies a native-side state change. Returns the new state if it
    /// changed.
    pub fn apply(&mut self, state: TalkbackState) -> Option<TalkbackState> {
        if state == TalkbackState::Idle {
            self.pending.clear();
        }
        if state != self.state {
            self.state = state;
            return Some(state);
        }
        None
    }
}
