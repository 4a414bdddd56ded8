//! Requests understood by the audio thread.

use crate::library::TrackSource;
use crate::playback::HandleId;

#[derive(Debug)]
pub(super) enum Request {
    /// Decode `source` into a new sink owned by `handle`.
    Open {
        handle: HandleId,
        source: TrackSource,
        auto_start: bool,
    },
    Pause(HandleId),
    Resume(HandleId),
    /// Halt playback. The resource stays allocated until released.
    Stop(HandleId),
    Seek { handle: HandleId, position_ms: u64 },
    Release(HandleId),
    /// Stop every sink and leave the thread loop.
    Quit,
}
