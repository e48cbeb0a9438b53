#![forbid(unsafe_code)]

use crate::MediaKind;

/// Events emitted by the playback side of the player.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    /// Playback stalled because a buffer ran dry.
    BufferEmpty { media_kind: MediaKind },
    /// A seek started; buffered data ahead of the old position is stale.
    Seeking { time_secs: f64 },
}
