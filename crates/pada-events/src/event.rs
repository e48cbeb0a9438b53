#![forbid(unsafe_code)]

use crate::{PlaybackEvent, StreamEvent};

/// Unified event for the player.
///
/// Hierarchical: each subsystem has its own variant with a sub-enum.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Playback (buffer, seek) event.
    Playback(PlaybackEvent),
    /// Download and metrics event.
    Stream(StreamEvent),
}

impl From<PlaybackEvent> for Event {
    fn from(e: PlaybackEvent) -> Self {
        Self::Playback(e)
    }
}

impl From<StreamEvent> for Event {
    fn from(e: StreamEvent) -> Self {
        Self::Stream(e)
    }
}
