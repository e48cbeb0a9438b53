#![forbid(unsafe_code)]

//! Player events consumed by the PADA bitrate-adaptation engine.
//!
//! Producers (the buffer controller, the fragment loader, the metrics
//! collector) publish into a shared [`EventBus`]; the engine subscribes once
//! per session and drains the bus between scheduling opportunities.

mod bus;
mod event;
mod media;
mod playback;
mod stream;

pub use bus::EventBus;
pub use event::Event;
pub use media::MediaKind;
pub use playback::PlaybackEvent;
pub use stream::{Chunk, HttpRequest, HttpRequestKind, Metric, StreamEvent};
