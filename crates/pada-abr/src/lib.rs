//! Priority-aware buffer-occupancy bitrate adaptation (PADA).
//!
//! A BOLA-style rule: every bitrate gets a logarithmic utility and the
//! buffer level picks the rung. On top of plain BOLA it adds
//!
//! - **priority tiers** that strip the highest rungs from low-priority
//!   sessions ([`priority`]),
//! - a **placeholder buffer** that credits time lost to non-bandwidth delays
//!   and replacement downloads ([`PlaceholderBuffer`]),
//! - a **startup** phase that picks quality from throughput until one segment
//!   is buffered, then hands over to buffer-based **steady** selection.
//!
//! The engine never talks to the network or the media pipeline. It reads the
//! collaborators in a [`RulesContext`] and a [`PlayerMetrics`] source and
//! reacts to player [`Event`]s.
//!
//! ## Example
//!
//! ```rust
//! use pada_abr::{
//!     MediaInfo, MediaKind, PadaOptions, PadaRule, RulesContext,
//!     testing::{FakeAbr, FakePlayerMetrics, FakeSchedule, FakeThroughput},
//! };
//! use web_time::Instant;
//!
//! let metrics = FakePlayerMetrics::new(0.0, 20.0);
//! let mut rule = PadaRule::new(PadaOptions::default(), &metrics);
//!
//! let media = MediaInfo::new(MediaKind::Video, vec![500_000, 1_000_000, 2_000_000]);
//! let throughput = FakeThroughput::ready(1_200_000.0);
//! let abr = FakeAbr::default();
//! let schedule = FakeSchedule::default();
//! let ctx = RulesContext::builder()
//!     .media_info(&media)
//!     .use_buffer_occupancy_abr(true)
//!     .throughput(&throughput)
//!     .abr(&abr)
//!     .schedule(&schedule)
//!     .build()
//!     .unwrap();
//!
//! let decision = rule.max_index(&ctx, Instant::now());
//! assert_eq!(decision.target_quality, Some(1));
//! ```

#![forbid(unsafe_code)]

mod context;
mod decision;
mod error;
mod ingest;
mod options;
mod placeholder;
pub mod priority;
mod rule;
mod state;
mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
mod utility;

pub use context::{
    MediaInfo, PlayerMetrics, QualityMapper, RulesContext, RulesContextBuilder,
    ScheduleController, StreamInfo, ThroughputHistory,
};
pub use decision::{PadaDecision, PadaDiagnostics, PadaReason};
pub use error::{PadaError, PadaResult};
pub use ingest::EventSubscription;
pub use options::PadaOptions;
pub use pada_events::{Chunk, Event, EventBus, MediaKind, Metric, PlaybackEvent, StreamEvent};
pub use placeholder::PlaceholderBuffer;
pub use rule::PadaRule;
pub use state::{AdaptationState, CompletedDownload, Lifecycle, SegmentTracking};
pub use store::StateStore;
pub use utility::{BufferParams, UtilityModel, utilities_from_bitrates};
