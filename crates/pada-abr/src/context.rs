//! Collaborator interfaces consumed by the engine.
//!
//! [`PlayerMetrics`] is owned by the engine for its whole lifetime because the
//! event handlers need it too. Everything else arrives per call inside a
//! [`RulesContext`], which can only be built once every collaborator is
//! present.

use std::time::Duration;

use pada_events::MediaKind;

use crate::{PadaError, PadaResult};

/// Player-wide buffer measurements and settings.
#[cfg_attr(test, unimock::unimock(api = PlayerMetricsMock))]
pub trait PlayerMetrics {
    /// Seconds of media currently buffered for `kind`.
    fn buffer_level_secs(&self, kind: MediaKind) -> f64;

    /// Configured stable buffer target, seconds. May change at runtime.
    fn stable_buffer_time_secs(&self) -> f64;
}

impl<T: PlayerMetrics + ?Sized> PlayerMetrics for &T {
    fn buffer_level_secs(&self, kind: MediaKind) -> f64 {
        (**self).buffer_level_secs(kind)
    }

    fn stable_buffer_time_secs(&self) -> f64 {
        (**self).stable_buffer_time_secs()
    }
}

/// Throughput and latency averages kept by the surrounding ABR controller.
///
/// `None` means the measurement is not available yet.
pub trait ThroughputHistory {
    fn average_throughput_bps(&self, kind: MediaKind, is_live: bool) -> Option<f64>;

    /// Conservative average, suitable for startup decisions.
    fn safe_average_throughput_bps(&self, kind: MediaKind, is_live: bool) -> Option<f64>;

    fn average_latency_secs(&self, kind: MediaKind) -> Option<f64>;
}

/// Throughput-to-quality mapping and session priority.
pub trait QualityMapper {
    /// Highest quality index of `media` sustainable at `bitrate_bps`.
    fn quality_for_bitrate(
        &self,
        media: &MediaInfo,
        bitrate_bps: f64,
        stream_id: Option<&str>,
        latency_secs: Option<f64>,
    ) -> usize;

    /// Priority tier assigned to this session (0 = unrestricted).
    fn priority(&self) -> u32;
}

/// Sink for the scheduler's load-delay hint. Best effort, non-binding.
pub trait ScheduleController {
    fn set_time_to_load_delay(&self, delay: Duration);
}

/// Description of the active adaptation set.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaInfo {
    pub kind: MediaKind,
    /// Encoded bitrates, bits per second, lowest first.
    pub bitrates: Vec<u64>,
}

impl MediaInfo {
    #[must_use]
    pub fn new(kind: MediaKind, bitrates: Vec<u64>) -> Self {
        Self { kind, bitrates }
    }

    /// Check the ladder can feed the log-utility model.
    ///
    /// # Errors
    ///
    /// [`PadaError::EmptyLadder`] or [`PadaError::InvalidBitrate`] for a zero
    /// entry.
    pub fn validate_ladder(&self) -> PadaResult<()> {
        if self.bitrates.is_empty() {
            return Err(PadaError::EmptyLadder);
        }
        if let Some((index, &bitrate)) = self.bitrates.iter().enumerate().find(|(_, b)| **b == 0)
        {
            return Err(PadaError::InvalidBitrate { index, bitrate });
        }
        Ok(())
    }
}

/// Identity of the current period/stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamInfo {
    pub id: String,
    /// Live (dynamic) presentation.
    pub is_live: bool,
}

/// Everything a single decision call needs besides [`PlayerMetrics`].
pub struct RulesContext<'a> {
    pub media_info: &'a MediaInfo,
    pub stream_info: Option<&'a StreamInfo>,
    /// Buffer-occupancy ABR enabled for this session.
    pub use_buffer_occupancy_abr: bool,
    pub throughput: &'a dyn ThroughputHistory,
    pub abr: &'a dyn QualityMapper,
    pub schedule: &'a dyn ScheduleController,
}

impl<'a> RulesContext<'a> {
    #[must_use]
    pub fn builder() -> RulesContextBuilder<'a> {
        RulesContextBuilder::default()
    }

    #[must_use]
    pub fn media_kind(&self) -> MediaKind {
        self.media_info.kind
    }

    #[must_use]
    pub fn stream_id(&self) -> Option<&str> {
        self.stream_info.map(|s| s.id.as_str())
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        self.stream_info.is_some_and(|s| s.is_live)
    }
}

/// Assembles a [`RulesContext`] at the call-site boundary.
#[derive(Default)]
pub struct RulesContextBuilder<'a> {
    media_info: Option<&'a MediaInfo>,
    stream_info: Option<&'a StreamInfo>,
    use_buffer_occupancy_abr: bool,
    throughput: Option<&'a dyn ThroughputHistory>,
    abr: Option<&'a dyn QualityMapper>,
    schedule: Option<&'a dyn ScheduleController>,
}

impl<'a> RulesContextBuilder<'a> {
    #[must_use]
    pub fn media_info(mut self, media_info: &'a MediaInfo) -> Self {
        self.media_info = Some(media_info);
        self
    }

    #[must_use]
    pub fn stream_info(mut self, stream_info: &'a StreamInfo) -> Self {
        self.stream_info = Some(stream_info);
        self
    }

    #[must_use]
    pub fn use_buffer_occupancy_abr(mut self, enabled: bool) -> Self {
        self.use_buffer_occupancy_abr = enabled;
        self
    }

    #[must_use]
    pub fn throughput(mut self, throughput: &'a dyn ThroughputHistory) -> Self {
        self.throughput = Some(throughput);
        self
    }

    #[must_use]
    pub fn abr(mut self, abr: &'a dyn QualityMapper) -> Self {
        self.abr = Some(abr);
        self
    }

    #[must_use]
    pub fn schedule(mut self, schedule: &'a dyn ScheduleController) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// # Errors
    ///
    /// [`PadaError::MissingCollaborator`] naming the first absent collaborator.
    /// Stream info is optional.
    pub fn build(self) -> PadaResult<RulesContext<'a>> {
        Ok(RulesContext {
            media_info: self
                .media_info
                .ok_or(PadaError::MissingCollaborator("media info"))?,
            stream_info: self.stream_info,
            use_buffer_occupancy_abr: self.use_buffer_occupancy_abr,
            throughput: self
                .throughput
                .ok_or(PadaError::MissingCollaborator("throughput history"))?,
            abr: self
                .abr
                .ok_or(PadaError::MissingCollaborator("abr controller"))?,
            schedule: self
                .schedule
                .ok_or(PadaError::MissingCollaborator("schedule controller"))?,
        })
    }
}
