//! Hand-written collaborators for tests, benches and demos.
//!
//! Collaborators are consumed as `&dyn` inside a
//! [`RulesContext`](crate::RulesContext), so these fakes use interior
//! mutability and can be adjusted while a context borrows them.

use std::{cell::Cell, time::Duration};

use pada_events::MediaKind;

use crate::context::{MediaInfo, PlayerMetrics, QualityMapper, ScheduleController, ThroughputHistory};

/// Buffer levels per media kind plus the stable buffer target.
#[derive(Debug)]
pub struct FakePlayerMetrics {
    buffer_levels: [Cell<f64>; MediaKind::COUNT],
    stable_buffer_time: Cell<f64>,
}

impl FakePlayerMetrics {
    /// Same buffer level for every media kind.
    #[must_use]
    pub fn new(buffer_level_secs: f64, stable_buffer_time_secs: f64) -> Self {
        Self {
            buffer_levels: std::array::from_fn(|_| Cell::new(buffer_level_secs)),
            stable_buffer_time: Cell::new(stable_buffer_time_secs),
        }
    }

    pub fn set_buffer_level(&self, kind: MediaKind, secs: f64) {
        self.buffer_levels[kind.index()].set(secs);
    }

    pub fn set_stable_buffer_time(&self, secs: f64) {
        self.stable_buffer_time.set(secs);
    }
}

impl PlayerMetrics for FakePlayerMetrics {
    fn buffer_level_secs(&self, kind: MediaKind) -> f64 {
        self.buffer_levels[kind.index()].get()
    }

    fn stable_buffer_time_secs(&self) -> f64 {
        self.stable_buffer_time.get()
    }
}

/// Fixed throughput for every media kind; both averages report the same value.
#[derive(Debug, Default)]
pub struct FakeThroughput {
    bps: Cell<Option<f64>>,
    latency_secs: Cell<Option<f64>>,
}

impl FakeThroughput {
    #[must_use]
    pub fn ready(bps: f64) -> Self {
        Self {
            bps: Cell::new(Some(bps)),
            latency_secs: Cell::new(None),
        }
    }

    /// No measurement yet.
    #[must_use]
    pub fn not_ready() -> Self {
        Self::default()
    }

    pub fn set_bps(&self, bps: Option<f64>) {
        self.bps.set(bps);
    }

    pub fn set_latency(&self, secs: Option<f64>) {
        self.latency_secs.set(secs);
    }
}

impl ThroughputHistory for FakeThroughput {
    fn average_throughput_bps(&self, _kind: MediaKind, _is_live: bool) -> Option<f64> {
        self.bps.get()
    }

    fn safe_average_throughput_bps(&self, _kind: MediaKind, _is_live: bool) -> Option<f64> {
        self.bps.get()
    }

    fn average_latency_secs(&self, _kind: MediaKind) -> Option<f64> {
        self.latency_secs.get()
    }
}

/// Maps throughput to the highest bitrate it covers, lowest quality otherwise.
#[derive(Debug, Default)]
pub struct FakeAbr {
    priority: u32,
}

impl FakeAbr {
    #[must_use]
    pub fn with_priority(priority: u32) -> Self {
        Self { priority }
    }
}

impl QualityMapper for FakeAbr {
    fn quality_for_bitrate(
        &self,
        media: &MediaInfo,
        bitrate_bps: f64,
        _stream_id: Option<&str>,
        _latency_secs: Option<f64>,
    ) -> usize {
        #[expect(clippy::cast_precision_loss)]
        let covered = media
            .bitrates
            .iter()
            .rposition(|b| *b as f64 <= bitrate_bps);
        covered.unwrap_or(0)
    }

    fn priority(&self) -> u32 {
        self.priority
    }
}

/// Remembers the last load delay it was given.
#[derive(Debug, Default)]
pub struct FakeSchedule {
    last_delay: Cell<Option<Duration>>,
}

impl FakeSchedule {
    #[must_use]
    pub fn last_delay(&self) -> Option<Duration> {
        self.last_delay.get()
    }
}

impl ScheduleController for FakeSchedule {
    fn set_time_to_load_delay(&self, delay: Duration) {
        self.last_delay.set(Some(delay));
    }
}
