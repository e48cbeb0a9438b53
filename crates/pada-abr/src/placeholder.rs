//! Placeholder buffer: synthetic buffer credit added to the real buffer level
//! before quality selection.
//!
//! It grows when time passes for reasons other than bandwidth (live segment
//! availability, the scheduler holding back a download) and when a
//! replacement segment is downloaded without extending the real buffer. It
//! shrinks through decay, the per-segment ceiling, download abandonment and
//! stalls. The value is never negative.

use web_time::Instant;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaceholderBuffer {
    secs: f64,
}

impl PlaceholderBuffer {
    #[must_use]
    pub fn secs(&self) -> f64 {
        self.secs
    }

    pub fn set(&mut self, secs: f64) {
        self.secs = if secs.is_nan() { 0.0 } else { secs.max(0.0) };
    }

    pub fn reset(&mut self) {
        self.secs = 0.0;
    }

    /// Credit the time elapsed since the most recent of `segment_finish_at`
    /// and `last_call_at`. Returns the seconds added.
    pub fn grow_for_delay(
        &mut self,
        segment_finish_at: Option<Instant>,
        last_call_at: Option<Instant>,
        now: Instant,
    ) -> f64 {
        let since = match (segment_finish_at, last_call_at) {
            (Some(finish), Some(call)) => finish.max(call),
            (Some(at), None) | (None, Some(at)) => at,
            (None, None) => return 0.0,
        };
        let delay = now.saturating_duration_since(since).as_secs_f64();
        self.secs += delay;
        delay
    }

    /// Shrink by the per-segment decay factor.
    pub fn decay(&mut self, factor: f64) {
        self.set(self.secs * factor);
    }

    /// Keep the buffer seen at request time plus the placeholder under the
    /// ceiling of the quality that segment was fetched at.
    pub fn clamp_to_segment_ceiling(&mut self, max_effective: f64, buffer_at_request: f64) {
        let limit = (max_effective - buffer_at_request).max(0.0);
        self.set(self.secs.min(limit));
    }

    /// Add the duration of a segment that did not grow the real buffer.
    pub fn credit(&mut self, secs: f64) {
        self.set(self.secs + secs);
    }

    /// Cap so that `buffer_level + placeholder` does not exceed `want_effective`.
    pub fn cap_effective(&mut self, want_effective: f64, buffer_level: f64) {
        let limit = (want_effective - buffer_level).max(0.0);
        self.set(self.secs.min(limit));
    }
}
