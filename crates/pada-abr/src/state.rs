//! Per-media-type adaptation state.

use pada_events::MediaKind;
use web_time::Instant;

use crate::{
    PadaError, PadaOptions, PadaResult, placeholder::PlaceholderBuffer, priority,
    utility::UtilityModel,
};

/// Adaptation lifecycle of one media type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// Fewer than two usable bitrates; decisions are always "no change".
    SingleBitrate,
    /// Picking quality from throughput until the buffer is primed.
    Startup,
    /// Buffer-based selection.
    Steady,
}

/// Timing of the most recently finalized segment download.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompletedDownload {
    pub fragment_duration_secs: f64,
    pub request_at: Instant,
    pub finish_at: Instant,
}

impl CompletedDownload {
    /// Wall time spent downloading, seconds.
    #[must_use]
    pub fn download_secs(&self) -> f64 {
        self.finish_at
            .saturating_duration_since(self.request_at)
            .as_secs_f64()
    }
}

/// Fields filled by the fragment-loaded and metric-added notifications of
/// the segment currently completing. Either notification may arrive first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentTracking {
    pub last_segment_start: Option<f64>,
    /// Kept across finalization; the startup exit check reads it.
    pub last_segment_duration: Option<f64>,
    pub last_segment_request_at: Option<Instant>,
    /// Kept across finalization until the next steady decision consumes it.
    pub last_segment_finish_at: Option<Instant>,
    pub most_advanced_segment_start: Option<f64>,
    pub was_replacement: bool,
}

impl SegmentTracking {
    /// Record a loaded fragment, classifying it as a replacement when it does
    /// not start beyond everything seen so far.
    pub fn record_fragment(&mut self, start: f64, duration: f64) {
        match self.most_advanced_segment_start {
            Some(most_advanced) if start <= most_advanced => {
                self.was_replacement = true;
            }
            _ => {
                self.most_advanced_segment_start = Some(start);
                self.was_replacement = false;
            }
        }
        self.last_segment_start = Some(start);
        self.last_segment_duration = Some(duration);
    }

    /// Both notifications for the current segment have arrived.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.last_segment_start.is_some() && self.last_segment_request_at.is_some()
    }
}

/// Adaptation state for one media type.
#[derive(Clone, Debug)]
pub struct AdaptationState {
    pub(crate) kind: MediaKind,
    pub(crate) lifecycle: Lifecycle,
    pub(crate) bitrates: Vec<u64>,
    pub(crate) model: Option<UtilityModel>,
    pub(crate) priority: u32,
    pub(crate) placeholder: PlaceholderBuffer,
    /// Last quality chosen by this engine.
    pub(crate) last_quality: Option<usize>,
    /// Quality of the most recently loaded segment (or the startup pick).
    pub(crate) last_segment_quality: Option<usize>,
    /// Most recent quality requested by any decision source.
    pub(crate) pending_external_quality: Option<usize>,
    pub(crate) segment: SegmentTracking,
    pub(crate) last_download: Option<CompletedDownload>,
    pub(crate) last_call_at: Option<Instant>,
    pub(crate) last_throughput_bps: Option<f64>,
    pub(crate) quality_switches: u64,
}

impl AdaptationState {
    /// Create the state for `kind` from the full ladder.
    ///
    /// The ladder is narrowed for `priority` first; a result with fewer than
    /// two distinct bitrates runs single-bitrate.
    #[must_use]
    pub fn new(
        kind: MediaKind,
        full_ladder: &[u64],
        priority: u32,
        stable_buffer_time: f64,
        opts: &PadaOptions,
    ) -> Self {
        let bitrates = priority::bitrates_for_priority(full_ladder, priority);
        if bitrates.is_empty() {
            tracing::warn!(
                %kind,
                priority,
                ladder_len = full_ladder.len(),
                "PADA: priority filter left no bitrates, running single-bitrate"
            );
        }

        let model = if bitrates.contains(&0) {
            tracing::warn!(%kind, ?bitrates, "PADA: zero bitrate in ladder, running single-bitrate");
            None
        } else {
            UtilityModel::new(&bitrates, stable_buffer_time, opts)
        };

        let lifecycle = match &model {
            Some(model) => {
                let params = model.params();
                tracing::info!(
                    %kind,
                    priority,
                    ?bitrates,
                    utilities = ?model.utilities(),
                    vp = params.vp,
                    gp = params.gp,
                    "PADA: adaptation state created"
                );
                Lifecycle::Startup
            }
            None => {
                tracing::info!(%kind, priority, ?bitrates, "PADA: single bitrate");
                Lifecycle::SingleBitrate
            }
        };

        Self {
            kind,
            lifecycle,
            bitrates,
            model,
            priority,
            placeholder: PlaceholderBuffer::default(),
            last_quality: None,
            last_segment_quality: None,
            pending_external_quality: None,
            segment: SegmentTracking::default(),
            last_download: None,
            last_call_at: None,
            last_throughput_bps: None,
            quality_switches: 0,
        }
    }

    #[must_use]
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Ladder after priority filtering.
    #[must_use]
    pub fn bitrates(&self) -> &[u64] {
        &self.bitrates
    }

    /// Normalized utilities; empty for single-bitrate states.
    #[must_use]
    pub fn utilities(&self) -> &[f64] {
        match &self.model {
            Some(model) => model.utilities(),
            None => &[],
        }
    }

    #[must_use]
    pub fn model(&self) -> Option<&UtilityModel> {
        self.model.as_ref()
    }

    #[must_use]
    pub fn priority(&self) -> u32 {
        self.priority
    }

    #[must_use]
    pub fn placeholder_secs(&self) -> f64 {
        self.placeholder.secs()
    }

    #[must_use]
    pub fn last_quality(&self) -> Option<usize> {
        self.last_quality
    }

    #[must_use]
    pub fn pending_external_quality(&self) -> Option<usize> {
        self.pending_external_quality
    }

    #[must_use]
    pub fn segment(&self) -> &SegmentTracking {
        &self.segment
    }

    #[must_use]
    pub fn last_throughput_bps(&self) -> Option<f64> {
        self.last_throughput_bps
    }

    /// Number of times a decision differed from the previous one.
    #[must_use]
    pub fn quality_switches(&self) -> u64 {
        self.quality_switches
    }

    #[must_use]
    pub fn top_quality(&self) -> usize {
        self.bitrates.len().saturating_sub(1)
    }

    /// Clamp an index from the full ladder into the filtered one.
    #[must_use]
    pub fn clamp_quality(&self, quality: usize) -> usize {
        quality.min(self.top_quality())
    }

    /// Quality the steady-state step rule starts from.
    #[must_use]
    pub fn step_base_quality(&self) -> usize {
        self.clamp_quality(self.last_segment_quality.or(self.last_quality).unwrap_or(0))
    }

    #[must_use]
    pub fn max_buffer_level_for_quality(&self, quality: usize) -> Option<f64> {
        self.model
            .as_ref()
            .map(|m| m.max_buffer_level_for_quality(self.clamp_quality(quality)))
    }

    #[must_use]
    pub fn min_buffer_level_for_quality(&self, quality: usize) -> Option<f64> {
        self.model
            .as_ref()
            .map(|m| m.min_buffer_level_for_quality(&self.bitrates, self.clamp_quality(quality)))
    }

    /// Check the invariants a decision relies on.
    ///
    /// # Errors
    ///
    /// [`PadaError::InvalidState`] describing the first violation.
    pub fn check(&self) -> PadaResult<()> {
        if self.lifecycle == Lifecycle::SingleBitrate {
            return Ok(());
        }
        let Some(model) = &self.model else {
            return Err(PadaError::InvalidState(format!(
                "{:?} without utility model",
                self.lifecycle
            )));
        };
        if model.utilities().len() != self.bitrates.len() {
            return Err(PadaError::InvalidState(format!(
                "{} utilities for {} bitrates",
                model.utilities().len(),
                self.bitrates.len()
            )));
        }
        let params = model.params();
        if !(params.vp > 0.0 && params.gp > 0.0) {
            return Err(PadaError::InvalidState(format!(
                "non-positive scaling vp={} gp={}",
                params.vp, params.gp
            )));
        }
        if let Some(q) = self.last_quality
            && q >= self.bitrates.len()
        {
            return Err(PadaError::InvalidState(format!(
                "last quality {q} outside ladder of {}",
                self.bitrates.len()
            )));
        }
        if self.lifecycle == Lifecycle::Steady && self.last_quality.is_none() {
            return Err(PadaError::InvalidState(
                "steady without a previous decision".to_string(),
            ));
        }
        Ok(())
    }

    /// Back to startup, keeping ladder, utilities and priority.
    pub fn reset_for_seek(&mut self) {
        if self.lifecycle == Lifecycle::SingleBitrate {
            return;
        }
        self.lifecycle = Lifecycle::Startup;
        self.placeholder.reset();
        self.segment = SegmentTracking::default();
    }

    /// Follow a change of the configured stable buffer target.
    pub fn retarget(&mut self, stable_buffer_time: f64, buffer_level: f64, opts: &PadaOptions) {
        if let Some(model) = self.model.as_mut() {
            let placeholder =
                model.retarget(stable_buffer_time, buffer_level, self.placeholder.secs(), opts);
            self.placeholder.set(placeholder);
        }
    }

    /// Put an inconsistent state back on a path [`check`](Self::check) accepts.
    pub(crate) fn recover(&mut self) {
        if self.model.is_none() {
            self.lifecycle = Lifecycle::SingleBitrate;
            return;
        }
        self.reset_for_seek();
        self.last_quality = None;
        self.last_segment_quality = None;
    }
}
