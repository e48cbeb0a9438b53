use std::time::Duration;

use crate::state::Lifecycle;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PadaReason {
    /// Buffer-occupancy ABR is switched off for this session.
    Disabled,
    /// The rules context could not be assembled.
    MissingContext,
    SingleBitrate,
    /// Throughput not measured yet.
    NoEstimate,
    Startup,
    /// Internal state was inconsistent and has been reset.
    Recovered,
    BelowMinimumBuffer,
    StepDown,
    Hold,
    StepUp,
    TopQuality,
    /// Steady-state selection is defined for video and audio only.
    UnsupportedMedia,
}

/// Inputs and side outputs of one decision, for logging and metrics.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PadaDiagnostics {
    pub lifecycle: Option<Lifecycle>,
    pub throughput_bps: Option<f64>,
    pub latency_secs: Option<f64>,
    pub buffer_level_secs: Option<f64>,
    pub placeholder_secs: Option<f64>,
    /// Suggested wait before the next download, seconds. Advisory only.
    pub delay_secs: Option<f64>,
}

impl PadaDiagnostics {
    /// The delay advisory as a [`Duration`].
    #[must_use]
    pub fn delay(&self) -> Option<Duration> {
        self.delay_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PadaDecision {
    /// Quality index to request next; `None` means "no change".
    pub target_quality: Option<usize>,
    pub reason: PadaReason,
    /// The target differs from the previous decision for this media kind.
    pub changed: bool,
    pub diagnostics: PadaDiagnostics,
}

impl PadaDecision {
    #[must_use]
    pub fn no_change(reason: PadaReason, diagnostics: PadaDiagnostics) -> Self {
        Self {
            target_quality: None,
            reason,
            changed: false,
            diagnostics,
        }
    }

    #[must_use]
    pub fn is_no_change(&self) -> bool {
        self.target_quality.is_none()
    }
}
