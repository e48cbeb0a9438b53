//! Log-utility model and the buffer scaling parameters derived from it.

use crate::PadaOptions;

/// Per-bitrate utility: `ln(bitrate)`, shifted so the first entry is 1.
#[must_use]
pub fn utilities_from_bitrates(bitrates: &[u64]) -> Vec<f64> {
    #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
    let raw: Vec<f64> = bitrates.iter().map(|b| (*b as f64).ln()).collect();
    let Some(&base) = raw.first() else {
        return Vec::new();
    };
    raw.into_iter().map(|u| u - base + 1.0).collect()
}

/// Buffer-to-utility scaling.
///
/// `vp * gp` is always the minimum-buffer breakpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BufferParams {
    pub vp: f64,
    pub gp: f64,
}

impl BufferParams {
    /// Derive `Vp`/`gp` for a stable buffer target.
    ///
    /// Returns `None` when no entry has a higher utility than the first one,
    /// which is always the case for a single-entry ladder.
    #[must_use]
    pub fn derive(stable_buffer_time: f64, utilities: &[f64], opts: &PadaOptions) -> Option<Self> {
        let highest = utilities
            .iter()
            .enumerate()
            .fold(0, |best, (i, u)| if *u > utilities[best] { i } else { best });
        if highest == 0 {
            return None;
        }

        #[expect(clippy::cast_precision_loss)] // ladder lengths are tiny
        let floor = opts.minimum_buffer_secs
            + opts.minimum_buffer_per_level_secs * utilities.len() as f64;
        let buffer_time = stable_buffer_time.max(floor);

        let gp = (utilities[highest] - 1.0) / (buffer_time / opts.minimum_buffer_secs - 1.0);
        let vp = opts.minimum_buffer_secs / gp;
        Some(Self { vp, gp })
    }
}

/// Utilities plus the scaling currently in force for one adaptation state.
#[derive(Clone, Debug, PartialEq)]
pub struct UtilityModel {
    utilities: Vec<f64>,
    stable_buffer_time: f64,
    params: BufferParams,
}

impl UtilityModel {
    /// Build the model for `bitrates` (lowest first).
    ///
    /// `None` means the ladder is degenerate and the state must run
    /// single-bitrate.
    #[must_use]
    pub fn new(bitrates: &[u64], stable_buffer_time: f64, opts: &PadaOptions) -> Option<Self> {
        let utilities = utilities_from_bitrates(bitrates);
        let params = BufferParams::derive(stable_buffer_time, &utilities, opts)?;
        Some(Self {
            utilities,
            stable_buffer_time,
            params,
        })
    }

    #[must_use]
    pub fn utilities(&self) -> &[f64] {
        &self.utilities
    }

    #[must_use]
    pub fn params(&self) -> BufferParams {
        self.params
    }

    #[must_use]
    pub fn stable_buffer_time(&self) -> f64 {
        self.stable_buffer_time
    }

    /// Buffer level above which the engine would rather wait than download
    /// another segment at `quality`.
    #[must_use]
    pub fn max_buffer_level_for_quality(&self, quality: usize) -> f64 {
        let BufferParams { vp, gp } = self.params;
        vp * (self.utilities[quality] + gp)
    }

    /// Smallest buffer level at which `quality` beats every lower-utility
    /// bitrate below it.
    #[must_use]
    pub fn min_buffer_level_for_quality(&self, bitrates: &[u64], quality: usize) -> f64 {
        let BufferParams { vp, gp } = self.params;
        #[expect(clippy::cast_precision_loss)] // bitrate precision loss is negligible for ABR
        let q_bitrate = bitrates[quality] as f64;
        let q_utility = self.utilities[quality];

        (0..quality)
            .filter(|&i| self.utilities[i] < q_utility)
            .map(|i| {
                #[expect(clippy::cast_precision_loss)]
                let i_bitrate = bitrates[i] as f64;
                let i_utility = self.utilities[i];
                vp * (gp + (q_bitrate * i_utility - i_bitrate * q_utility) / (q_bitrate - i_bitrate))
            })
            .fold(0.0, f64::max)
    }

    /// Adopt a new stable buffer target.
    ///
    /// Returns the placeholder buffer to use afterwards: unchanged unless the
    /// scaling moved, in which case the effective buffer above the
    /// minimum-buffer breakpoint is rescaled by `Vp_new / Vp_old`.
    pub fn retarget(
        &mut self,
        stable_buffer_time: f64,
        buffer_level: f64,
        placeholder: f64,
        opts: &PadaOptions,
    ) -> f64 {
        if (stable_buffer_time - self.stable_buffer_time).abs() <= f64::EPSILON {
            return placeholder;
        }
        self.stable_buffer_time = stable_buffer_time;

        let Some(params) = BufferParams::derive(stable_buffer_time, &self.utilities, opts) else {
            return placeholder;
        };
        if params == self.params {
            return placeholder;
        }

        let mut effective = buffer_level + placeholder;
        effective -= opts.minimum_buffer_secs;
        effective *= params.vp / self.params.vp;
        effective += opts.minimum_buffer_secs;

        tracing::debug!(
            stable_buffer_time,
            old_vp = self.params.vp,
            new_vp = params.vp,
            gp = params.gp,
            "PADA: stable buffer target changed"
        );
        self.params = params;
        (effective - buffer_level).max(0.0)
    }
}
