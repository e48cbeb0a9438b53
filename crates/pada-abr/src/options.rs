use serde::{Deserialize, Serialize};

use crate::{PadaError, PadaResult};

/// PADA engine configuration.
///
/// The defaults are the tuned values; overriding them changes where the
/// buffer breakpoints sit, not the shape of the algorithm.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadaOptions {
    /// Low-buffer breakpoint (seconds). Below it the lowest quality is chosen;
    /// at twice this value the top quality is chosen.
    pub minimum_buffer_secs: f64,
    /// Extra buffer (seconds) per ladder level added to the floor of the
    /// stable buffer target when deriving `Vp`/`gp`.
    pub minimum_buffer_per_level_secs: f64,
    /// Factor applied to the placeholder buffer on every completed segment.
    pub placeholder_decay: f64,
}

impl Default for PadaOptions {
    fn default() -> Self {
        Self {
            minimum_buffer_secs: 10.0,
            minimum_buffer_per_level_secs: 2.0,
            placeholder_decay: 0.99,
        }
    }
}

impl PadaOptions {
    /// Reject values that would break the utility model.
    ///
    /// # Errors
    ///
    /// Returns [`PadaError::InvalidOptions`] for non-positive or non-finite
    /// buffer values and for a decay outside `(0, 1]`.
    pub fn validate(&self) -> PadaResult<()> {
        if !(self.minimum_buffer_secs.is_finite() && self.minimum_buffer_secs > 0.0) {
            return Err(PadaError::InvalidOptions(format!(
                "minimum_buffer_secs must be positive, got {}",
                self.minimum_buffer_secs
            )));
        }
        if !(self.minimum_buffer_per_level_secs.is_finite()
            && self.minimum_buffer_per_level_secs > 0.0)
        {
            return Err(PadaError::InvalidOptions(format!(
                "minimum_buffer_per_level_secs must be positive, got {}",
                self.minimum_buffer_per_level_secs
            )));
        }
        if !(self.placeholder_decay > 0.0 && self.placeholder_decay <= 1.0) {
            return Err(PadaError::InvalidOptions(format!(
                "placeholder_decay must be in (0, 1], got {}",
                self.placeholder_decay
            )));
        }
        Ok(())
    }
}
