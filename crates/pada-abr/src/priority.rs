//! Priority-tier admission control over the bitrate ladder.
//!
//! Lower-priority sessions give up the top of the ladder so that
//! higher-priority sessions sharing the link can reach it. The drop counts
//! are fixed per tier, not proportional to the ladder length: a tier-1
//! session on a ladder of three or fewer entries ends up with nothing, and
//! the caller degrades it to single-bitrate.

/// Unrestricted sessions.
pub const PRIORITY_UNRESTRICTED: u32 = 0;
/// Low priority: loses the three highest bitrates.
pub const PRIORITY_LOW: u32 = 1;
/// Medium priority: loses the two highest bitrates.
pub const PRIORITY_MEDIUM: u32 = 2;

const LOW_PRIORITY_DROP: usize = 3;
const MEDIUM_PRIORITY_DROP: usize = 2;

/// Number of top entries removed for `priority`.
#[must_use]
pub fn dropped_levels(priority: u32) -> usize {
    match priority {
        PRIORITY_LOW => LOW_PRIORITY_DROP,
        PRIORITY_MEDIUM => MEDIUM_PRIORITY_DROP,
        _ => 0,
    }
}

/// Ladder subset usable at `priority`.
///
/// `bitrates` is ordered lowest first. A single-entry ladder always passes
/// through. The result may be empty.
#[must_use]
pub fn bitrates_for_priority(bitrates: &[u64], priority: u32) -> Vec<u64> {
    if bitrates.len() == 1 {
        return bitrates.to_vec();
    }
    let keep = bitrates.len().saturating_sub(dropped_levels(priority));
    bitrates[..keep].to_vec()
}
