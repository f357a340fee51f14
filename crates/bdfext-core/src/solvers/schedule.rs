//! Step counts for a simulated duration

use crate::utils::constants::STEP_COUNT_TOLERANCE;

/// Number of whole steps of size `dt` covering `duration`
///
/// Durations that are an integer multiple of `dt` up to rounding count in
/// full. Returns 0 for a non-positive or non-finite `duration` or `dt`.
pub fn steps_for(duration: f64, dt: f64) -> usize {
    if !(duration > 0.0 && duration.is_finite() && dt > 0.0 && dt.is_finite()) {
        return 0;
    }
    (duration / dt + STEP_COUNT_TOLERANCE).floor() as usize
}
