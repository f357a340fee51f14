//! Numerical tolerances

/// Relative slack when converting a duration into a step count
pub const STEP_COUNT_TOLERANCE: f64 = 1e-9;

/// Threshold below which a BiCGStab inner product counts as breakdown
pub const BREAKDOWN_TOLERANCE: f64 = 1e-30;

/// Pivot magnitude below which a diagonal entry is treated as zero
pub const PIVOT_TOLERANCE: f64 = 1e-14;
