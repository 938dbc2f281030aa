//! Engine constants — tick granularity, proficiency bounds, default tables.
//!
//! Plain values with no catalog dependency. The catalog loader falls back
//! to these when a JSON catalog omits a field.

/// Default activity scope that scoped modifiers are matched against.
pub const DEFAULT_ACTIVITY_ID: &str = "melvorD:Agility";

/// Default tick granularity for action intervals, in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: f64 = 50.0;

pub mod proficiency {
    /// Lowest accepted proficiency level.
    pub const MIN: u32 = 1;
    /// Highest proficiency level. Negative modifiers are halved here.
    pub const MAX: u32 = 99;
    /// Proficiency used when the caller does not supply one.
    pub const DEFAULT: u32 = 50;
    /// Interval percent granted per full step of proficiency.
    pub const INTERVAL_PERCENT_PER_STEP: f64 = -3.0;
    /// Proficiency levels per step.
    pub const LEVELS_PER_STEP: u32 = 10;
    /// Multiplier applied to negative modifier magnitudes at [`MAX`].
    pub const NEGATIVE_DAMPENING: f64 = 0.5;
}

/// Default tier unlock thresholds (index = tier).
pub const DEFAULT_TIER_UNLOCK_LEVELS: [u32; 15] =
    [0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 105, 110, 115, 118];

/// Levels swept by the default plan, one per tier unlock.
pub const DEFAULT_SWEEP_LEVELS: [u32; 15] =
    [1, 10, 20, 30, 40, 50, 60, 70, 80, 90, 100, 105, 110, 115, 118];
