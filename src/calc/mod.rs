//! Attendance arithmetic: working-day counting, bunk budgets, end-of-term
//! projections and aggregate statistics.
//!
//! Everything in here is pure. Functions read only their arguments and never
//! fail; zero denominators produce 0 rather than an error.

pub mod aggregate;
pub mod bunk;
pub mod projection;
pub mod working_days;

pub use aggregate::AggregateStats;
pub use bunk::{BunkAnalysis, BunkCalculator, Recommendation};
pub use projection::{CalculationResult, RiskLevel, project};
pub use working_days::{
    WeeklySchedule, classes_per_subject, count_working_days, flat_remaining,
};

pub const DEFAULT_TARGET: f64 = 75.0;
pub const DEFAULT_BUFFER: f64 = 1.0;
pub const DEFAULT_FUTURE_CLASSES: u32 = 20;

/// Width of the warning band above the target.
pub const WARNING_BAND: f64 = 10.0;

/// `present / total * 100`, or 0 when nothing has been held yet.
pub fn percentage(present: u32, total: u32) -> f64 {
    wide_percentage(present as u64, total as u64)
}

/// Same as [`percentage`] for sums of counts, which may not fit in a `u32`.
pub fn wide_percentage(present: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        present as f64 / total as f64 * 100.0
    }
}

/// Round to two decimal places, the precision every reported percentage uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_total_is_zero_percent() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round2(100.0 / 3.0), 33.33);
        assert_eq!(round2(2.0 / 3.0 * 100.0), 66.67);
        assert_eq!(round2(-0.004), -0.0);
    }
}
