use log::warn;
use serde::{Deserialize, Serialize};

use super::{DEFAULT_BUFFER, DEFAULT_TARGET, percentage, round2, wide_percentage};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BunkAnalysis {
    pub present: u32,
    pub total: u32,
    pub current_percentage: f64,
    pub max_safe_bunks: u32,
    pub classes_needed_if_below: u32,
    pub is_safe: bool,
    /// Distance from the target (not the safe zone); negative when below.
    pub buffer: f64,
}

/// What to tell the student about one subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    CanBunk(u32),
    MustAttend(u32),
    AttendAll,
}

impl BunkAnalysis {
    pub fn recommendation(&self) -> Recommendation {
        if self.is_safe && self.max_safe_bunks > 0 {
            Recommendation::CanBunk(self.max_safe_bunks)
        } else if self.classes_needed_if_below > 0 {
            Recommendation::MustAttend(self.classes_needed_if_below)
        } else {
            Recommendation::AttendAll
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BunkCalculator {
    pub target_percentage: f64,
    pub safety_buffer: f64,
}

impl Default for BunkCalculator {
    fn default() -> Self {
        Self {
            target_percentage: DEFAULT_TARGET,
            safety_buffer: DEFAULT_BUFFER,
        }
    }
}

impl BunkCalculator {
    pub fn new(target_percentage: f64, safety_buffer: f64) -> Self {
        Self {
            target_percentage,
            safety_buffer,
        }
    }

    /// Target plus buffer: the line a subject must stay on or above before
    /// any skipping is recommended.
    pub fn safe_target(&self) -> f64 {
        self.target_percentage + self.safety_buffer
    }

    pub fn calculate_bunk_allowance(
        &self,
        present: u32,
        total: u32,
        future_classes: u32,
    ) -> BunkAnalysis {
        let safe_target = self.safe_target();
        let current = percentage(present, total);

        // All or nothing: the check holds `total + future_classes` fixed and
        // never varies how many of the future classes are attended, so the
        // answer is either every future class or none of them. Downstream
        // advice depends on these exact numbers; do not turn this into a
        // per-class search without agreeing the change.
        let after_term = wide_percentage(present as u64, total as u64 + future_classes as u64);
        let max_safe_bunks = if after_term >= safe_target {
            future_classes
        } else {
            0
        };

        let classes_needed_if_below = if current < safe_target {
            self.classes_to_safe_zone(present, total)
        } else {
            0
        };

        BunkAnalysis {
            present,
            total,
            current_percentage: round2(current),
            max_safe_bunks,
            classes_needed_if_below,
            is_safe: current >= safe_target,
            buffer: round2(current - self.target_percentage),
        }
    }

    /// Smallest number of consecutive attended classes that lifts the
    /// percentage to the safe target.
    fn classes_to_safe_zone(&self, present: u32, total: u32) -> u32 {
        let safe_target = self.safe_target();
        let headroom = 100.0 - safe_target;
        if headroom <= 0.0 {
            warn!("safe target {safe_target}% cannot be reached by attending classes");
            return 0;
        }
        let deficit = safe_target * total as f64 - 100.0 * present as f64;
        let needed = (deficit / headroom).trunc() + 1.0;
        needed.max(0.0) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_target_below_safe_zone() {
        let analysis = BunkCalculator::new(75.0, 1.0).calculate_bunk_allowance(75, 100, 20);
        assert_eq!(analysis.current_percentage, 75.0);
        // 75 / 120 = 62.5% < 76%
        assert_eq!(analysis.max_safe_bunks, 0);
        // trunc((7600 - 7500) / 24) + 1 = 4 + 1
        assert_eq!(analysis.classes_needed_if_below, 5);
        assert!(!analysis.is_safe);
        assert_eq!(analysis.buffer, 0.0);
        assert_eq!(analysis.recommendation(), Recommendation::MustAttend(5));
    }

    #[test]
    fn five_more_classes_reach_the_safe_zone() {
        // (75 + 5) / (100 + 5) = 76.19% >= 76, four would give 75.96%
        let calc = BunkCalculator::default();
        assert!(calc.calculate_bunk_allowance(80, 105, 0).is_safe);
        assert!(!calc.calculate_bunk_allowance(79, 104, 0).is_safe);
    }

    #[test]
    fn max_safe_bunks_is_all_or_nothing() {
        let calc = BunkCalculator::default();
        // 90 / 110 = 81.8% keeps the safe zone even with every class skipped
        let analysis = calc.calculate_bunk_allowance(90, 100, 10);
        assert_eq!(analysis.max_safe_bunks, 10);
        assert!(analysis.is_safe);
        assert_eq!(analysis.classes_needed_if_below, 0);
        assert_eq!(analysis.buffer, 15.0);
        assert_eq!(analysis.recommendation(), Recommendation::CanBunk(10));

        // 90 / 120 = 75% drops under 76%, so nothing is skippable
        let analysis = calc.calculate_bunk_allowance(90, 100, 20);
        assert_eq!(analysis.max_safe_bunks, 0);
        assert!(analysis.is_safe);
        assert_eq!(analysis.recommendation(), Recommendation::AttendAll);
    }

    #[test]
    fn empty_subject_is_handled() {
        let analysis = BunkCalculator::default().calculate_bunk_allowance(0, 0, 0);
        assert_eq!(analysis.current_percentage, 0.0);
        assert_eq!(analysis.max_safe_bunks, 0);
        assert_eq!(analysis.classes_needed_if_below, 1);
        assert_eq!(analysis.buffer, -75.0);
        assert!(!analysis.is_safe);
    }

    #[test]
    fn unreachable_safe_target_needs_nothing() {
        let analysis = BunkCalculator::new(99.5, 1.0).calculate_bunk_allowance(10, 20, 5);
        assert_eq!(analysis.classes_needed_if_below, 0);
        assert!(!analysis.is_safe);
    }

    #[test]
    fn negative_buffer_is_rounded() {
        let analysis = BunkCalculator::default().calculate_bunk_allowance(2, 3, 0);
        assert_eq!(analysis.current_percentage, 66.67);
        assert_eq!(analysis.buffer, -8.33);
    }

    #[test]
    fn huge_future_does_not_overflow() {
        let analysis = BunkCalculator::default().calculate_bunk_allowance(10, 10, u32::MAX);
        assert_eq!(analysis.max_safe_bunks, 0);
        assert!(analysis.is_safe);

        let analysis = BunkCalculator::default().calculate_bunk_allowance(u32::MAX, u32::MAX, 1);
        assert_eq!(analysis.max_safe_bunks, 1);
    }

    #[test]
    fn identical_inputs_give_identical_output() {
        let calc = BunkCalculator::new(80.0, 2.5);
        let first = calc.calculate_bunk_allowance(41, 57, 13);
        let second = calc.calculate_bunk_allowance(41, 57, 13);
        assert_eq!(first, second);
        assert_eq!(first.current_percentage.to_bits(), second.current_percentage.to_bits());
    }
}
