use serde::{Deserialize, Serialize};

use super::{WARNING_BAND, round2, wide_percentage};
use crate::models::SubjectRecord;

/// Slack for `ceil` so a product a hair above a whole number is not bumped up.
const CEIL_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Safe,
    Warning,
    Danger,
    /// Below target with no way back before the term ends.
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "safe",
            RiskLevel::Warning => "warning",
            RiskLevel::Danger => "danger",
            RiskLevel::Critical => "critical",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RiskLevel::Safe => "Safe",
            RiskLevel::Warning => "Warning",
            RiskLevel::Danger => "Danger",
            RiskLevel::Critical => "Critical",
        }
    }

    /// Tier on the current percentage alone.
    pub fn classify(current_percentage: f64, target_percentage: f64) -> Self {
        if current_percentage < target_percentage {
            RiskLevel::Danger
        } else if current_percentage < target_percentage + WARNING_BAND {
            RiskLevel::Warning
        } else {
            RiskLevel::Safe
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub present: u32,
    pub total: u32,
    pub current_percentage: f64,
    pub remaining_classes: u32,
    pub classes_needed: u32,
    pub can_skip: u32,
    pub projected_percentage_if_attend_all: f64,
    pub projected_percentage_at_current_rate: f64,
    pub expected_total_for_semester: u32,
    pub risk_level: RiskLevel,
}

/// Project a subject to the end of term.
///
/// `remaining_classes` comes from the timetable walk or a flat estimate;
/// `expected_total` is the semester-long count for the same subject and is
/// only reported back. With nothing remaining no projection is attempted.
pub fn project(
    subject: &SubjectRecord,
    remaining_classes: u32,
    target_percentage: f64,
    expected_total: u32,
) -> CalculationResult {
    let present = subject.present;
    let total = subject.total;
    let current = subject.percentage();

    if remaining_classes == 0 {
        return CalculationResult {
            present,
            total,
            current_percentage: current,
            remaining_classes: 0,
            classes_needed: 0,
            can_skip: 0,
            projected_percentage_if_attend_all: current,
            projected_percentage_at_current_rate: current,
            expected_total_for_semester: 0,
            risk_level: RiskLevel::classify(current, target_percentage),
        };
    }

    let future_total = total as u64 + remaining_classes as u64;
    let required = (target_percentage * future_total as f64 / 100.0 - CEIL_EPSILON).ceil();
    let raw_needed = required - present as f64;
    let classes_needed = raw_needed.clamp(0.0, remaining_classes as f64) as u32;
    let can_skip = remaining_classes - classes_needed;

    let if_attend_all = wide_percentage(present as u64 + remaining_classes as u64, future_total);

    let rate = if total == 0 {
        0.0
    } else {
        present as f64 / total as f64
    };
    let at_current_rate = if future_total == 0 {
        0.0
    } else {
        (present as f64 + rate * remaining_classes as f64) / future_total as f64 * 100.0
    };

    let risk_level = if current < target_percentage && raw_needed > remaining_classes as f64 {
        RiskLevel::Critical
    } else {
        RiskLevel::classify(current, target_percentage)
    };

    CalculationResult {
        present,
        total,
        current_percentage: current,
        remaining_classes,
        classes_needed,
        can_skip,
        projected_percentage_if_attend_all: round2(if_attend_all),
        projected_percentage_at_current_rate: round2(at_current_rate),
        expected_total_for_semester: expected_total,
        risk_level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject(present: u32, total: u32) -> SubjectRecord {
        SubjectRecord::new("Maths", present, total).unwrap()
    }

    #[test]
    fn thirty_of_forty_with_ten_left() {
        let result = project(&subject(30, 40), 10, 75.0, 60);
        // ceil(0.75 * 50) - 30 = 38 - 30
        assert_eq!(result.classes_needed, 8);
        assert_eq!(result.can_skip, 2);
        assert_eq!(result.projected_percentage_if_attend_all, 80.0);
        assert_eq!(result.projected_percentage_at_current_rate, 75.0);
        assert_eq!(result.expected_total_for_semester, 60);
        assert_eq!(result.risk_level, RiskLevel::Warning);
    }

    #[test]
    fn need_is_clamped_to_zero_when_comfortable() {
        let result = project(&subject(45, 50), 10, 75.0, 0);
        assert_eq!(result.classes_needed, 0);
        assert_eq!(result.can_skip, 10);
        assert_eq!(result.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn unreachable_target_is_critical() {
        // ceil(0.75 * 50) - 10 = 28 > 10 remaining
        let result = project(&subject(10, 40), 10, 75.0, 0);
        assert_eq!(result.classes_needed, 10);
        assert_eq!(result.can_skip, 0);
        assert_eq!(result.projected_percentage_if_attend_all, 40.0);
        assert_eq!(result.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn reachable_deficit_is_danger() {
        // 35 / 50 = 70%, needs ceil(0.75 * 70) - 35 = 18 of 20
        let result = project(&subject(35, 50), 20, 75.0, 0);
        assert_eq!(result.classes_needed, 18);
        assert_eq!(result.can_skip, 2);
        assert_eq!(result.risk_level, RiskLevel::Danger);
    }

    #[test]
    fn tier_boundaries_belong_to_the_upper_tier() {
        assert_eq!(project(&subject(75, 100), 4, 75.0, 0).risk_level, RiskLevel::Warning);
        assert_eq!(project(&subject(85, 100), 4, 75.0, 0).risk_level, RiskLevel::Safe);
        assert_eq!(RiskLevel::classify(74.99, 75.0), RiskLevel::Danger);
        assert_eq!(RiskLevel::classify(84.99, 75.0), RiskLevel::Warning);
    }

    #[test]
    fn tiers_follow_a_custom_target() {
        assert_eq!(RiskLevel::classify(79.0, 80.0), RiskLevel::Danger);
        assert_eq!(RiskLevel::classify(80.0, 80.0), RiskLevel::Warning);
        assert_eq!(RiskLevel::classify(90.0, 80.0), RiskLevel::Safe);
    }

    #[test]
    fn ceil_ignores_float_noise() {
        // 70% of 30 is exactly 21
        let result = project(&subject(20, 20), 10, 70.0, 0);
        assert_eq!(result.classes_needed, 1);
    }

    #[test]
    fn nothing_remaining_collapses_projection() {
        let result = project(&subject(30, 40), 0, 75.0, 60);
        assert_eq!(result.classes_needed, 0);
        assert_eq!(result.can_skip, 0);
        assert_eq!(result.projected_percentage_if_attend_all, 75.0);
        assert_eq!(result.expected_total_for_semester, 0);
        assert_eq!(result.risk_level, RiskLevel::Warning);

        let below = project(&subject(10, 40), 0, 75.0, 0);
        assert_eq!(below.risk_level, RiskLevel::Danger);
    }

    #[test]
    fn fresh_subject_projects_from_zero() {
        let result = project(&subject(0, 0), 10, 75.0, 10);
        assert_eq!(result.current_percentage, 0.0);
        assert_eq!(result.classes_needed, 8);
        assert_eq!(result.can_skip, 2);
        assert_eq!(result.projected_percentage_if_attend_all, 100.0);
        assert_eq!(result.projected_percentage_at_current_rate, 0.0);
        assert_eq!(result.risk_level, RiskLevel::Danger);
    }

    #[test]
    fn huge_remaining_does_not_overflow() {
        let result = project(&subject(10, 10), u32::MAX, 75.0, 0);
        assert_eq!(result.remaining_classes, u32::MAX);
        assert_eq!(result.classes_needed + result.can_skip, u32::MAX);
        assert_eq!(result.projected_percentage_if_attend_all, 100.0);
        assert_eq!(result.projected_percentage_at_current_rate, 100.0);
        assert_eq!(result.risk_level, RiskLevel::Safe);
    }

    #[test]
    fn identical_inputs_give_identical_projection() {
        let first = project(&subject(41, 57), 23, 80.0, 90);
        let second = project(&subject(41, 57), 23, 80.0, 90);
        assert_eq!(first, second);
        assert_eq!(
            first.projected_percentage_at_current_rate.to_bits(),
            second.projected_percentage_at_current_rate.to_bits()
        );
        assert_eq!(
            first.projected_percentage_if_attend_all.to_bits(),
            second.projected_percentage_if_attend_all.to_bits()
        );
    }

    #[test]
    fn serializes_risk_in_lowercase() {
        let json = serde_json::to_value(project(&subject(10, 40), 10, 75.0, 0)).unwrap();
        assert_eq!(json["risk_level"], "critical");
        assert_eq!(json["classes_needed"], 10);
    }
}
