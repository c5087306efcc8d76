use serde::{Deserialize, Serialize};

use super::{RiskLevel, percentage, round2};
use crate::models::SubjectRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub subjects: usize,
    pub safe: usize,
    pub warning: usize,
    pub danger: usize,
    pub total_present: u64,
    pub total_classes: u64,
    /// Pooled over every class held, not averaged over subjects.
    pub overall_percentage: f64,
}

impl AggregateStats {
    pub fn from_subjects(subjects: &[SubjectRecord], target_percentage: f64) -> Self {
        let mut stats = AggregateStats {
            subjects: subjects.len(),
            ..Default::default()
        };

        for subject in subjects {
            match RiskLevel::classify(subject.percentage(), target_percentage) {
                RiskLevel::Safe => stats.safe += 1,
                RiskLevel::Warning => stats.warning += 1,
                RiskLevel::Danger | RiskLevel::Critical => stats.danger += 1,
            }
            stats.total_present += subject.present as u64;
            stats.total_classes += subject.total as u64;
        }

        stats.overall_percentage = round2(stats.raw_overall());
        stats
    }

    fn raw_overall(&self) -> f64 {
        if self.total_classes == 0 {
            0.0
        } else {
            self.total_present as f64 / self.total_classes as f64 * 100.0
        }
    }

    /// Mean of per-subject percentages. Only for comparison; the overall
    /// figure is the one to report.
    pub fn mean_of_subjects(subjects: &[SubjectRecord]) -> f64 {
        if subjects.is_empty() {
            return 0.0;
        }
        let sum: f64 = subjects
            .iter()
            .map(|s| percentage(s.present, s.total))
            .sum();
        round2(sum / subjects.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subjects(counts: &[(u32, u32)]) -> Vec<SubjectRecord> {
        counts
            .iter()
            .enumerate()
            .map(|(i, (p, t))| SubjectRecord::new(format!("S{i}"), *p, *t).unwrap())
            .collect()
    }

    #[test]
    fn overall_is_pooled_not_averaged() {
        let list = subjects(&[(9, 10), (1, 20)]);
        let stats = AggregateStats::from_subjects(&list, 75.0);
        assert_eq!(stats.overall_percentage, 33.33);
        assert_eq!(AggregateStats::mean_of_subjects(&list), 47.5);
        assert_eq!(stats.total_present, 10);
        assert_eq!(stats.total_classes, 30);
    }

    #[test]
    fn counts_each_tier() {
        let list = subjects(&[(85, 100), (75, 100), (84, 100), (74, 100), (0, 0)]);
        let stats = AggregateStats::from_subjects(&list, 75.0);
        assert_eq!(stats.subjects, 5);
        assert_eq!(stats.safe, 1);
        assert_eq!(stats.warning, 2);
        assert_eq!(stats.danger, 2);
    }

    #[test]
    fn no_classes_means_zero_overall() {
        let stats = AggregateStats::from_subjects(&subjects(&[(0, 0), (0, 0)]), 75.0);
        assert_eq!(stats.overall_percentage, 0.0);

        let empty = AggregateStats::from_subjects(&[], 75.0);
        assert_eq!(empty, AggregateStats::default());
    }
}
