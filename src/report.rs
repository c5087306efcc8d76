use anyhow::Result;
use chrono::NaiveDate;
use log::debug;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;

use crate::calc::{
    AggregateStats, BunkAnalysis, BunkCalculator, CalculationResult, WeeklySchedule,
    flat_remaining, project,
};
use crate::config::AppConfig;
use crate::models::{SemesterWindow, SubjectRecord, TimetableEntry};
use crate::source::{SubjectSource, TimetableSource};

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub target_percentage: f64,
    pub safety_buffer: f64,
    pub future_classes: u32,
    pub weekly_classes: u32,
    pub semester: Option<SemesterWindow>,
    /// Known even without a start date; enough for the weekly estimate.
    pub semester_end: Option<NaiveDate>,
    pub today: NaiveDate,
}

impl ReportOptions {
    pub fn from_config(config: &AppConfig, today: NaiveDate) -> Self {
        Self {
            target_percentage: config.attendance.target_percentage,
            safety_buffer: config.attendance.safety_buffer,
            future_classes: config.attendance.future_classes,
            weekly_classes: config.attendance.weekly_classes,
            semester: config.semester_window(),
            semester_end: config.semester.end,
            today,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EstimateSource {
    Timetable,
    Weekly,
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemesterInfo {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub has_timetable: bool,
    pub days_left: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubjectReport {
    pub name: String,
    pub projection: CalculationResult,
    pub bunk: BunkAnalysis,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendanceReport {
    pub generated_on: NaiveDate,
    pub user: String,
    pub target_percentage: f64,
    pub safety_buffer: f64,
    pub future_classes: u32,
    pub estimate: EstimateSource,
    pub semester: Option<SemesterInfo>,
    pub subjects: Vec<SubjectReport>,
    pub stats: AggregateStats,
}

/// Expected and remaining classes per subject, keyed by lowercase name.
struct ClassEstimates {
    source: EstimateSource,
    expected: HashMap<String, u32>,
    remaining: HashMap<String, u32>,
}

impl ClassEstimates {
    fn build(
        subjects: &[SubjectRecord],
        entries: &[TimetableEntry],
        options: &ReportOptions,
    ) -> Self {
        let schedule = WeeklySchedule::from_entries(entries);
        // Timetable names may differ in case from the recorded subjects.
        let lower = |map: HashMap<String, u32>| -> HashMap<String, u32> {
            let mut folded = HashMap::new();
            for (name, count) in map {
                *folded.entry(name.to_lowercase()).or_insert(0) += count;
            }
            folded
        };

        if let Some(window) = options.semester.filter(|_| !schedule.is_empty()) {
            return Self {
                source: EstimateSource::Timetable,
                expected: lower(schedule.expected_classes(&window)),
                remaining: lower(schedule.remaining_classes(&window, options.today)),
            };
        }

        match options.semester_end {
            Some(end) if options.weekly_classes > 0 => {
                let start = options.semester.map(|w| w.start);
                let remaining = flat_remaining(options.weekly_classes, options.today, end);
                let expected = start
                    .map(|s| flat_remaining(options.weekly_classes, s, end))
                    .unwrap_or(0);
                let per_subject = |count: u32| -> HashMap<String, u32> {
                    subjects
                        .iter()
                        .map(|s| (s.name.to_lowercase(), count))
                        .collect()
                };
                Self {
                    source: EstimateSource::Weekly,
                    expected: per_subject(expected),
                    remaining: per_subject(remaining),
                }
            }
            _ => Self {
                source: EstimateSource::None,
                expected: HashMap::new(),
                remaining: HashMap::new(),
            },
        }
    }

    fn expected(&self, subject: &str) -> u32 {
        self.expected.get(&subject.to_lowercase()).copied().unwrap_or(0)
    }

    fn remaining(&self, subject: &str) -> u32 {
        self.remaining.get(&subject.to_lowercase()).copied().unwrap_or(0)
    }
}

/// Pull counts and timetable from their sources and run every calculation.
pub fn build_report(
    subjects: &dyn SubjectSource,
    timetable: &dyn TimetableSource,
    user: &str,
    options: &ReportOptions,
) -> Result<AttendanceReport> {
    let records = subjects.subjects(user)?;
    let entries = timetable.timetable(user)?;
    debug!(
        "building report for {}: {} subjects, {} timetable slots",
        user,
        records.len(),
        entries.len()
    );
    Ok(assemble(records, &entries, user, options))
}

pub fn assemble(
    records: Vec<SubjectRecord>,
    entries: &[TimetableEntry],
    user: &str,
    options: &ReportOptions,
) -> AttendanceReport {
    let estimates = ClassEstimates::build(&records, entries, options);
    let calculator = BunkCalculator::new(options.target_percentage, options.safety_buffer);

    let subjects = records
        .iter()
        .map(|record| SubjectReport {
            name: record.name.clone(),
            projection: project(
                record,
                estimates.remaining(&record.name),
                options.target_percentage,
                estimates.expected(&record.name),
            ),
            bunk: calculator.calculate_bunk_allowance(
                record.present,
                record.total,
                options.future_classes,
            ),
        })
        .collect();

    let semester = options.semester.map(|window| SemesterInfo {
        start: window.start,
        end: window.end,
        has_timetable: !entries.is_empty(),
        days_left: window.days_left(options.today),
    });

    AttendanceReport {
        generated_on: options.today,
        user: user.to_string(),
        target_percentage: options.target_percentage,
        safety_buffer: options.safety_buffer,
        future_classes: options.future_classes,
        estimate: estimates.source,
        semester,
        subjects,
        stats: AggregateStats::from_subjects(&records, options.target_percentage),
    }
}

/// Subjects grouped the way the bunk advice is given: below target,
/// between target and the safe zone, and safe with classes to spare.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BunkAdvice {
    pub below_target: Vec<(String, u32)>,
    pub near_target: Vec<(String, f64)>,
    pub safe: usize,
    pub bunkable: Vec<(String, u32)>,
}

impl AttendanceReport {
    pub fn safe_target(&self) -> f64 {
        self.target_percentage + self.safety_buffer
    }

    pub fn bunk_advice(&self) -> BunkAdvice {
        let mut advice = BunkAdvice::default();
        for subject in &self.subjects {
            let bunk = &subject.bunk;
            if bunk.current_percentage < self.target_percentage {
                advice
                    .below_target
                    .push((subject.name.clone(), bunk.classes_needed_if_below));
            } else if bunk.current_percentage < self.safe_target() {
                advice.near_target.push((subject.name.clone(), bunk.buffer));
            } else {
                advice.safe += 1;
                if bunk.max_safe_bunks > 0 {
                    advice
                        .bunkable
                        .push((subject.name.clone(), bunk.max_safe_bunks));
                }
            }
        }
        advice.bunkable.sort_by(|a, b| b.1.cmp(&a.1));
        advice
    }
}

/// Plain-text summary for `export --format text`.
pub fn render_text(report: &AttendanceReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# bunkwise attendance summary");
    let _ = writeln!(output, "# {} ({})", report.generated_on, report.user);
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Target: {}% (safe zone {}%)",
        report.target_percentage,
        report.safe_target()
    );
    if let Some(semester) = &report.semester {
        let _ = writeln!(
            output,
            "Semester: {} to {} ({} days left{})",
            semester.start,
            semester.end,
            semester.days_left,
            if semester.has_timetable { ", timetable" } else { "" }
        );
    }
    let _ = writeln!(output);

    let _ = writeln!(output, "## Subjects");
    if report.subjects.is_empty() {
        let _ = writeln!(output, "  No subjects recorded.");
    }
    for subject in &report.subjects {
        let p = &subject.projection;
        let _ = writeln!(
            output,
            "  {:<24} {:>4}/{:<4} {:>6.2}%  {:<8}  need {:>3}  skip {:>3}  left {:>3}",
            subject.name,
            p.present,
            p.total,
            p.current_percentage,
            p.risk_level.as_str(),
            p.classes_needed,
            p.can_skip,
            p.remaining_classes
        );
    }
    let _ = writeln!(output);

    let stats = &report.stats;
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(
        output,
        "  Overall:  {:.2}% ({}/{})",
        stats.overall_percentage, stats.total_present, stats.total_classes
    );
    let _ = writeln!(
        output,
        "  Safe: {}  ·  Warning: {}  ·  Danger: {}",
        stats.safe, stats.warning, stats.danger
    );

    let advice = report.bunk_advice();
    if !advice.below_target.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Attend everything");
        for (name, needed) in &advice.below_target {
            let _ = writeln!(output, "  {}: need {} more classes", name, needed);
        }
    }
    if !advice.bunkable.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Safe to bunk ({} future classes)", report.future_classes);
        for (name, bunks) in &advice.bunkable {
            let _ = writeln!(output, "  {}: up to {} classes", name, bunks);
        }
    }

    output
}
