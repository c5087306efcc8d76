use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::{SemesterWindow, TimetableEntry};

/// Count how often each enabled weekday occurs in `start..=end`.
///
/// The result has exactly one key per enabled day. An inverted range is
/// treated as empty and yields zero for every requested day.
pub fn count_working_days(
    start: NaiveDate,
    end: NaiveDate,
    enabled_days: &[Weekday],
) -> HashMap<Weekday, u32> {
    let mut counts: HashMap<Weekday, u32> = enabled_days.iter().map(|d| (*d, 0)).collect();

    for day in start.iter_days().take_while(|d| *d <= end) {
        if let Some(count) = counts.get_mut(&day.weekday()) {
            *count += 1;
        }
    }
    counts
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledClass {
    pub subject: String,
    pub classes: u32,
}

/// Timetable slots grouped by weekday, with the number of slots each
/// subject holds on that day.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklySchedule {
    days: HashMap<Weekday, Vec<ScheduledClass>>,
}

impl WeeklySchedule {
    pub fn from_entries(entries: &[TimetableEntry]) -> Self {
        let mut days: HashMap<Weekday, Vec<ScheduledClass>> = HashMap::new();
        for entry in entries {
            let slots = days.entry(entry.day).or_default();
            match slots.iter_mut().find(|s| s.subject == entry.subject) {
                Some(slot) => slot.classes += 1,
                None => slots.push(ScheduledClass {
                    subject: entry.subject.clone(),
                    classes: 1,
                }),
            }
        }
        Self { days }
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(|slots| slots.is_empty())
    }

    /// Weekdays with at least one class, Monday first.
    pub fn enabled_days(&self) -> Vec<Weekday> {
        let mut days: Vec<Weekday> = self
            .days
            .iter()
            .filter(|(_, slots)| !slots.is_empty())
            .map(|(day, _)| *day)
            .collect();
        days.sort_by_key(|d| d.num_days_from_monday());
        days
    }

    pub fn classes_on(&self, day: Weekday) -> &[ScheduledClass] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Classes per subject over the whole semester window.
    pub fn expected_classes(&self, window: &SemesterWindow) -> HashMap<String, u32> {
        let counts = count_working_days(window.start, window.end, &self.enabled_days());
        classes_per_subject(self, &counts)
    }

    /// Classes per subject still to be held from `today` to the end of the
    /// window. The walk always starts at `today`, even before the semester.
    pub fn remaining_classes(
        &self,
        window: &SemesterWindow,
        today: NaiveDate,
    ) -> HashMap<String, u32> {
        let counts = count_working_days(today, window.end, &self.enabled_days());
        classes_per_subject(self, &counts)
    }
}

/// Multiply each day's `classes` by how often that day occurs and sum per
/// subject.
pub fn classes_per_subject(
    schedule: &WeeklySchedule,
    day_counts: &HashMap<Weekday, u32>,
) -> HashMap<String, u32> {
    let mut totals: HashMap<String, u32> = HashMap::new();
    for (day, occurrences) in day_counts {
        for slot in schedule.classes_on(*day) {
            *totals.entry(slot.subject.clone()).or_insert(0) += slot.classes * occurrences;
        }
    }
    totals
}

/// Flat estimate for when there is no timetable: `weekly_classes` for every
/// started week left in `today..=end`.
pub fn flat_remaining(weekly_classes: u32, today: NaiveDate, end: NaiveDate) -> u32 {
    if today > end {
        return 0;
    }
    let days = (end - today).num_days() + 1;
    let weeks = ((days + 6) / 7) as u32;
    weekly_classes * weeks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn slot(subject: &str, day: Weekday, hour: u32) -> TimetableEntry {
        TimetableEntry {
            id: None,
            subject: subject.to_string(),
            day,
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
        }
    }

    #[test]
    fn counts_first_week_of_2024() {
        let counts = count_working_days(
            date(2024, 1, 1),
            date(2024, 1, 7),
            &[Weekday::Mon, Weekday::Wed],
        );
        assert_eq!(counts.len(), 2);
        assert_eq!(counts[&Weekday::Mon], 1);
        assert_eq!(counts[&Weekday::Wed], 1);
    }

    #[test]
    fn range_is_inclusive_on_both_ends() {
        // 2024-01-01 and 2024-01-08 are both Mondays
        let counts = count_working_days(date(2024, 1, 1), date(2024, 1, 8), &[Weekday::Mon]);
        assert_eq!(counts[&Weekday::Mon], 2);
    }

    #[test]
    fn inverted_range_yields_zeroes() {
        let counts = count_working_days(
            date(2024, 2, 1),
            date(2024, 1, 1),
            &[Weekday::Mon, Weekday::Fri],
        );
        assert_eq!(counts.len(), 2);
        assert!(counts.values().all(|c| *c == 0));
    }

    #[test]
    fn disabled_days_have_no_entry() {
        let counts = count_working_days(date(2024, 1, 1), date(2024, 1, 31), &[Weekday::Tue]);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts[&Weekday::Tue], 5);
        assert!(!counts.contains_key(&Weekday::Mon));
    }

    #[test]
    fn schedule_groups_slots_per_day() {
        let schedule = WeeklySchedule::from_entries(&[
            slot("Maths", Weekday::Mon, 9),
            slot("Maths", Weekday::Mon, 11),
            slot("Physics", Weekday::Mon, 14),
            slot("Physics", Weekday::Thu, 9),
        ]);
        assert_eq!(schedule.enabled_days(), vec![Weekday::Mon, Weekday::Thu]);
        let monday = schedule.classes_on(Weekday::Mon);
        assert_eq!(monday.len(), 2);
        assert_eq!(monday[0].subject, "Maths");
        assert_eq!(monday[0].classes, 2);
        assert!(schedule.classes_on(Weekday::Sun).is_empty());
    }

    #[test]
    fn expected_and_remaining_classes_per_subject() {
        let schedule = WeeklySchedule::from_entries(&[
            slot("Maths", Weekday::Mon, 9),
            slot("Maths", Weekday::Mon, 11),
            slot("Physics", Weekday::Wed, 9),
        ]);
        // January 2024: five Mondays, five Wednesdays
        let window = SemesterWindow::new(date(2024, 1, 1), date(2024, 1, 31));

        let expected = schedule.expected_classes(&window);
        assert_eq!(expected["Maths"], 10);
        assert_eq!(expected["Physics"], 5);
        assert!(!expected.contains_key("Chemistry"));

        // From Thursday the 25th: one Monday (29th), one Wednesday (31st)
        let remaining = schedule.remaining_classes(&window, date(2024, 1, 25));
        assert_eq!(remaining["Maths"], 2);
        assert_eq!(remaining["Physics"], 1);
    }

    #[test]
    fn remaining_before_semester_counts_from_today() {
        let schedule = WeeklySchedule::from_entries(&[slot("Maths", Weekday::Mon, 9)]);
        let window = SemesterWindow::new(date(2024, 1, 1), date(2024, 1, 7));
        // Mondays Dec 4, 11, 18, 25 and Jan 1
        let remaining = schedule.remaining_classes(&window, date(2023, 12, 1));
        assert_eq!(remaining["Maths"], 5);
    }

    #[test]
    fn repeated_counts_are_identical() {
        let days = [Weekday::Mon, Weekday::Wed, Weekday::Fri];
        let first = count_working_days(date(2024, 1, 3), date(2024, 5, 17), &days);
        let second = count_working_days(date(2024, 1, 3), date(2024, 5, 17), &days);
        assert_eq!(first, second);
    }

    #[test]
    fn remaining_after_semester_is_zero() {
        let schedule = WeeklySchedule::from_entries(&[slot("Maths", Weekday::Mon, 9)]);
        let window = SemesterWindow::new(date(2024, 1, 1), date(2024, 1, 31));
        let remaining = schedule.remaining_classes(&window, date(2024, 3, 1));
        assert_eq!(remaining.get("Maths").copied().unwrap_or(0), 0);
    }

    #[test]
    fn flat_estimate_counts_started_weeks() {
        assert_eq!(flat_remaining(3, date(2024, 1, 1), date(2024, 1, 7)), 3);
        assert_eq!(flat_remaining(3, date(2024, 1, 1), date(2024, 1, 8)), 6);
        assert_eq!(flat_remaining(3, date(2024, 1, 9), date(2024, 1, 8)), 0);
        assert_eq!(flat_remaining(0, date(2024, 1, 1), date(2024, 5, 1)), 0);
    }
}
