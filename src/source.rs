//! Seams between the calculation engine and wherever the counts live.

use anyhow::Result;

use crate::models::{SubjectRecord, TimetableEntry};

/// Anything that can hand over a user's per-subject counts.
pub trait SubjectSource {
    fn subjects(&self, user: &str) -> Result<Vec<SubjectRecord>>;
}

pub trait TimetableSource {
    fn timetable(&self, user: &str) -> Result<Vec<TimetableEntry>>;
}

/// No timetable at all; projections fall back to the flat estimate.
pub struct NoTimetable;

impl TimetableSource for NoTimetable {
    fn timetable(&self, _user: &str) -> Result<Vec<TimetableEntry>> {
        Ok(Vec::new())
    }
}
