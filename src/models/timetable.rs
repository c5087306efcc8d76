use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::models::AttendanceError;

/// One weekly recurring class slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableEntry {
    pub id: Option<i64>,
    pub subject: String,
    pub day: Weekday,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl TimetableEntry {
    /// Day index as stored, Monday = 0.
    pub fn day_index(&self) -> u8 {
        self.day.num_days_from_monday() as u8
    }
}

pub fn weekday_from_index(index: u8) -> Result<Weekday, AttendanceError> {
    match index {
        0 => Ok(Weekday::Mon),
        1 => Ok(Weekday::Tue),
        2 => Ok(Weekday::Wed),
        3 => Ok(Weekday::Thu),
        4 => Ok(Weekday::Fri),
        5 => Ok(Weekday::Sat),
        6 => Ok(Weekday::Sun),
        _ => Err(AttendanceError::InvalidDay(index.to_string())),
    }
}

/// Accepts `mon`, `Monday`, or a 0-6 index.
pub fn parse_weekday(s: &str) -> Result<Weekday, AttendanceError> {
    let s = s.trim();
    if let Ok(index) = s.parse::<u8>() {
        return weekday_from_index(index);
    }
    s.parse::<Weekday>()
        .map_err(|_| AttendanceError::InvalidDay(s.to_string()))
}

pub fn parse_time(s: &str) -> Result<NaiveTime, AttendanceError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| AttendanceError::InvalidTime(s.to_string()))
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Inclusive semester date range. An inverted window is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemesterWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SemesterWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Calendar days left including `today`, 0 once the term is over.
    pub fn days_left(&self, today: NaiveDate) -> i64 {
        let from = today.max(self.start);
        if from > self.end {
            0
        } else {
            (self.end - from).num_days() + 1
        }
    }
}
