use crate::calc::{percentage, round2};
use crate::models::AttendanceError;

/// Attendance counts for one subject. The percentage is always derived from
/// the counts, never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRecord {
    pub name: String,
    pub present: u32,
    pub total: u32,
}

impl SubjectRecord {
    pub fn new(name: impl Into<String>, present: u32, total: u32) -> Result<Self, AttendanceError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AttendanceError::EmptyName);
        }
        if present > total {
            return Err(AttendanceError::PresentExceedsTotal {
                subject: name,
                present,
                total,
            });
        }
        Ok(Self {
            name,
            present,
            total,
        })
    }

    /// Percentage rounded to two places, 0 when no class has been held.
    pub fn percentage(&self) -> f64 {
        round2(percentage(self.present, self.total))
    }

    pub fn missed(&self) -> u32 {
        self.total - self.present
    }

    pub fn attended_one(&self) -> Self {
        Self {
            name: self.name.clone(),
            present: self.present + 1,
            total: self.total + 1,
        }
    }

    pub fn missed_one(&self) -> Self {
        Self {
            name: self.name.clone(),
            present: self.present,
            total: self.total + 1,
        }
    }
}

/// Counts typed in by hand must describe at least one held class.
pub fn validate_manual_counts(name: &str, present: u32, total: u32) -> Result<(), AttendanceError> {
    if name.trim().is_empty() {
        return Err(AttendanceError::EmptyName);
    }
    if total == 0 {
        return Err(AttendanceError::NoClassesHeld(name.to_string()));
    }
    if present > total {
        return Err(AttendanceError::PresentExceedsTotal {
            subject: name.to_string(),
            present,
            total,
        });
    }
    Ok(())
}
