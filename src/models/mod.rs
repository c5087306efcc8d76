pub mod error;
pub mod refresh;
pub mod subject;
pub mod timetable;

pub use error::AttendanceError;
pub use refresh::RefreshRecord;
pub use subject::{SubjectRecord, validate_manual_counts};
pub use timetable::{SemesterWindow, TimetableEntry};
