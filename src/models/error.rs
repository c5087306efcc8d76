use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum AttendanceError {
    #[error("Subject name cannot be empty")]
    EmptyName,

    #[error("{subject}: present ({present}) cannot exceed total ({total})")]
    PresentExceedsTotal {
        subject: String,
        present: u32,
        total: u32,
    },

    #[error("{0}: total must be greater than 0")]
    NoClassesHeld(String),

    #[error("Subject \"{0}\" already exists")]
    DuplicateSubject(String),

    #[error("Subject \"{0}\" not found")]
    SubjectNotFound(String),

    #[error("Unknown day '{0}'. Use a name like mon or monday, or 0-6 with Monday = 0")]
    InvalidDay(String),

    #[error("Bad time '{0}', expected HH:MM")]
    InvalidTime(String),

    #[error("Timetable slot {0} not found")]
    SlotNotFound(i64),
}
