use anyhow::Result;
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension, params};

use crate::models::timetable::{parse_time, weekday_from_index};
use crate::models::{AttendanceError, RefreshRecord, SubjectRecord, TimetableEntry};
use crate::source::{SubjectSource, TimetableSource};

fn to_sql_err(e: AttendanceError) -> rusqlite::Error {
    rusqlite::Error::InvalidParameterName(e.to_string())
}

// ─── Subjects ───────────────────────────────────────────────────────────────

pub struct SubjectRepo;

impl SubjectRepo {
    pub fn list(conn: &Connection, user: &str) -> Result<Vec<SubjectRecord>> {
        let mut stmt = conn.prepare(
            "SELECT name, present, total FROM subjects
             WHERE user_name = ?1
             ORDER BY name COLLATE NOCASE",
        )?;

        let rows = stmt.query_map(params![user], |row| {
            Ok(SubjectRecord {
                name: row.get(0)?,
                present: row.get(1)?,
                total: row.get(2)?,
            })
        })?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(anyhow::Error::from)
    }

    /// Case-insensitive lookup by name.
    pub fn get(conn: &Connection, user: &str, name: &str) -> Result<Option<SubjectRecord>> {
        conn.query_row(
            "SELECT name, present, total FROM subjects
             WHERE user_name = ?1 AND name = ?2 COLLATE NOCASE",
            params![user, name],
            |row| {
                Ok(SubjectRecord {
                    name: row.get(0)?,
                    present: row.get(1)?,
                    total: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn add(conn: &Connection, user: &str, subject: &SubjectRecord) -> Result<()> {
        if Self::get(conn, user, &subject.name)?.is_some() {
            return Err(AttendanceError::DuplicateSubject(subject.name.clone()).into());
        }
        conn.execute(
            "INSERT INTO subjects (user_name, name, present, total) VALUES (?1, ?2, ?3, ?4)",
            params![user, subject.name, subject.present, subject.total],
        )?;
        debug!("added subject {} for {}", subject.name, user);
        Ok(())
    }

    /// Overwrite the counts of an existing subject and return the stored row.
    pub fn update(
        conn: &Connection,
        user: &str,
        name: &str,
        present: u32,
        total: u32,
    ) -> Result<SubjectRecord> {
        let existing = Self::get(conn, user, name)?
            .ok_or_else(|| AttendanceError::SubjectNotFound(name.to_string()))?;
        let updated = SubjectRecord::new(existing.name, present, total)?;
        conn.execute(
            "UPDATE subjects SET present = ?1, total = ?2, updated_at = datetime('now')
             WHERE user_name = ?3 AND name = ?4",
            params![updated.present, updated.total, user, updated.name],
        )?;
        Ok(updated)
    }

    pub fn upsert(conn: &Connection, user: &str, subject: &SubjectRecord) -> Result<()> {
        conn.execute(
            "INSERT INTO subjects (user_name, name, present, total) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(user_name, name) DO UPDATE
             SET present = ?3, total = ?4, updated_at = datetime('now')",
            params![user, subject.name, subject.present, subject.total],
        )?;
        Ok(())
    }

    pub fn delete(conn: &Connection, user: &str, name: &str) -> Result<()> {
        let removed = conn.execute(
            "DELETE FROM subjects WHERE user_name = ?1 AND name = ?2 COLLATE NOCASE",
            params![user, name],
        )?;
        if removed == 0 {
            return Err(AttendanceError::SubjectNotFound(name.to_string()).into());
        }
        Ok(())
    }

    /// Count one more held class, attended or not.
    pub fn record_class(
        conn: &Connection,
        user: &str,
        name: &str,
        attended: bool,
    ) -> Result<SubjectRecord> {
        let existing = Self::get(conn, user, name)?
            .ok_or_else(|| AttendanceError::SubjectNotFound(name.to_string()))?;
        let next = if attended {
            existing.attended_one()
        } else {
            existing.missed_one()
        };
        Self::upsert(conn, user, &next)?;
        Ok(next)
    }

    /// Store a full snapshot of counts and log the refresh. Subjects missing
    /// from the snapshot are left alone.
    pub fn save_snapshot(
        conn: &Connection,
        user: &str,
        subjects: &[SubjectRecord],
        source: &str,
    ) -> Result<usize> {
        let tx = conn.unchecked_transaction()?;
        for subject in subjects {
            Self::upsert(&tx, user, subject)?;
        }
        RefreshRepo::record(&tx, user, subjects.len() as u32, source)?;
        tx.commit()?;
        info!("saved {} subjects for {} from {}", subjects.len(), user, source);
        Ok(subjects.len())
    }
}

// ─── Timetable ──────────────────────────────────────────────────────────────

pub struct TimetableRepo;

impl TimetableRepo {
    pub fn list(conn: &Connection, user: &str) -> Result<Vec<TimetableEntry>> {
        let mut stmt = conn.prepare(
            "SELECT id, subject, day, start_time, end_time FROM timetable
             WHERE user_name = ?1
             ORDER BY day, start_time, id",
        )?;

        let rows = stmt.query_map(params![user], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u8>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut result = Vec::new();
        for r in rows {
            let (id, subject, day, start_time, end_time) = r?;
            result.push(TimetableEntry {
                id: Some(id),
                subject,
                day: weekday_from_index(day).map_err(to_sql_err)?,
                start_time: parse_time(&start_time).map_err(to_sql_err)?,
                end_time: parse_time(&end_time).map_err(to_sql_err)?,
            });
        }
        Ok(result)
    }

    pub fn add(conn: &Connection, user: &str, entry: &TimetableEntry) -> Result<i64> {
        conn.execute(
            "INSERT INTO timetable (user_name, subject, day, start_time, end_time)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user,
                entry.subject,
                entry.day_index(),
                entry.start_time.format("%H:%M").to_string(),
                entry.end_time.format("%H:%M").to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn remove(conn: &Connection, user: &str, id: i64) -> Result<()> {
        let removed = conn.execute(
            "DELETE FROM timetable WHERE user_name = ?1 AND id = ?2",
            params![user, id],
        )?;
        if removed == 0 {
            return Err(AttendanceError::SlotNotFound(id).into());
        }
        Ok(())
    }

    pub fn clear(conn: &Connection, user: &str) -> Result<usize> {
        let removed = conn.execute("DELETE FROM timetable WHERE user_name = ?1", params![user])?;
        Ok(removed)
    }
}

// ─── Refresh history ────────────────────────────────────────────────────────

pub struct RefreshRepo;

impl RefreshRepo {
    pub fn record(conn: &Connection, user: &str, subject_count: u32, source: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO refresh_history (user_name, subject_count, source) VALUES (?1, ?2, ?3)",
            params![user, subject_count, source],
        )?;
        Ok(())
    }

    pub fn last(conn: &Connection, user: &str) -> Result<Option<RefreshRecord>> {
        conn.query_row(
            "SELECT refreshed_at, subject_count, source FROM refresh_history
             WHERE user_name = ?1
             ORDER BY refreshed_at DESC, id DESC LIMIT 1",
            params![user],
            |row| {
                Ok(RefreshRecord {
                    refreshed_at: row.get(0)?,
                    subject_count: row.get(1)?,
                    source: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(anyhow::Error::from)
    }
}

// ─── App meta ────────────────────────────────────────────────────────────────

pub struct MetaRepo;

impl MetaRepo {
    pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
        conn.query_row(
            "SELECT value FROM app_meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(anyhow::Error::from)
    }

    pub fn set(conn: &Connection, key: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO app_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}

// ─── Source adapter ─────────────────────────────────────────────────────────

/// Exposes a connection through the calculation engine's source traits.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SubjectSource for SqliteStore<'_> {
    fn subjects(&self, user: &str) -> Result<Vec<SubjectRecord>> {
        SubjectRepo::list(self.conn, user)
    }
}

impl TimetableSource for SqliteStore<'_> {
    fn timetable(&self, user: &str) -> Result<Vec<TimetableEntry>> {
        TimetableRepo::list(self.conn, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::timetable::parse_weekday;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn subject(name: &str, present: u32, total: u32) -> SubjectRecord {
        SubjectRecord::new(name, present, total).unwrap()
    }

    #[test]
    fn subjects_are_listed_by_name_per_user() {
        let conn = conn();
        SubjectRepo::add(&conn, "asha", &subject("physics", 8, 10)).unwrap();
        SubjectRepo::add(&conn, "asha", &subject("Maths", 30, 40)).unwrap();
        SubjectRepo::add(&conn, "ravi", &subject("Maths", 1, 2)).unwrap();

        let list = SubjectRepo::list(&conn, "asha").unwrap();
        let names: Vec<&str> = list.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Maths", "physics"]);
        assert_eq!(list[0].present, 30);
        assert_eq!(SubjectRepo::list(&conn, "ravi").unwrap().len(), 1);
    }

    #[test]
    fn duplicate_names_are_rejected_ignoring_case() {
        let conn = conn();
        SubjectRepo::add(&conn, "asha", &subject("Maths", 3, 4)).unwrap();
        let err = SubjectRepo::add(&conn, "asha", &subject("MATHS", 1, 1)).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AttendanceError>(),
            Some(&AttendanceError::DuplicateSubject("MATHS".to_string()))
        );
    }

    #[test]
    fn update_keeps_stored_name_and_validates() {
        let conn = conn();
        SubjectRepo::add(&conn, "asha", &subject("Maths", 3, 4)).unwrap();
        let updated = SubjectRepo::update(&conn, "asha", "maths", 9, 12).unwrap();
        assert_eq!(updated.name, "Maths");
        assert_eq!(SubjectRepo::get(&conn, "asha", "Maths").unwrap(), Some(updated));

        assert!(SubjectRepo::update(&conn, "asha", "Maths", 13, 12).is_err());
        let missing = SubjectRepo::update(&conn, "asha", "Art", 1, 1).unwrap_err();
        assert!(matches!(
            missing.downcast_ref::<AttendanceError>(),
            Some(AttendanceError::SubjectNotFound(_))
        ));
    }

    #[test]
    fn record_class_and_delete() {
        let conn = conn();
        SubjectRepo::add(&conn, "asha", &subject("Maths", 3, 4)).unwrap();
        SubjectRepo::record_class(&conn, "asha", "Maths", true).unwrap();
        let after = SubjectRepo::record_class(&conn, "asha", "Maths", false).unwrap();
        assert_eq!((after.present, after.total), (4, 6));

        SubjectRepo::delete(&conn, "asha", "maths").unwrap();
        assert!(SubjectRepo::get(&conn, "asha", "Maths").unwrap().is_none());
        assert!(SubjectRepo::delete(&conn, "asha", "Maths").is_err());
    }

    #[test]
    fn check_constraint_guards_counts() {
        let conn = conn();
        let bad = conn.execute(
            "INSERT INTO subjects (user_name, name, present, total) VALUES ('asha', 'X', 5, 4)",
            [],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn snapshot_upserts_and_logs_history() {
        let conn = conn();
        SubjectRepo::add(&conn, "asha", &subject("Maths", 3, 4)).unwrap();
        SubjectRepo::add(&conn, "asha", &subject("Art", 1, 1)).unwrap();

        let saved = SubjectRepo::save_snapshot(
            &conn,
            "asha",
            &[subject("Maths", 10, 12), subject("Physics", 5, 5)],
            "erp.json",
        )
        .unwrap();
        assert_eq!(saved, 2);

        let list = SubjectRepo::list(&conn, "asha").unwrap();
        assert_eq!(list.len(), 3);
        let maths = SubjectRepo::get(&conn, "asha", "Maths").unwrap().unwrap();
        assert_eq!((maths.present, maths.total), (10, 12));

        let last = RefreshRepo::last(&conn, "asha").unwrap().unwrap();
        assert_eq!(last.subject_count, 2);
        assert_eq!(last.source, "erp.json");
        assert!(RefreshRepo::last(&conn, "ravi").unwrap().is_none());
    }

    #[test]
    fn snapshot_matches_existing_subject_ignoring_case() {
        let conn = conn();
        SubjectRepo::add(&conn, "asha", &subject("Maths", 3, 4)).unwrap();
        SubjectRepo::save_snapshot(&conn, "asha", &[subject("maths", 10, 12)], "erp.json").unwrap();

        let list = SubjectRepo::list(&conn, "asha").unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Maths");
        assert_eq!((list[0].present, list[0].total), (10, 12));
    }

    #[test]
    fn timetable_round_trip() {
        let conn = conn();
        let entry = TimetableEntry {
            id: None,
            subject: "Maths".to_string(),
            day: parse_weekday("wed").unwrap(),
            start_time: parse_time("09:00").unwrap(),
            end_time: parse_time("10:00").unwrap(),
        };
        let id = TimetableRepo::add(&conn, "asha", &entry).unwrap();
        TimetableRepo::add(
            &conn,
            "asha",
            &TimetableEntry {
                day: parse_weekday("mon").unwrap(),
                ..entry.clone()
            },
        )
        .unwrap();

        let slots = TimetableRepo::list(&conn, "asha").unwrap();
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].day, chrono::Weekday::Mon);
        assert_eq!(slots[1].id, Some(id));
        assert_eq!(slots[1].start_time, entry.start_time);

        TimetableRepo::remove(&conn, "asha", id).unwrap();
        assert!(TimetableRepo::remove(&conn, "asha", id).is_err());
        assert_eq!(TimetableRepo::clear(&conn, "asha").unwrap(), 1);
        assert!(TimetableRepo::list(&conn, "asha").unwrap().is_empty());
    }

    #[test]
    fn store_feeds_the_source_traits() {
        let conn = conn();
        SubjectRepo::add(&conn, "asha", &subject("Maths", 3, 4)).unwrap();
        let store = SqliteStore::new(&conn);
        assert_eq!(store.subjects("asha").unwrap().len(), 1);
        assert!(store.timetable("asha").unwrap().is_empty());
    }

    #[test]
    fn meta_values_overwrite() {
        let conn = conn();
        assert!(MetaRepo::get(&conn, "setup_done").unwrap().is_none());
        MetaRepo::set(&conn, "setup_done", "0").unwrap();
        MetaRepo::set(&conn, "setup_done", "1").unwrap();
        assert_eq!(MetaRepo::get(&conn, "setup_done").unwrap().as_deref(), Some("1"));
    }
}
