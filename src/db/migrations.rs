use anyhow::Result;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS subjects (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_name   TEXT NOT NULL,
            name        TEXT NOT NULL COLLATE NOCASE,
            present     INTEGER NOT NULL DEFAULT 0,
            total       INTEGER NOT NULL DEFAULT 0,
            updated_at  TEXT DEFAULT (datetime('now')),
            CHECK(present >= 0 AND total >= 0 AND present <= total),
            UNIQUE(user_name, name)
        );

        CREATE TABLE IF NOT EXISTS timetable (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            user_name   TEXT NOT NULL,
            subject     TEXT NOT NULL,
            day         INTEGER NOT NULL CHECK(day BETWEEN 0 AND 6),
            start_time  TEXT NOT NULL,
            end_time    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_timetable_user ON timetable(user_name);

        CREATE TABLE IF NOT EXISTS refresh_history (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            user_name      TEXT NOT NULL,
            refreshed_at   TEXT NOT NULL DEFAULT (datetime('now')),
            subject_count  INTEGER NOT NULL,
            source         TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_refresh_user ON refresh_history(user_name);

        CREATE TABLE IF NOT EXISTS app_meta (
            key   TEXT PRIMARY KEY,
            value TEXT
        );
    ")?;
    Ok(())
}
