//! JSON attendance snapshots, the files an external scraper drops off.
//!
//! ```json
//! { "date": "2024-03-01 10:00:00", "source": "ERP",
//!   "data": [ { "subject": "Maths", "present": 30, "total": 40, "percentage": 75.0 } ] }
//! ```
//!
//! Any `percentage` in the file is ignored; it is recomputed from the counts.

use anyhow::{Context, Result};
use log::{debug, warn};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::calc::{percentage, round2};
use crate::db::repository::SubjectRepo;
use crate::models::SubjectRecord;
use crate::source::SubjectSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotRow {
    pub subject: String,
    #[serde(default)]
    pub present: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub data: Vec<SnapshotRow>,
}

impl Snapshot {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Parsing attendance snapshot")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Reading snapshot {:?}", path))?;
        let snapshot = Self::from_json(&content)
            .with_context(|| format!("Loading snapshot {:?}", path))?;
        debug!("snapshot {:?} holds {} rows", path, snapshot.data.len());
        Ok(snapshot)
    }

    /// Validated records, one per row.
    pub fn records(&self) -> Result<Vec<SubjectRecord>> {
        self.data
            .iter()
            .map(|row| {
                if let Some(stated) = row.percentage {
                    let derived = round2(percentage(row.present, row.total));
                    if (stated - derived).abs() > 0.01 {
                        warn!(
                            "{}: snapshot says {}% but counts give {}%",
                            row.subject, stated, derived
                        );
                    }
                }
                SubjectRecord::new(row.subject.trim(), row.present, row.total)
                    .map_err(anyhow::Error::from)
            })
            .collect()
    }

    /// Label stored in the refresh history.
    pub fn label(&self, path: &Path) -> String {
        let file = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        match &self.source {
            Some(source) => format!("{} ({})", source, file),
            None => file,
        }
    }
}

/// Snapshots are per user already, so the user argument is not consulted.
impl SubjectSource for Snapshot {
    fn subjects(&self, _user: &str) -> Result<Vec<SubjectRecord>> {
        self.records()
    }
}

/// Load a snapshot file and store it for `user`. Returns the number of
/// subjects written.
pub fn import_file(conn: &Connection, user: &str, path: &Path) -> Result<usize> {
    let snapshot = Snapshot::load(path)?;
    let records = snapshot.records()?;
    SubjectRepo::save_snapshot(conn, user, &records, &snapshot.label(path))
}
