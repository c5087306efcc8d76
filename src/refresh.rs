//! Background refreshes, at most one running per user.
//!
//! The job thread is the only writer of its user's status; the dashboard
//! polls it on every tick.

use anyhow::{Result, anyhow};
use log::{error, info};
use serde::Serialize;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use thiserror::Error;

use crate::db;
use crate::db::repository::SubjectRepo;
use crate::snapshot::Snapshot;

#[derive(Error, Debug, PartialEq)]
pub enum RefreshError {
    #[error("A refresh is already running for {0}")]
    AlreadyRunning(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RefreshStatus {
    pub running: bool,
    pub progress: String,
    pub error: Option<String>,
    pub complete: bool,
}

impl RefreshStatus {
    pub fn is_finished(&self) -> bool {
        !self.running && (self.complete || self.error.is_some())
    }
}

type StatusMap = HashMap<String, RefreshStatus>;

#[derive(Debug, Clone, Default)]
pub struct RefreshTracker {
    statuses: Arc<Mutex<StatusMap>>,
}

/// Handed to a running job so it can report what it is doing.
pub struct Progress {
    tracker: RefreshTracker,
    user: String,
}

impl Progress {
    pub fn report(&self, message: impl Into<String>) {
        let mut map = self.tracker.lock();
        if let Some(status) = map.get_mut(&self.user) {
            status.progress = message.into();
        }
    }
}

impl RefreshTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StatusMap> {
        // Poisoning only means some thread panicked mid-update; the map is still whole.
        self.statuses.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn status(&self, user: &str) -> RefreshStatus {
        self.lock().get(user).cloned().unwrap_or_default()
    }

    pub fn is_running(&self, user: &str) -> bool {
        self.lock().get(user).is_some_and(|s| s.running)
    }

    /// Run `job` on its own thread for `user`. The job returns a short
    /// summary on success.
    pub fn start<F>(&self, user: &str, job: F) -> Result<JoinHandle<()>, RefreshError>
    where
        F: FnOnce(&Progress) -> Result<String> + Send + 'static,
    {
        {
            let mut map = self.lock();
            let status = map.entry(user.to_string()).or_default();
            if status.running {
                return Err(RefreshError::AlreadyRunning(user.to_string()));
            }
            *status = RefreshStatus {
                running: true,
                progress: "Starting...".to_string(),
                error: None,
                complete: false,
            };
        }

        info!("refresh started for {}", user);
        let progress = Progress {
            tracker: self.clone(),
            user: user.to_string(),
        };
        Ok(thread::spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| job(&progress)))
                .unwrap_or_else(|payload| {
                    Err(anyhow!("Refresh crashed: {}", panic_message(&*payload)))
                });
            progress.tracker.finish(&progress.user, outcome);
        }))
    }

    fn finish(&self, user: &str, outcome: Result<String>) {
        let mut map = self.lock();
        let status = map.entry(user.to_string()).or_default();
        match outcome {
            Ok(summary) => {
                info!("refresh for {} finished: {}", user, summary);
                status.progress = summary;
                status.complete = true;
            }
            Err(e) => {
                error!("refresh for {} failed: {:#}", user, e);
                status.error = Some(format!("{:#}", e));
            }
        }
        status.running = false;
    }

    /// Hand back a finished status once, clearing it from the map.
    pub fn take_finished(&self, user: &str) -> Option<RefreshStatus> {
        let mut map = self.lock();
        if map.get(user).is_some_and(RefreshStatus::is_finished) {
            map.remove(user)
        } else {
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Job that re-imports a snapshot file through its own connection.
pub fn snapshot_job(
    db_path: PathBuf,
    user: String,
    snapshot_path: PathBuf,
) -> impl FnOnce(&Progress) -> Result<String> + Send + 'static {
    move |progress: &Progress| {
        progress.report("Opening database...");
        let conn = db::open(&db_path)?;

        progress.report("Reading snapshot...");
        let snapshot = Snapshot::load(&snapshot_path)?;
        let records = snapshot.records()?;
        if records.is_empty() {
            anyhow::bail!("No data found in {:?}", snapshot_path);
        }

        progress.report("Saving data...");
        let saved = SubjectRepo::save_snapshot(&conn, &user, &records, &snapshot.label(&snapshot_path))?;
        Ok(format!("Imported {} subjects", saved))
    }
}
