//! Due check and the Archive → Upload → Log → Prune pipeline.
//!
//! Runs are guarded twice: a "running" flag shared by clones of one scheduler,
//! and a lock file in the backups directory shared by every process. While
//! one run is in flight a second invocation returns
//! [`BackupOutcome::AlreadyRunning`] untouched.

use super::upload::{Uploader, uploader_from_config};
use super::{BackupSettings, archiver, lock, retention};
use crate::config::Config;
use crate::db::{backup_log, log, open_store};
use crate::errors::{AppError, AppResult};
use crate::models::{BackupRecord, BackupStatus};
use crate::ui::messages::{error, info, success, warning};
use crate::utils::date::{format_timestamp, now_seconds};
use chrono::{NaiveDateTime, TimeDelta};
use rusqlite::{Connection, OpenFlags};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// What started a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// After a save: runs only when a backup is due.
    Scheduled,
    /// Manual request: skips the due check.
    Forced,
}

/// Terminal state of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    NotNeeded,
    AlreadyRunning,
    /// The run reached the logging step; carries the logged record.
    Done(BackupRecord),
    /// The run stopped before logging; nothing was written to `backup_log`.
    Failed(String),
}

/// `true` when no completed backup exists or the last one is at least
/// `interval` old.
pub fn is_due(last: Option<NaiveDateTime>, now: NaiveDateTime, interval: TimeDelta) -> bool {
    match last {
        None => true,
        Some(last) => now - last >= interval,
    }
}

#[derive(Clone)]
pub struct BackupScheduler {
    settings: BackupSettings,
    uploader: Arc<dyn Uploader>,
    running: Arc<AtomicBool>,
}

/// Clears the running flag on every exit path, panics included.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BackupScheduler {
    pub fn new(settings: BackupSettings, uploader: Arc<dyn Uploader>) -> Self {
        Self {
            settings,
            uploader,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(BackupSettings::from_config(cfg), uploader_from_config(cfg))
    }

    pub fn settings(&self) -> &BackupSettings {
        &self.settings
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn read_last_successful(&self) -> AppResult<Option<NaiveDateTime>> {
        if !self.settings.db_path.exists() {
            return Ok(None);
        }
        let conn = Connection::open_with_flags(
            &self.settings.db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY,
        )?;
        backup_log::try_last_successful(&conn)
    }

    pub fn last_successful(&self) -> Option<NaiveDateTime> {
        self.read_last_successful().unwrap_or_else(|e| {
            warning(format!("Error getting last backup date: {}", e));
            None
        })
    }

    pub fn is_backup_needed(&self) -> bool {
        self.is_backup_needed_at(now_seconds())
    }

    /// Due check against an explicit clock. Read faults count as "due".
    pub fn is_backup_needed_at(&self, now: NaiveDateTime) -> bool {
        match self.read_last_successful() {
            Ok(last) => is_due(last, now, self.settings.interval),
            Err(e) => {
                error(format!("Error checking backup need: {}", e));
                true
            }
        }
    }

    /// Scheduled path: check, then run if due.
    pub fn run_scheduled(&self) -> BackupOutcome {
        self.run(Trigger::Scheduled)
    }

    /// Manual path: run unconditionally.
    pub fn force(&self) -> BackupOutcome {
        info("Forcing immediate backup");
        self.run(Trigger::Forced)
    }

    pub fn run(&self, trigger: Trigger) -> BackupOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warning("A backup is already running; skipping this request.");
            return BackupOutcome::AlreadyRunning;
        }
        let _guard = RunGuard(Arc::clone(&self.running));

        // Other processes sharing the backups directory.
        let _lock = match lock::try_acquire(&self.settings.backups_dir) {
            Ok(Some(l)) => Some(l),
            Ok(None) => {
                warning("A backup is already running in another process; skipping this request.");
                return BackupOutcome::AlreadyRunning;
            }
            // The archiver reports an unusable backups directory itself.
            Err(e) => {
                warning(format!("Could not take backup lock: {}", e));
                None
            }
        };

        if trigger == Trigger::Scheduled {
            if !self.is_backup_needed() {
                info("No backup needed at this time");
                return BackupOutcome::NotNeeded;
            }
            info("Backup needed, starting backup");
        }

        self.perform()
    }

    fn perform(&self) -> BackupOutcome {
        info("Starting backup process");
        let attempted_at = now_seconds();

        // Archiving
        let (archive_path, entries_count) =
            match archiver::create_archive_at(&self.settings, attempted_at) {
                Ok(v) => v,
                Err(e) => {
                    error(format!("Backup process failed: {}", e));
                    return BackupOutcome::Failed(e.to_string());
                }
            };

        // Uploading: a failure only downgrades the status
        let status = match self.uploader.upload(&archive_path) {
            Ok(remote_id) => {
                info(format!("Backup uploaded: {}", remote_id));
                BackupStatus::Completed
            }
            Err(e) => {
                warning(format!("Error uploading backup: {}", e));
                BackupStatus::LocalOnly
            }
        };

        let record = BackupRecord {
            attempted_at,
            archive_path: archive_path.to_string_lossy().to_string(),
            entries_count,
            status,
        };

        // Logging
        self.log_record(&record);

        // Pruning
        retention::prune(&self.settings.backups_dir, self.settings.keep_count);

        success(format!(
            "Backup process completed. Status: {}",
            record.status
        ));
        BackupOutcome::Done(record)
    }

    fn log_record(&self, record: &BackupRecord) {
        let store = match open_store(&self.settings.db_path) {
            Ok(s) => s,
            Err(e) => {
                warning(format!("Error logging backup: {}", e));
                return;
            }
        };

        backup_log::append(&store.conn, record);

        if let Err(e) = log::ttlog(
            &store.conn,
            "backup",
            &record.archive_path,
            &format!(
                "Backup {} at {} ({} entries)",
                record.status,
                format_timestamp(&record.attempted_at),
                record.entries_count
            ),
        ) {
            warning(format!("Failed to write internal log: {}", e));
        }

        if let Err(e) = store.close() {
            warning(format!("Error closing database after backup: {}", e));
        }
    }

    /// Run in a background thread. The caller may wait on the returned handle
    /// or drop it and let the run finish on its own.
    pub fn spawn(&self, trigger: Trigger) -> AppResult<BackupHandle> {
        let (tx, rx) = mpsc::channel();
        let this = self.clone();

        let thread = thread::Builder::new()
            .name("cpd-backup".into())
            .spawn(move || {
                let outcome = this.run(trigger);
                if let BackupOutcome::Failed(msg) = &outcome {
                    error(format!("Background backup failed: {}", msg));
                }
                // The observer may have gone away; that is fine.
                let _ = tx.send(outcome);
            })
            .map_err(|e| AppError::Other(format!("cannot start backup thread: {}", e)))?;

        Ok(BackupHandle {
            rx,
            thread: Some(thread),
        })
    }
}

/// Handle on a background run.
pub struct BackupHandle {
    rx: Receiver<BackupOutcome>,
    thread: Option<JoinHandle<()>>,
}

impl BackupHandle {
    /// Outcome if the run has already finished.
    pub fn try_outcome(&self) -> Option<BackupOutcome> {
        self.rx.try_recv().ok()
    }

    /// Block until the run finishes.
    pub fn wait(mut self) -> BackupOutcome {
        let outcome = self
            .rx
            .recv()
            .unwrap_or_else(|_| BackupOutcome::Failed("backup task ended without a result".into()));

        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
        outcome
    }
}
