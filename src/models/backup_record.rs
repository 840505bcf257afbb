use crate::utils::date::TIMESTAMP_FMT;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

/// Outcome stored in `backup_log.status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupStatus {
    /// Archived and uploaded.
    Completed,
    /// Archived, upload failed.
    LocalOnly,
    /// Free-form failure message.
    Failed(String),
}

impl BackupStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BackupStatus::Completed => "completed",
            BackupStatus::LocalOnly => "local_only",
            BackupStatus::Failed(msg) => msg,
        }
    }

    pub fn from_db_str(s: &str) -> Self {
        match s {
            "completed" => BackupStatus::Completed,
            "local_only" => BackupStatus::LocalOnly,
            other => BackupStatus::Failed(other.to_string()),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, BackupStatus::Completed)
    }
}

impl fmt::Display for BackupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BackupStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One row of `backup_log`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupRecord {
    pub attempted_at: NaiveDateTime,
    pub archive_path: String,
    pub entries_count: i64,
    pub status: BackupStatus,
}

impl BackupRecord {
    pub fn attempted_at_str(&self) -> String {
        self.attempted_at.format(TIMESTAMP_FMT).to_string()
    }
}
