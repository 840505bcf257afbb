//! Backup log store: one row per pipeline run that reached the logging step.

use crate::errors::AppResult;
use crate::models::{BackupRecord, BackupStatus};
use crate::ui::messages::{info, warning};
use crate::utils::date::{format_timestamp, parse_timestamp};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};

/// Append one record. Failures are reported and swallowed: logging a backup
/// must never abort the pipeline that produced it.
pub fn append(conn: &Connection, record: &BackupRecord) {
    let res = conn.execute(
        "INSERT INTO backup_log (attempted_at, archive_path, entries_count, status)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            format_timestamp(&record.attempted_at),
            record.archive_path,
            record.entries_count,
            record.status.as_str(),
        ],
    );

    match res {
        Ok(_) => info(format!("Backup logged: {}", record.archive_path)),
        Err(e) => warning(format!("Error logging backup: {}", e)),
    }
}

/// Most recent `attempted_at` among completed backups. `None` when there is
/// none or the table cannot be read.
pub fn last_successful(conn: &Connection) -> Option<NaiveDateTime> {
    match try_last_successful(conn) {
        Ok(v) => v,
        Err(e) => {
            warning(format!("Error getting last backup date: {}", e));
            None
        }
    }
}

/// Same as [`last_successful`] but surfaces read faults to the caller.
pub fn try_last_successful(conn: &Connection) -> AppResult<Option<NaiveDateTime>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT attempted_at FROM backup_log
             WHERE status = 'completed'
             ORDER BY attempted_at DESC
             LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(raw.as_deref().and_then(parse_timestamp))
}

/// Backup history, newest first. `limit = None` returns everything.
pub fn history(conn: &Connection, limit: Option<usize>) -> AppResult<Vec<BackupRecord>> {
    let limit = limit.map(|l| l as i64).unwrap_or(-1);

    let mut stmt = conn.prepare(
        "SELECT attempted_at, archive_path, IFNULL(entries_count, 0), IFNULL(status, 'completed')
         FROM backup_log
         ORDER BY attempted_at DESC, id DESC
         LIMIT ?1",
    )?;

    let rows = stmt.query_map([limit], |row| {
        let attempted: String = row.get(0)?;
        let status: String = row.get(3)?;
        Ok((attempted, row.get::<_, String>(1)?, row.get::<_, i64>(2)?, status))
    })?;

    let mut out = Vec::new();
    for r in rows {
        let (attempted, archive_path, entries_count, status) = r?;
        // Rows with an unreadable timestamp cannot be ordered or compared; skip them.
        let Some(attempted_at) = parse_timestamp(&attempted) else {
            continue;
        };
        out.push(BackupRecord {
            attempted_at,
            archive_path,
            entries_count,
            status: BackupStatus::from_db_str(&status),
        });
    }
    Ok(out)
}
