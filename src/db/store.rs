//! SQLite store handle: open → use → close.

use crate::db::migrate::run_pending_migrations;
use crate::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::fs;
use std::path::Path;

pub struct Store {
    pub conn: Connection,
}

/// Open (creating if needed) the database at `path` and bring its schema up
/// to date.
pub fn open_store<P: AsRef<Path>>(path: P) -> AppResult<Store> {
    let path = path.as_ref();

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(path)?;
    run_pending_migrations(&conn)
        .map_err(|e| AppError::Migration(format!("{}: {}", path.display(), e)))?;

    Ok(Store { conn })
}

impl Store {
    pub fn close(self) -> AppResult<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}
