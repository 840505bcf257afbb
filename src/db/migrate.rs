use crate::ui::messages::{success, warning};
use rusqlite::{Connection, Error, OptionalExtension, Result};

/// Ensure that the `log` table exists.
fn ensure_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS log (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            date      TEXT NOT NULL,
            operation TEXT NOT NULL,
            target    TEXT DEFAULT '',
            message   TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

/// Create the `entries` table with the current schema.
fn ensure_entries_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at    TEXT NOT NULL,
            period_start  TEXT NOT NULL,
            period_end    TEXT NOT NULL,
            name          TEXT NOT NULL CHECK(length(trim(name)) > 0),
            category      TEXT NOT NULL,
            description   TEXT NOT NULL CHECK(length(trim(description)) > 0),
            photo_path    TEXT NOT NULL DEFAULT '',
            points        INTEGER NOT NULL DEFAULT 0 CHECK(points >= 0),
            CHECK(period_end >= period_start)
        );
        "#,
    )?;
    Ok(())
}

fn ensure_entries_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE INDEX IF NOT EXISTS idx_entries_period_start ON entries(period_start);
        CREATE INDEX IF NOT EXISTS idx_entries_category ON entries(category);
        "#,
    )?;
    Ok(())
}

/// Create the `backup_log` table.
fn ensure_backup_log_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS backup_log (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            attempted_at   TEXT NOT NULL,
            archive_path   TEXT NOT NULL,
            entries_count  INTEGER,
            status         TEXT DEFAULT 'completed'
        );

        CREATE INDEX IF NOT EXISTS idx_backup_log_attempted_at ON backup_log(attempted_at);
        "#,
    )?;
    Ok(())
}

/// Check if the `entries` table has a given column.
fn entries_has_column(conn: &Connection, column: &str) -> Result<bool> {
    let mut stmt = conn.prepare("PRAGMA table_info('entries')")?;
    let cols = stmt.query_map([], |row| row.get::<_, String>(1))?;

    for c in cols {
        if c? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

fn is_duplicate_column(e: &Error) -> bool {
    matches!(e, Error::SqliteFailure(_, Some(msg)) if msg.contains("duplicate column"))
}

fn migration_applied(conn: &Connection, version: &str) -> Result<bool> {
    let mut chk = conn.prepare(
        "SELECT 1 FROM log
         WHERE operation = 'migration_applied' AND target = ?1
         LIMIT 1",
    )?;
    Ok(chk.query_row([version], |_| Ok(())).optional()?.is_some())
}

/// Older databases were created before `points` existed. Add it with a
/// default of 0. A concurrent opener may win the race, so "duplicate column"
/// counts as success.
fn migrate_add_points_column(conn: &Connection) -> Result<()> {
    let version = "20250730_0001_add_points_to_entries";

    if entries_has_column(conn, "points")? {
        return Ok(());
    }

    warning("Adding 'points' column to entries table...");

    match conn.execute(
        "ALTER TABLE entries ADD COLUMN points INTEGER NOT NULL DEFAULT 0",
        [],
    ) {
        Ok(_) => {}
        Err(e) if is_duplicate_column(&e) => return Ok(()),
        Err(e) => return Err(e),
    }

    if !migration_applied(conn, version)? {
        conn.execute(
            "INSERT INTO log (date, operation, target, message)
             VALUES (datetime('now', 'localtime'), 'migration_applied', ?1, 'Added points column to entries')",
            [version],
        )?;
    }

    success(format!(
        "Migration applied: {} → added 'points' to entries table",
        version
    ));

    Ok(())
}

/// Public entry point: run all pending migrations.
///
/// Invoked by `db::open_store()` and by `db --migrate`.
pub fn run_pending_migrations(conn: &Connection) -> Result<()> {
    ensure_log_table(conn)?;
    ensure_entries_table(conn)?;
    migrate_add_points_column(conn)?;
    ensure_entries_indexes(conn)?;
    ensure_backup_log_table(conn)?;
    Ok(())
}
