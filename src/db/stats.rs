use crate::db::{backup_log, entries};
use crate::errors::AppResult;
use crate::utils::colors::{CYAN, GREEN, GREY, RESET, YELLOW};
use crate::utils::date::format_timestamp;
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::path::Path;

pub fn print_db_info(conn: &Connection, db_path: &Path) -> AppResult<()> {
    println!();

    //
    // 1) FILE SIZE
    //
    let file_size = fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let file_kb = (file_size as f64) / 1024.0;

    println!(
        "{}• File:{} {}{}{}",
        CYAN,
        RESET,
        YELLOW,
        db_path.display(),
        RESET
    );
    println!("{}• Size:{} {:.1} KB", CYAN, RESET, file_kb);

    //
    // 2) TOTAL ENTRIES / POINTS
    //
    let count = entries::count(conn);
    let points: i64 = conn.query_row(
        "SELECT IFNULL(SUM(points), 0) FROM entries",
        [],
        |row| row.get(0),
    )?;
    println!(
        "{}• Total entries:{} {}{}{}",
        CYAN, RESET, GREEN, count, RESET
    );
    println!("{}• Total points:{} {}{}{}", CYAN, RESET, GREEN, points, RESET);

    //
    // 3) DATE RANGE
    //
    let first: Option<String> = conn
        .query_row(
            "SELECT period_start FROM entries ORDER BY period_start ASC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    let last: Option<String> = conn
        .query_row(
            "SELECT period_end FROM entries ORDER BY period_end DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let placeholder = format!("{GREY}--{RESET}");

    println!("{}• Activity range:{}", CYAN, RESET);
    println!("    from: {}", first.unwrap_or_else(|| placeholder.clone()));
    println!("    to:   {}", last.unwrap_or_else(|| placeholder.clone()));

    //
    // 4) LAST SUCCESSFUL BACKUP
    //
    let last_backup = backup_log::last_successful(conn)
        .map(|ts| format_timestamp(&ts))
        .unwrap_or(placeholder);
    println!("{}• Last completed backup:{} {}", CYAN, RESET, last_backup);

    println!();
    Ok(())
}
