use crate::errors::{AppError, AppResult};
use crate::models::{Category, Entry, NewEntry};
use crate::ui::messages::warning;
use crate::utils::date::{DATE_FMT, TIMESTAMP_FMT, format_timestamp, now_seconds};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, Result, Row, ToSql, params, params_from_iter};

const SELECT_COLUMNS: &str = "SELECT id, created_at, period_start, period_end, name, category, \
     description, IFNULL(photo_path, ''), IFNULL(points, 0) FROM entries";

/// Optional filters for entry queries.
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    pub category: Option<Category>,
    /// Inclusive bounds on `period_start`.
    pub period: Option<(NaiveDate, NaiveDate)>,
}

/// Insert one entry and return its id.
pub fn insert_entry(conn: &Connection, entry: &NewEntry) -> AppResult<i64> {
    entry.validate()?;

    let created_at = format_timestamp(&now_seconds());

    let mut stmt = conn.prepare_cached(
        "INSERT INTO entries
            (created_at, period_start, period_end, name, category, description, photo_path, points)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )?;

    stmt.execute(params![
        created_at,
        entry.period_start.format(DATE_FMT).to_string(),
        entry.period_end.format(DATE_FMT).to_string(),
        entry.name,
        entry.category.to_db_str(),
        entry.description,
        entry.photo_path,
        entry.points,
    ])?;

    Ok(conn.last_insert_rowid())
}

/// Entries matching `filter`, newest activity first.
pub fn load_entries(conn: &Connection, filter: &EntryFilter) -> AppResult<Vec<Entry>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut args: Vec<String> = Vec::new();

    if let Some(cat) = &filter.category {
        clauses.push("category = ? COLLATE NOCASE");
        args.push(cat.to_db_str().to_string());
    }
    if let Some((from, to)) = &filter.period {
        clauses.push("period_start BETWEEN ? AND ?");
        args.push(from.format(DATE_FMT).to_string());
        args.push(to.format(DATE_FMT).to_string());
    }

    let mut sql = SELECT_COLUMNS.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY period_start DESC, id DESC");

    let params: Vec<&dyn ToSql> = args.iter().map(|s| s as &dyn ToSql).collect();

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(params), map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Every entry ordered by `period_start` descending. Read faults are
/// reported and yield an empty list.
pub fn list_all(conn: &Connection) -> Vec<Entry> {
    match load_entries(conn, &EntryFilter::default()) {
        Ok(v) => v,
        Err(e) => {
            warning(format!("Error retrieving entries: {}", e));
            Vec::new()
        }
    }
}

/// Total number of entries; 0 when the table cannot be read.
pub fn count(conn: &Connection) -> i64 {
    match conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0)) {
        Ok(n) => n,
        Err(e) => {
            warning(format!("Error getting entries count: {}", e));
            0
        }
    }
}

pub fn map_row(row: &Row) -> Result<Entry> {
    let created_str: String = row.get(1)?;
    let start_str: String = row.get(2)?;
    let end_str: String = row.get(3)?;

    let created_at = NaiveDateTime::parse_from_str(&created_str, TIMESTAMP_FMT)
        .map_err(|_| conversion_error(1, AppError::InvalidDate(created_str.clone())))?;
    let period_start = NaiveDate::parse_from_str(&start_str, DATE_FMT)
        .map_err(|_| conversion_error(2, AppError::InvalidDate(start_str.clone())))?;
    let period_end = NaiveDate::parse_from_str(&end_str, DATE_FMT)
        .map_err(|_| conversion_error(3, AppError::InvalidDate(end_str.clone())))?;

    let category: String = row.get(5)?;
    let points: i64 = row.get(8)?;

    Ok(Entry {
        id: row.get(0)?,
        created_at,
        period_start,
        period_end,
        name: row.get(4)?,
        category: Category::from_db_str(&category),
        description: row.get(6)?,
        photo_path: row.get(7)?,
        points: u32::try_from(points).unwrap_or(0),
    })
}

fn conversion_error(col: usize, err: AppError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(err))
}
