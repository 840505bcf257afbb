// src/export/logic.rs

use crate::config::Config;
use crate::db::entries::{EntryFilter, load_entries};
use crate::db::{Store, log};
use crate::errors::AppResult;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::range::parse_range;
use crate::export::{EntryExport, ExportFormat};
use crate::ui::messages::warning;
use crate::utils::date::{file_stamp, now_seconds};
use std::fs;
use std::path::{Path, PathBuf};

/// High-level export logic.
pub struct ExportLogic;

impl ExportLogic {
    /// Export entries and return the written file, or `None` when there was
    /// nothing to export.
    ///
    /// - `file`: output path; defaults to `exports_dir/cpd_export_<stamp>.<ext>`
    /// - `range`: `None`, `"all"` or an expression accepted by [`parse_range`]
    pub fn export(
        store: &Store,
        cfg: &Config,
        format: ExportFormat,
        file: Option<&str>,
        range: Option<&str>,
        force: bool,
    ) -> AppResult<Option<PathBuf>> {
        let period = match range {
            None => None,
            Some(r) if r.eq_ignore_ascii_case("all") => None,
            Some(r) => Some(parse_range(r)?),
        };

        let filter = EntryFilter {
            category: None,
            period,
        };
        let rows: Vec<EntryExport> = load_entries(&store.conn, &filter)?
            .iter()
            .map(EntryExport::from)
            .collect();

        if rows.is_empty() {
            warning("No entries found to export");
            return Ok(None);
        }

        let path = match file {
            Some(f) => PathBuf::from(f),
            None => default_export_path(&cfg.exports_path(), format),
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        ensure_writable(&path, force)?;

        match format {
            ExportFormat::Csv => export_csv(&rows, &path)?,
            ExportFormat::Json => export_json(&rows, &path)?,
        }

        if let Err(e) = log::ttlog(
            &store.conn,
            "export",
            &path.to_string_lossy(),
            &format!("Exported {} entries as {}", rows.len(), format.as_str()),
        ) {
            warning(format!("Failed to write internal log: {}", e));
        }

        Ok(Some(path))
    }
}

fn default_export_path(dir: &Path, format: ExportFormat) -> PathBuf {
    dir.join(format!(
        "cpd_export_{}.{}",
        file_stamp(&now_seconds()),
        format.as_str()
    ))
}
