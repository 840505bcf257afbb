//! Builds one zip snapshot of the database plus the photo directory.
//!
//! Layout inside the archive:
//!   <db file name>   consistent SQLite snapshot
//!   photos/...       mirror of the photo directory

use super::BackupSettings;
use crate::db::entries;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, warning};
use crate::utils::date::{file_stamp, now_seconds};
use crate::utils::path::{archive_name, file_name_or};
use chrono::NaiveDateTime;
use rusqlite::backup::Backup;
use rusqlite::{Connection, OpenFlags};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::FileOptions;

pub const ARCHIVE_PREFIX: &str = "backup_";
pub const ARCHIVE_SUFFIX: &str = ".zip";
pub const PHOTOS_FOLDER: &str = "photos";

/// `backup_<YYYYmmdd_HHMMSS>`, the working directory and archive stem.
pub fn archive_stem(stamp: &NaiveDateTime) -> String {
    format!("{}{}", ARCHIVE_PREFIX, file_stamp(stamp))
}

/// True for file names produced by [`create_archive_at`].
pub fn is_archive_name(name: &str) -> bool {
    name.starts_with(ARCHIVE_PREFIX) && name.ends_with(ARCHIVE_SUFFIX)
}

/// Create an archive stamped with the current time.
pub fn create_archive(settings: &BackupSettings) -> AppResult<(PathBuf, i64)> {
    create_archive_at(settings, now_seconds())
}

/// Create an archive stamped with `stamp`. Returns the archive path and the
/// entry count at archive time.
pub fn create_archive_at(
    settings: &BackupSettings,
    stamp: NaiveDateTime,
) -> AppResult<(PathBuf, i64)> {
    fs::create_dir_all(&settings.backups_dir).map_err(|e| {
        AppError::Archive(format!(
            "cannot create backups directory {}: {}",
            settings.backups_dir.display(),
            e
        ))
    })?;

    let stem = archive_stem(&stamp);
    let work_dir = settings.backups_dir.join(&stem);
    let zip_path = settings
        .backups_dir
        .join(format!("{}{}", stem, ARCHIVE_SUFFIX));

    let built = fs::create_dir_all(&work_dir)
        .map_err(AppError::from)
        .and_then(|_| populate_working_dir(settings, &work_dir))
        .and_then(|_| compress_dir(&work_dir, &zip_path));

    // The working directory never outlives this call, success or not.
    remove_working_dir(&work_dir);

    if let Err(e) = built {
        if zip_path.exists()
            && let Err(rm) = fs::remove_file(&zip_path)
        {
            warning(format!(
                "Could not remove partial archive {}: {}",
                zip_path.display(),
                rm
            ));
        }
        return Err(as_archive_error(e));
    }

    let count = entry_count(&settings.db_path);
    info(format!("Backup created successfully: {}", zip_path.display()));

    Ok((zip_path, count))
}

fn as_archive_error(e: AppError) -> AppError {
    match e {
        AppError::Archive(_) => e,
        other => AppError::Archive(other.to_string()),
    }
}

fn remove_working_dir(work_dir: &Path) {
    match fs::remove_dir_all(work_dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warning(format!(
            "Could not remove working directory {}: {}",
            work_dir.display(),
            e
        )),
    }
}

fn populate_working_dir(settings: &BackupSettings, work_dir: &Path) -> AppResult<()> {
    if settings.db_path.exists() {
        let db_dst = work_dir.join(file_name_or(&settings.db_path, "cpdtracker.sqlite"));
        snapshot_database(&settings.db_path, &db_dst)?;
        info("Database copied to backup");
    }

    let photos_dst = work_dir.join(PHOTOS_FOLDER);
    if settings.photos_dir.exists() {
        copy_tree(&settings.photos_dir, &photos_dst)?;
        info("Photos copied to backup");
    } else {
        fs::create_dir_all(&photos_dst)?;
    }

    Ok(())
}

/// Copy the live database through SQLite's online backup API, so concurrent
/// writers cannot leave a torn file in the archive.
fn snapshot_database(src_path: &Path, dst_path: &Path) -> AppResult<()> {
    let src = Connection::open_with_flags(src_path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    let mut dst = Connection::open(dst_path)?;

    {
        let backup = Backup::new(&src, &mut dst)?;
        backup.run_to_completion(128, Duration::from_millis(25), None)?;
    }

    dst.close().map_err(|(_, e)| e)?;
    Ok(())
}

/// Recursively copy `src` into `dst`, preserving relative paths.
fn copy_tree(src: &Path, dst: &Path) -> AppResult<()> {
    if !src.is_dir() {
        return Err(AppError::Archive(format!(
            "photo directory is not a directory: {}",
            src.display()
        )));
    }

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| AppError::Archive(e.to_string()))?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Zip the contents of `dir` (not `dir` itself) into `zip_path` with deflate.
fn compress_dir(dir: &Path, zip_path: &Path) -> AppResult<()> {
    let file = File::create(zip_path)?;
    let mut zip = ZipWriter::new(file);

    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| AppError::Archive(e.to_string()))?;

        // Skip the root directory itself
        if rel.as_os_str().is_empty() {
            continue;
        }

        let name = archive_name(rel);

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut f = File::open(entry.path())?;
            io::copy(&mut f, &mut zip)?;
        }
    }

    zip.finish()?;
    Ok(())
}

/// Entry count for the backup record. A missing database counts as empty.
fn entry_count(db_path: &Path) -> i64 {
    if !db_path.exists() {
        return 0;
    }
    match Connection::open_with_flags(db_path, OpenFlags::SQLITE_OPEN_READ_ONLY) {
        Ok(conn) => entries::count(&conn),
        Err(e) => {
            warning(format!("Error getting entries count: {}", e));
            0
        }
    }
}
