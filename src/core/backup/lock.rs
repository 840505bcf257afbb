//! Cross-process run lock: a marker file in the backups directory.
//!
//! The file is created with `create_new`, so only one process can hold it.
//! A marker older than [`STALE_AFTER`] is left over from a crashed run and is
//! taken over.

use crate::ui::messages::warning;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub const LOCK_FILE: &str = ".backup.lock";
pub const STALE_AFTER: Duration = Duration::from_secs(60 * 60);

/// Held for the duration of one pipeline run; removes the marker on drop.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path)
            && e.kind() != ErrorKind::NotFound
        {
            warning(format!(
                "Could not remove backup lock {}: {}",
                self.path.display(),
                e
            ));
        }
    }
}

/// Try to take the lock in `backups_dir`.
///
/// - `Ok(Some(lock))`: acquired
/// - `Ok(None)`: another process holds it
pub fn try_acquire(backups_dir: &Path) -> io::Result<Option<RunLock>> {
    fs::create_dir_all(backups_dir)?;
    let path = backups_dir.join(LOCK_FILE);

    match create_marker(&path) {
        Ok(()) => return Ok(Some(RunLock { path })),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e),
    }

    if !is_stale(&path) {
        return Ok(None);
    }

    warning(format!("Removing stale backup lock {}", path.display()));
    match fs::remove_file(&path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    // Another process may have taken over the stale marker in between.
    match create_marker(&path) {
        Ok(()) => Ok(Some(RunLock { path })),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
        Err(e) => Err(e),
    }
}

fn create_marker(path: &Path) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(())
}

fn is_stale(path: &Path) -> bool {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| SystemTime::now().duration_since(t).ok())
        .is_some_and(|age| age >= STALE_AFTER)
}
