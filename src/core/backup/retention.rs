//! Keeps only the newest N archives in the backups directory.

use super::archiver::is_archive_name;
use crate::ui::messages::{info, warning};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneReport {
    pub kept: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Entries of `backups_dir` named like archives, newest first. Names embed
/// the timestamp, so name order is recency order.
pub fn list_archives(backups_dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut names: Vec<String> = Vec::new();

    for ent in fs::read_dir(backups_dir)? {
        let ent = ent?;
        let name = ent.file_name().to_string_lossy().to_string();
        if is_archive_name(&name) {
            names.push(name);
        }
    }

    names.sort_by(|a, b| b.cmp(a));
    Ok(names.into_iter().map(|n| backups_dir.join(n)).collect())
}

/// Delete all but the `keep_count` most recent archives. A file that cannot
/// be deleted is reported and skipped.
pub fn prune(backups_dir: &Path, keep_count: usize) -> PruneReport {
    let mut report = PruneReport::default();

    let archives = match list_archives(backups_dir) {
        Ok(v) => v,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return report,
        Err(e) => {
            warning(format!(
                "Error cleaning up old backups in {}: {}",
                backups_dir.display(),
                e
            ));
            return report;
        }
    };

    for (idx, path) in archives.into_iter().enumerate() {
        if idx < keep_count {
            report.kept.push(path);
            continue;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                info(format!("Removed old backup: {}", path.display()));
                report.removed.push(path);
            }
            Err(e) => {
                warning(format!("Could not remove backup {}: {}", path.display(), e));
                report.failed.push(path);
            }
        }
    }

    report
}
