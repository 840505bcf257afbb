pub mod archiver;
pub mod lock;
pub mod retention;
pub mod scheduler;
pub mod upload;

pub use scheduler::{BackupHandle, BackupOutcome, BackupScheduler, Trigger, is_due};

use crate::config::Config;
use crate::db::{backup_log, open_store};
use crate::errors::AppResult;
use crate::ui::messages::{error, info, success, warning};
use crate::utils::colors::{GREEN, GREY, RED, RESET, YELLOW};
use crate::utils::date::format_timestamp;
use crate::utils::table::{Column, Table};
use chrono::TimeDelta;
use std::path::PathBuf;

/// Paths and policy the pipeline works with.
#[derive(Debug, Clone)]
pub struct BackupSettings {
    pub db_path: PathBuf,
    pub photos_dir: PathBuf,
    pub backups_dir: PathBuf,
    pub interval: TimeDelta,
    pub keep_count: usize,
}

impl BackupSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            db_path: cfg.database_path(),
            photos_dir: cfg.photos_path(),
            backups_dir: cfg.backups_path(),
            interval: interval_from_days(cfg.backup_interval_days),
            keep_count: cfg.keep_backups,
        }
    }
}

/// Interval for a configured day count. Negative counts mean "always due";
/// counts beyond what `TimeDelta` can hold saturate.
pub fn interval_from_days(days: i64) -> TimeDelta {
    TimeDelta::try_days(days.max(0)).unwrap_or(TimeDelta::MAX)
}

/// High-level logic for the `backup` command.
pub struct BackupLogic;

impl BackupLogic {
    /// Run the pipeline in the foreground (`force`) or only when due.
    pub fn run(cfg: &Config, force: bool) -> AppResult<BackupOutcome> {
        let scheduler = BackupScheduler::from_config(cfg);
        let trigger = if force {
            Trigger::Forced
        } else {
            Trigger::Scheduled
        };

        let outcome = scheduler.spawn(trigger)?.wait();
        report_outcome(&outcome);
        Ok(outcome)
    }

    pub fn prune(cfg: &Config, keep: usize) {
        let report = retention::prune(&cfg.backups_path(), keep);
        success(format!(
            "Pruned {} old backups, kept {}",
            report.removed.len(),
            report.kept.len()
        ));
        if !report.failed.is_empty() {
            warning(format!("{} backups could not be removed", report.failed.len()));
        }
    }

    pub fn print_status(cfg: &Config) {
        let scheduler = BackupScheduler::from_config(cfg);
        let settings = scheduler.settings();

        match scheduler.last_successful() {
            Some(ts) => info(format!("Last completed backup: {}", format_timestamp(&ts))),
            None => info("No completed backup yet"),
        }

        let days = settings.interval.num_days();
        if scheduler.is_backup_needed() {
            println!("{YELLOW}Backup due{RESET} (interval: {days} days)");
        } else {
            println!("{GREEN}Backup up to date{RESET} (interval: {days} days)");
        }

        match retention::list_archives(&settings.backups_dir) {
            Ok(archives) => println!(
                "Local archives: {} (keeping {}) in {}",
                archives.len(),
                settings.keep_count,
                settings.backups_dir.display()
            ),
            Err(_) => println!("Local archives: 0 in {}", settings.backups_dir.display()),
        }
    }

    pub fn print_history(cfg: &Config, limit: Option<usize>) -> AppResult<()> {
        let store = open_store(cfg.database_path())?;
        let records = backup_log::history(&store.conn, limit)?;
        store.close()?;

        if records.is_empty() {
            info("No backups recorded yet.");
            return Ok(());
        }

        let mut table = Table::new(vec![
            Column::new("Attempted", 19),
            Column::new("Status", 24),
            Column::new("Entries", 7),
            Column::new("Archive", 80),
        ]);

        for r in &records {
            table.add_row(vec![
                r.attempted_at_str(),
                r.status.to_string(),
                r.entries_count.to_string(),
                r.archive_path.clone(),
            ]);
        }

        print!("{}", table.render());
        Ok(())
    }
}

pub(crate) fn report_outcome(outcome: &BackupOutcome) {
    match outcome {
        BackupOutcome::NotNeeded => info("No backup needed at this time."),
        BackupOutcome::AlreadyRunning => warning("Another backup is in progress."),
        BackupOutcome::Done(record) => {
            let colour = if record.status.is_completed() {
                GREEN
            } else {
                YELLOW
            };
            println!(
                "📦 {}{}{} {} ({} entries)",
                colour, record.status, RESET, record.archive_path, record.entries_count
            );
        }
        BackupOutcome::Failed(msg) => {
            error(format!("{RED}Backup failed{RESET}: {GREY}{msg}{RESET}"));
        }
    }
}
