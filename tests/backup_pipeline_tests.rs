mod common;
use chrono::{NaiveDateTime, TimeDelta};
use common::{
    FailingUploader, StubUploader, file_names, open_test_store, sample_entry, settings_in,
    setup_test_dir, touch_archives,
};
use cpdtracker::core::backup::upload::{UploadError, Uploader};
use cpdtracker::config::Config;
use cpdtracker::core::backup::{
    BackupOutcome, BackupScheduler, BackupSettings, Trigger, archiver, interval_from_days, is_due,
    lock, retention,
};
use cpdtracker::db::{backup_log, entries};
use cpdtracker::models::{BackupRecord, BackupStatus};
use std::fs::{self, File};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid timestamp")
}

fn completed_at(at: NaiveDateTime) -> BackupRecord {
    BackupRecord {
        attempted_at: at,
        archive_path: "backup_previous.zip".into(),
        entries_count: 0,
        status: BackupStatus::Completed,
    }
}

#[test]
fn test_due_check_boundary() {
    let interval = TimeDelta::days(14);
    let now = ts("2025-11-20 10:00:00");

    assert!(is_due(None, now, interval));
    assert!(is_due(Some(now - interval), now, interval));
    assert!(!is_due(
        Some(now - interval + TimeDelta::seconds(1)),
        now,
        interval
    ));
}

#[test]
fn test_due_check_reads_backup_log() {
    let dir = setup_test_dir("due_check_reads_log");
    let scheduler = BackupScheduler::new(settings_in(&dir), Arc::new(StubUploader("R1")));
    let now = ts("2025-11-20 10:00:00");

    // No database at all yet
    assert!(scheduler.is_backup_needed_at(now));

    let store = open_test_store(&dir);
    backup_log::append(
        &store.conn,
        &completed_at(now - TimeDelta::days(14) + TimeDelta::seconds(1)),
    );
    store.close().expect("close");
    assert!(!scheduler.is_backup_needed_at(now));

    let later = now + TimeDelta::seconds(1);
    assert!(scheduler.is_backup_needed_at(later));
}

#[test]
fn test_local_only_records_do_not_count_as_successful() {
    let dir = setup_test_dir("local_only_not_successful");
    let store = open_test_store(&dir);

    let now = ts("2025-11-20 10:00:00");
    let mut record = completed_at(now - TimeDelta::days(1));
    record.status = BackupStatus::LocalOnly;
    backup_log::append(&store.conn, &record);

    assert_eq!(backup_log::last_successful(&store.conn), None);
    store.close().expect("close");

    let scheduler = BackupScheduler::new(settings_in(&dir), Arc::new(StubUploader("R1")));
    assert!(scheduler.is_backup_needed_at(now));
}

#[test]
fn test_upload_failure_keeps_local_archive() {
    let dir = setup_test_dir("upload_failure_isolation");
    let store = open_test_store(&dir);
    entries::insert_entry(&store.conn, &sample_entry("Workshop", "2025-05-01", "2025-05-01", 3))
        .expect("insert");
    store.close().expect("close");

    let scheduler = BackupScheduler::new(settings_in(&dir), Arc::new(FailingUploader));

    let record = match scheduler.force() {
        BackupOutcome::Done(r) => r,
        other => panic!("expected Done, got {other:?}"),
    };

    assert_eq!(record.status, BackupStatus::LocalOnly);
    assert!(Path::new(&record.archive_path).is_file());

    let store = open_test_store(&dir);
    let history = backup_log::history(&store.conn, None).expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, BackupStatus::LocalOnly);
    assert_eq!(backup_log::last_successful(&store.conn), None);
}

#[test]
fn test_archive_failure_writes_no_record() {
    let dir = setup_test_dir("archive_failure_short_circuit");
    open_test_store(&dir).close().expect("close");

    // The backups "directory" is a regular file, so nothing can be written.
    let mut settings = settings_in(&dir);
    settings.backups_dir = dir.join("not_a_dir");
    fs::write(&settings.backups_dir, b"occupied").expect("write blocker");

    let scheduler = BackupScheduler::new(settings, Arc::new(StubUploader("R1")));
    assert!(matches!(scheduler.force(), BackupOutcome::Failed(_)));

    let store = open_test_store(&dir);
    assert!(backup_log::history(&store.conn, None).expect("history").is_empty());
}

#[test]
fn test_unreadable_photo_dir_fails_and_cleans_up() {
    let dir = setup_test_dir("photo_dir_not_a_dir");
    open_test_store(&dir).close().expect("close");

    let settings = settings_in(&dir);
    fs::write(&settings.photos_dir, b"not a directory").expect("write blocker");

    let scheduler = BackupScheduler::new(settings.clone(), Arc::new(StubUploader("R1")));
    let outcome = scheduler.force();
    assert!(matches!(outcome, BackupOutcome::Failed(_)), "{outcome:?}");

    // Neither the working directory nor a partial zip is left behind.
    assert!(file_names(&settings.backups_dir).is_empty());

    let store = open_test_store(&dir);
    assert!(backup_log::history(&store.conn, None).expect("history").is_empty());
}

#[test]
fn test_end_to_end_force_backup() {
    let dir = setup_test_dir("end_to_end_force");
    let settings = settings_in(&dir);

    let store = open_test_store(&dir);
    assert!(entries::list_all(&store.conn).is_empty());
    for (i, day) in ["2025-01-10", "2025-02-10", "2025-03-10"].iter().enumerate() {
        entries::insert_entry(&store.conn, &sample_entry(&format!("Course {i}"), day, day, 1))
            .expect("insert");
    }
    store.close().expect("close");

    fs::create_dir_all(settings.photos_dir.join("2025")).expect("photos");
    fs::write(settings.photos_dir.join("cpd_photo_a.png"), b"png").expect("photo");
    fs::write(settings.photos_dir.join("2025").join("b.jpg"), b"jpg").expect("photo");

    let scheduler = BackupScheduler::new(settings.clone(), Arc::new(StubUploader("R1")));
    let record = match scheduler.force() {
        BackupOutcome::Done(r) => r,
        other => panic!("expected Done, got {other:?}"),
    };

    assert_eq!(record.entries_count, 3);
    assert_eq!(record.status, BackupStatus::Completed);
    assert!(Path::new(&record.archive_path).is_file());

    let store = open_test_store(&dir);
    assert_eq!(
        backup_log::last_successful(&store.conn),
        Some(record.attempted_at)
    );
    store.close().expect("close");

    // Archive layout: database at the root, photos/ mirrored with relative paths
    let mut zip =
        zip::ZipArchive::new(File::open(&record.archive_path).expect("open zip")).expect("zip");
    let names: Vec<String> = zip.file_names().map(str::to_string).collect();
    assert!(names.contains(&"cpdtracker.sqlite".to_string()), "{names:?}");
    assert!(names.contains(&"photos/cpd_photo_a.png".to_string()), "{names:?}");
    assert!(names.contains(&"photos/2025/b.jpg".to_string()), "{names:?}");
    assert!(zip.by_name("photos/2025/b.jpg").is_ok());

    // Only the archive remains; the working directory is gone.
    let left = file_names(&settings.backups_dir);
    assert_eq!(left.len(), 1, "{left:?}");
    assert!(left[0].starts_with("backup_") && left[0].ends_with(".zip"));
}

#[test]
fn test_snapshot_is_a_readable_database() {
    let dir = setup_test_dir("snapshot_readable");
    let settings = settings_in(&dir);

    let store = open_test_store(&dir);
    entries::insert_entry(&store.conn, &sample_entry("Seminar", "2025-04-01", "2025-04-02", 5))
        .expect("insert");
    store.close().expect("close");

    let scheduler = BackupScheduler::new(settings, Arc::new(StubUploader("R1")));
    let record = match scheduler.force() {
        BackupOutcome::Done(r) => r,
        other => panic!("expected Done, got {other:?}"),
    };

    let mut zip =
        zip::ZipArchive::new(File::open(&record.archive_path).expect("open zip")).expect("zip");
    let restored = dir.join("restored.sqlite");
    {
        let mut inner = zip.by_name("cpdtracker.sqlite").expect("db in archive");
        let mut out = File::create(&restored).expect("create restored");
        std::io::copy(&mut inner, &mut out).expect("extract");
    }

    let conn = rusqlite::Connection::open(&restored).expect("open restored");
    let rows = entries::list_all(&conn);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Seminar");
}

#[test]
fn test_scheduled_run_skips_when_not_due() {
    let dir = setup_test_dir("scheduled_not_due");
    let settings = settings_in(&dir);
    let scheduler = BackupScheduler::new(settings.clone(), Arc::new(StubUploader("R1")));

    // First scheduled run: nothing logged yet, so a backup is due.
    assert!(matches!(
        scheduler.run(Trigger::Scheduled),
        BackupOutcome::Done(_)
    ));
    // Second one right after: not due any more.
    assert_eq!(scheduler.run_scheduled(), BackupOutcome::NotNeeded);
    // Forcing ignores the due check.
    assert!(matches!(scheduler.force(), BackupOutcome::Done(_)));
}

#[test]
fn test_pipeline_prunes_old_archives() {
    let dir = setup_test_dir("pipeline_prunes");
    let mut settings = settings_in(&dir);
    settings.keep_count = 2;
    touch_archives(
        &settings.backups_dir,
        &["20200101_000000", "20200102_000000", "20200103_000000"],
    );

    let scheduler = BackupScheduler::new(settings.clone(), Arc::new(StubUploader("R1")));
    let record = match scheduler.force() {
        BackupOutcome::Done(r) => r,
        other => panic!("expected Done, got {other:?}"),
    };

    let left = file_names(&settings.backups_dir);
    assert_eq!(left.len(), 2, "{left:?}");
    assert!(left.contains(&"backup_20200103_000000.zip".to_string()));
    assert!(Path::new(&record.archive_path).is_file());
}

#[test]
fn test_retention_is_idempotent() {
    let dir = setup_test_dir("retention_idempotent");
    let backups = dir.join("backups");

    touch_archives(&backups, &["20250101_000000", "20250102_000000"]);
    fs::write(backups.join("notes.txt"), b"keep me").expect("unrelated file");

    // k or fewer archives: no-op
    let report = retention::prune(&backups, 3);
    assert!(report.removed.is_empty());
    assert_eq!(report.kept.len(), 2);

    touch_archives(
        &backups,
        &["20250103_000000", "20250104_000000", "20250105_000000"],
    );

    let report = retention::prune(&backups, 3);
    let removed: Vec<String> = report
        .removed
        .iter()
        .map(|p| p.file_name().expect("name").to_string_lossy().to_string())
        .collect();
    assert_eq!(
        removed,
        vec!["backup_20250102_000000.zip", "backup_20250101_000000.zip"]
    );

    let after_first = file_names(&backups);
    let again = retention::prune(&backups, 3);
    assert!(again.removed.is_empty());
    assert_eq!(file_names(&backups), after_first);
    assert!(after_first.contains(&"notes.txt".to_string()));
}

#[test]
fn test_prune_missing_dir_is_noop() {
    let dir = setup_test_dir("prune_missing_dir");
    let report = retention::prune(&dir.join("nope"), 1);
    assert_eq!(report, retention::PruneReport::default());
}

/// Uploader that reports when it is entered and blocks until released.
struct GateUploader {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl Uploader for GateUploader {
    fn upload(&self, _local: &Path) -> Result<String, UploadError> {
        self.entered
            .lock()
            .map_err(|_| UploadError::Rejected("poisoned".into()))?
            .send(())
            .ok();
        self.release
            .lock()
            .map_err(|_| UploadError::Rejected("poisoned".into()))?
            .recv()
            .ok();
        Ok("R1".into())
    }
}

#[test]
fn test_overlapping_run_is_rejected() {
    let dir = setup_test_dir("overlap_guard");
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();

    let uploader = GateUploader {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
    };
    let scheduler = BackupScheduler::new(settings_in(&dir), Arc::new(uploader));

    let handle = scheduler.spawn(Trigger::Forced).expect("spawn");
    entered_rx.recv().expect("first run reached upload");

    assert!(scheduler.is_running());
    assert_eq!(scheduler.run(Trigger::Forced), BackupOutcome::AlreadyRunning);
    assert_eq!(handle.try_outcome(), None);

    release_tx.send(()).expect("release");
    assert!(matches!(handle.wait(), BackupOutcome::Done(_)));
    assert!(!scheduler.is_running());

    let store = open_test_store(&dir);
    assert_eq!(backup_log::history(&store.conn, None).expect("history").len(), 1);
}

#[test]
fn test_spawned_failure_is_reported_through_handle() {
    let dir = setup_test_dir("spawn_failure_handle");
    let mut settings = settings_in(&dir);
    settings.backups_dir = dir.join("blocked");
    fs::write(&settings.backups_dir, b"file").expect("blocker");

    let scheduler = BackupScheduler::new(settings, Arc::new(StubUploader("R1")));
    let outcome = scheduler.spawn(Trigger::Forced).expect("spawn").wait();
    assert!(matches!(outcome, BackupOutcome::Failed(_)));
}

#[test]
fn test_archive_without_database_or_photos() {
    let dir = setup_test_dir("archive_empty_sources");
    let settings = settings_in(&dir);

    let (path, count) = archiver::create_archive(&settings).expect("archive");
    assert_eq!(count, 0);

    let zip = zip::ZipArchive::new(File::open(&path).expect("open zip")).expect("zip");
    let names: Vec<&str> = zip.file_names().collect();
    assert_eq!(names, vec!["photos/"]);
}

#[test]
fn test_huge_interval_saturates_instead_of_panicking() {
    let mut cfg = Config::with_database("/tmp/unused_interval.sqlite");
    cfg.backup_interval_days = 200_000_000_000_000;

    let settings = BackupSettings::from_config(&cfg);
    assert_eq!(settings.interval, TimeDelta::MAX);

    let now = ts("2025-11-20 10:00:00");
    assert!(!is_due(Some(ts("2000-01-01 00:00:00")), now, settings.interval));
    assert!(is_due(None, now, settings.interval));

    assert_eq!(interval_from_days(-3), TimeDelta::zero());
    assert_eq!(interval_from_days(14), TimeDelta::days(14));
}

#[test]
fn test_unreadable_log_counts_as_due() {
    let dir = setup_test_dir("due_check_read_fault");
    let settings = settings_in(&dir);
    fs::write(&settings.db_path, "this is plain text, not an SQLite database file\n".repeat(100))
        .expect("write bogus db");

    let scheduler = BackupScheduler::new(settings, Arc::new(StubUploader("R1")));
    assert!(scheduler.is_backup_needed_at(ts("2025-11-20 10:00:00")));
}

#[test]
fn test_prune_skips_undeletable_archive() {
    let dir = setup_test_dir("prune_undeletable");
    let backups = dir.join("backups");
    touch_archives(
        &backups,
        &["20250102_000000", "20250103_000000", "20250104_000000"],
    );
    // Named like the oldest archive but a directory: removing it as a file fails.
    let stuck = backups.join("backup_20250101_000000.zip");
    fs::create_dir_all(&stuck).expect("stuck entry");

    let report = retention::prune(&backups, 1);

    assert_eq!(report.kept, vec![backups.join("backup_20250104_000000.zip")]);
    assert_eq!(report.failed, vec![stuck.clone()]);
    assert_eq!(
        report.removed,
        vec![
            backups.join("backup_20250103_000000.zip"),
            backups.join("backup_20250102_000000.zip"),
        ]
    );
    assert!(stuck.is_dir());
}

#[test]
fn test_lock_held_by_other_process_skips_run() {
    let dir = setup_test_dir("lock_held_elsewhere");
    let settings = settings_in(&dir);
    fs::create_dir_all(&settings.backups_dir).expect("backups dir");
    let marker = settings.backups_dir.join(lock::LOCK_FILE);
    fs::write(&marker, "4242\n").expect("foreign lock");

    let scheduler = BackupScheduler::new(settings.clone(), Arc::new(StubUploader("R1")));
    assert_eq!(scheduler.force(), BackupOutcome::AlreadyRunning);

    assert_eq!(file_names(&settings.backups_dir), vec![lock::LOCK_FILE.to_string()]);
    assert!(!settings.db_path.exists());
}

#[test]
fn test_stale_lock_is_taken_over() {
    let dir = setup_test_dir("lock_stale");
    let settings = settings_in(&dir);
    fs::create_dir_all(&settings.backups_dir).expect("backups dir");
    let marker = settings.backups_dir.join(lock::LOCK_FILE);
    fs::write(&marker, "4242\n").expect("old lock");
    File::options()
        .write(true)
        .open(&marker)
        .expect("open lock")
        .set_modified(SystemTime::now() - lock::STALE_AFTER - Duration::from_secs(60))
        .expect("age lock");

    let scheduler = BackupScheduler::new(settings.clone(), Arc::new(StubUploader("R1")));
    assert!(matches!(scheduler.force(), BackupOutcome::Done(_)));

    // Released after the run
    assert!(!marker.exists());
}

#[test]
fn test_lock_is_exclusive_until_dropped() {
    let dir = setup_test_dir("lock_exclusive");
    let backups = dir.join("backups");

    let first = lock::try_acquire(&backups).expect("lock io").expect("acquired");
    assert!(lock::try_acquire(&backups).expect("lock io").is_none());

    drop(first);
    assert!(lock::try_acquire(&backups).expect("lock io").is_some());
}
