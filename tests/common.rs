#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use cpdtracker::core::backup::BackupSettings;
use cpdtracker::core::backup::upload::{UploadError, Uploader};
use cpdtracker::db::{Store, open_store};
use cpdtracker::models::{Category, NewEntry};
use chrono::{NaiveDate, TimeDelta};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub fn rti() -> Command {
    cargo_bin_cmd!("cpdtracker")
}

/// Create a fresh, empty directory for one test inside the system temp dir.
/// The database and every folder derived from it live there.
pub fn setup_test_dir(name: &str) -> PathBuf {
    let mut path: PathBuf = env::temp_dir();
    path.push("cpdtracker_tests");
    path.push(name);
    fs::remove_dir_all(&path).ok();
    fs::create_dir_all(&path).expect("create test dir");
    path
}

pub fn db_in(dir: &Path) -> String {
    dir.join("cpdtracker.sqlite").to_string_lossy().to_string()
}

/// Binary invocation bound to the test directory: `--db` points inside it and
/// HOME/APPDATA are redirected so no user configuration leaks in.
pub fn cli(dir: &Path) -> Command {
    let mut cmd = rti();
    cmd.env("HOME", dir)
        .env("APPDATA", dir)
        .env_remove("EDITOR")
        .args(["--db", &db_in(dir)]);
    cmd
}

/// Initialize the database and add two entries without triggering backups.
pub fn init_db_with_data(dir: &Path) {
    cli(dir).args(["--test", "init"]).assert().success();

    cli(dir)
        .args([
            "add",
            "--start",
            "2025-09-01",
            "--end",
            "2025-09-02",
            "--name",
            "RustConf",
            "--category",
            "conference",
            "--description",
            "Talks on async Rust",
            "--points",
            "8",
            "--no-backup",
        ])
        .assert()
        .success();

    cli(dir)
        .args([
            "add",
            "--start",
            "2025-10-15",
            "--end",
            "2025-10-15",
            "--name",
            "Paper review",
            "--category",
            "Paper",
            "--description",
            "Reviewed a journal submission",
            "--points",
            "2",
            "--no-backup",
        ])
        .assert()
        .success();
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

pub fn sample_entry(name: &str, start: &str, end: &str, points: u32) -> NewEntry {
    NewEntry::new(
        date(start),
        date(end),
        name,
        Category::Course,
        "Worked through the material",
    )
    .expect("valid entry")
    .with_points(points)
}

pub fn open_test_store(dir: &Path) -> Store {
    open_store(db_in(dir)).expect("open store")
}

/// Pipeline settings rooted in the test directory.
pub fn settings_in(dir: &Path) -> BackupSettings {
    BackupSettings {
        db_path: PathBuf::from(db_in(dir)),
        photos_dir: dir.join("photos"),
        backups_dir: dir.join("backups"),
        interval: TimeDelta::days(14),
        keep_count: 10,
    }
}

/// Uploader that always succeeds with a fixed remote id.
pub struct StubUploader(pub &'static str);

impl Uploader for StubUploader {
    fn upload(&self, _local: &Path) -> Result<String, UploadError> {
        Ok(self.0.to_string())
    }
}

/// Uploader that always fails.
pub struct FailingUploader;

impl Uploader for FailingUploader {
    fn upload(&self, _local: &Path) -> Result<String, UploadError> {
        Err(UploadError::Rejected("remote storage offline".into()))
    }
}

/// Create empty files that look like archives, named after `stamps`.
pub fn touch_archives(backups_dir: &Path, stamps: &[&str]) {
    fs::create_dir_all(backups_dir).expect("create backups dir");
    for s in stamps {
        fs::write(backups_dir.join(format!("backup_{s}.zip")), b"zip").expect("write archive");
    }
}

pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}
