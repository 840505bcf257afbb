mod common;
use common::{cli, init_db_with_data, setup_test_dir};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;

#[test]
fn test_export_csv_all() {
    let dir = setup_test_dir("export_csv_all");
    init_db_with_data(&dir);

    let out = dir.join("all.csv");
    cli(&dir)
        .args(["export", "--format", "csv", "--file"])
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("CSV export completed"));

    let mut rdr = csv::Reader::from_path(&out).expect("open exported csv");
    let headers = rdr.headers().expect("headers").clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec![
            "Entry Date",
            "Start Date",
            "End Date",
            "Activity Name",
            "Activity Type",
            "Description",
            "CPD Points",
            "Photo"
        ]
    );

    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.expect("row")).collect();
    assert_eq!(rows.len(), 2);
    // Newest activity first
    assert_eq!(&rows[0][1], "2025-10-15");
    assert_eq!(&rows[0][3], "Paper review");
    assert_eq!(&rows[1][4], "Conference");
    assert_eq!(&rows[1][6], "8");
}

#[test]
fn test_export_json_range() {
    let dir = setup_test_dir("export_json_range");
    init_db_with_data(&dir);

    let out = dir.join("sept.json");
    cli(&dir)
        .args(["export", "--format", "json", "--range", "2025-09", "--file"])
        .arg(&out)
        .assert()
        .success();

    let content = fs::read_to_string(&out).expect("read exported json");
    let rows: serde_json::Value = serde_json::from_str(&content).expect("valid json");
    let rows = rows.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "RustConf");
    assert_eq!(rows[0]["category"], "Conference");
    assert_eq!(rows[0]["points"], 8);
}

#[test]
fn test_export_custom_range_spans_months() {
    let dir = setup_test_dir("export_custom_range");
    init_db_with_data(&dir);

    let out = dir.join("span.json");
    cli(&dir)
        .args([
            "export",
            "--format",
            "json",
            "--range",
            "2025-09:2025-10",
            "--file",
        ])
        .arg(&out)
        .assert()
        .success();

    let rows: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read")).expect("json");
    assert_eq!(rows.as_array().expect("array").len(), 2);
}

#[test]
fn test_export_default_path_in_exports_dir() {
    let dir = setup_test_dir("export_default_path");
    init_db_with_data(&dir);

    cli(&dir)
        .args(["export", "--format", "json"])
        .assert()
        .success();

    let exported: Vec<String> = fs::read_dir(dir.join("exports"))
        .expect("exports dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(exported.len(), 1, "{exported:?}");
    assert!(exported[0].starts_with("cpd_export_") && exported[0].ends_with(".json"));
}

#[test]
fn test_export_without_entries_writes_nothing() {
    let dir = setup_test_dir("export_empty");
    cli(&dir).args(["--test", "init"]).assert().success();

    let out = dir.join("empty.csv");
    cli(&dir)
        .args(["export", "--file"])
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("No entries found to export"));

    assert!(!out.exists());
}

#[test]
fn test_export_existing_file_needs_force() {
    let dir = setup_test_dir("export_force");
    init_db_with_data(&dir);

    let out = dir.join("taken.csv");
    fs::write(&out, "old content").expect("pre-existing file");

    cli(&dir)
        .args(["export", "--file"])
        .arg(&out)
        .write_stdin("n\n")
        .assert()
        .failure()
        .stderr(contains("cancelled"));
    assert_eq!(fs::read_to_string(&out).expect("read"), "old content");

    cli(&dir)
        .args(["export", "--force", "--file"])
        .arg(&out)
        .assert()
        .success();
    assert!(
        fs::read_to_string(&out)
            .expect("read")
            .contains("RustConf")
    );
}

#[test]
fn test_export_rejects_bad_range() {
    let dir = setup_test_dir("export_bad_range");
    init_db_with_data(&dir);

    cli(&dir)
        .args(["export", "--range", "2025-9"])
        .assert()
        .failure()
        .stderr(contains("Invalid date").or(contains("range")));
}
