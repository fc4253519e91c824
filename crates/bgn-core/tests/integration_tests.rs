//! Integration tests for bgn-core
//!
//! These tests exercise the archive → diff → ledger workflow on CSV and
//! Excel snapshots laid out the way the fetcher writes them.

use std::fs;
use std::path::{Path, PathBuf};

use bgn_core::{
    load_table, Archive, CellValue, Error, Ledger, LedgerConfig, MergePolicy, Record,
    SnapshotDiffer,
};
use chrono::NaiveDate;
use tempfile::TempDir;

fn write_snapshot(dir: &Path, date: &str, csv: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{}-bgn-action-list.csv", date)), csv).unwrap();
}

fn differ_in(dir: &TempDir) -> SnapshotDiffer {
    SnapshotDiffer::new(
        Archive::new(dir.path().join("raw")),
        Ledger::new(&LedgerConfig {
            path: dir.path().join("latest.csv"),
            ..LedgerConfig::default()
        }),
    )
}

fn ids(records: &[Record]) -> Vec<i64> {
    records
        .iter()
        .map(|r| match r.get("Feature ID") {
            Some(CellValue::Int(id)) => *id,
            other => panic!("unexpected Feature ID: {:?}", other),
        })
        .collect()
}

const JANUARY: &str = "Feature ID,Name,State\n\
101,Bald Knob,AR\n\
102,Cedar Creek,TX\n\
103,Mill Pond,ME\n";

const FEBRUARY: &str = "Feature ID,Name,State\n\
101,Bald Knob,AR\n\
102,Cedar Run,TX\n\
104,Sweetwater Canyon,AZ\n";

// =============================================================================
// Diff Tests
// =============================================================================

#[test]
fn test_first_release_creates_ledger_without_diff() {
    let dir = TempDir::new().unwrap();
    write_snapshot(&dir.path().join("raw"), "2023-01-01", "id,name\n1,X\n");

    let differ = differ_in(&dir);
    assert!(differ.diff_and_merge().unwrap().is_none());
    assert_eq!(
        fs::read_to_string(dir.path().join("latest.csv")).unwrap(),
        "id,name\n1,X\n"
    );
}

#[test]
fn test_new_row_is_reported_and_merged() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw");
    write_snapshot(&raw, "2023-01-01", "id,name\n1,X\n");
    write_snapshot(&raw, "2023-02-01", "id,name\n1,X\n2,Y\n");

    let diff = differ_in(&dir).diff_and_merge().unwrap().unwrap();
    assert_eq!(diff.len(), 1);
    assert_eq!(diff[0].get("id"), Some(&CellValue::Int(2)));
    assert_eq!(diff[0].get("name"), Some(&CellValue::from("Y")));
}

#[test]
fn test_changed_and_removed_features_are_reported() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw");
    write_snapshot(&raw, "2023-01-01", JANUARY);
    write_snapshot(&raw, "2023-02-01", FEBRUARY);

    let diff = differ_in(&dir).diff_latest().unwrap().unwrap();

    // February-only rows first, then January-only rows; unchanged 101 absent
    assert_eq!(ids(&diff), vec![102, 104, 102, 103]);
    assert_eq!(diff[0].get("Name"), Some(&CellValue::from("Cedar Run")));
    assert_eq!(diff[2].get("Name"), Some(&CellValue::from("Cedar Creek")));
}

#[test]
fn test_diff_is_symmetric() {
    let forward = TempDir::new().unwrap();
    write_snapshot(&forward.path().join("raw"), "2023-01-01", JANUARY);
    write_snapshot(&forward.path().join("raw"), "2023-02-01", FEBRUARY);

    let backward = TempDir::new().unwrap();
    write_snapshot(&backward.path().join("raw"), "2023-01-01", FEBRUARY);
    write_snapshot(&backward.path().join("raw"), "2023-02-01", JANUARY);

    let mut a = ids(&differ_in(&forward).diff_latest().unwrap().unwrap());
    let mut b = ids(&differ_in(&backward).diff_latest().unwrap().unwrap());
    a.sort();
    b.sort();
    assert_eq!(a, b);
}

#[test]
fn test_identical_releases_produce_empty_diff() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw");
    write_snapshot(&raw, "2023-01-01", JANUARY);
    write_snapshot(&raw, "2023-02-01", JANUARY);

    let diff = differ_in(&dir).diff_and_merge().unwrap().unwrap();
    assert!(diff.is_empty());
}

#[test]
fn test_only_two_newest_snapshots_are_compared() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw");
    write_snapshot(&raw, "2022-12-01", "id,name\n9,Old\n");
    write_snapshot(&raw, "2023-01-01", "id,name\n1,X\n");
    write_snapshot(&raw, "2023-02-01", "id,name\n1,X\n");

    let diff = differ_in(&dir).diff_latest().unwrap().unwrap();
    assert!(diff.is_empty());
}

#[test]
fn test_snapshots_ordered_by_date_not_listing() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw");
    // Written newest first, plus a stray file that is not a snapshot
    write_snapshot(&raw, "2023-10-01", "id\n3\n");
    write_snapshot(&raw, "2023-09-01", "id\n2\n");
    write_snapshot(&raw, "2023-08-01", "id\n1\n");
    fs::write(raw.join("notes.txt"), "ignore me").unwrap();

    let archive = Archive::new(&raw);
    let dates: Vec<_> = archive.list().unwrap().iter().map(|s| s.date).collect();
    assert_eq!(
        dates,
        vec![
            NaiveDate::from_ymd_opt(2023, 8, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 9, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 10, 1).unwrap(),
        ]
    );

    let diff = differ_in(&dir).diff_latest().unwrap().unwrap();
    let values: Vec<_> = diff.iter().map(|r| r.get("id").cloned()).collect();
    assert_eq!(
        values,
        vec![Some(CellValue::Int(3)), Some(CellValue::Int(2))]
    );
}

#[test]
fn test_empty_archive_is_not_found() {
    let dir = TempDir::new().unwrap();
    let result = differ_in(&dir).diff_and_merge();
    assert!(matches!(result, Err(Error::NotFound(_))));
    assert!(!dir.path().join("latest.csv").exists());
}

// =============================================================================
// Ledger Tests
// =============================================================================

#[test]
fn test_ledger_concatenates_columns_across_runs() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw");
    let differ = differ_in(&dir);

    write_snapshot(&raw, "2023-01-01", "id,name\n1,X\n");
    differ.diff_and_merge().unwrap();

    write_snapshot(&raw, "2023-02-01", "id,name\n1,X\n2,Y\n");
    differ.diff_and_merge().unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("latest.csv")).unwrap(),
        "id,name,id,name\n1,X,1,X\n2,Y,,\n"
    );
}

#[test]
fn test_diff_latest_leaves_ledger_alone() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw");
    write_snapshot(&raw, "2023-01-01", "id,name\n1,X\n");
    write_snapshot(&raw, "2023-02-01", "id,name\n2,Y\n");

    differ_in(&dir).diff_latest().unwrap();
    assert!(!dir.path().join("latest.csv").exists());
}

#[test]
fn test_row_ledger_keeps_one_row_per_feature() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw");
    let differ = SnapshotDiffer::new(
        Archive::new(&raw),
        Ledger::new(&LedgerConfig {
            path: dir.path().join("latest.csv"),
            merge: MergePolicy::Rows,
            key_column: Some("Feature ID".to_string()),
        }),
    );

    write_snapshot(&raw, "2023-01-01", JANUARY);
    differ.diff_and_merge().unwrap();
    write_snapshot(&raw, "2023-02-01", FEBRUARY);
    differ.diff_and_merge().unwrap();

    let ledger = differ.ledger().load().unwrap().unwrap();
    let feature_ids = ids(&ledger.records());
    assert_eq!(feature_ids, vec![103, 101, 102, 104]);
    assert_eq!(
        ledger.records()[2].get("Name"),
        Some(&CellValue::from("Cedar Run"))
    );
}

// =============================================================================
// Spreadsheet Tests
// =============================================================================

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn archive_fixture(raw: &Path, fixture_name: &str, date: &str) -> PathBuf {
    fs::create_dir_all(raw).unwrap();
    let target = raw.join(format!("{}-bgn-action-list.xlsx", date));
    fs::copy(fixture(fixture_name), &target).unwrap();
    target
}

fn midnight(y: i32, m: u32, d: u32) -> CellValue {
    CellValue::DateTime(
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    )
}

#[test]
fn test_spreadsheet_snapshot_round_trips_through_ledger() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw");
    let january = archive_fixture(&raw, "action_list_2024-01.xlsx", "2024-01-05");

    let differ = differ_in(&dir);
    assert!(differ.diff_and_merge().unwrap().is_none());

    let ledger_text = fs::read_to_string(dir.path().join("latest.csv")).unwrap();
    let mut lines = ledger_text.lines();
    assert_eq!(lines.next(), Some("Feature ID,Name,Decision Date,Unnamed: 3"));
    assert_eq!(lines.next(), Some("101.0,Bald Knob,2024-01-05,Approved"));

    // Float and date cells read back with the types the workbook had
    let snapshot = load_table(&january).unwrap();
    assert_eq!(differ.ledger().load().unwrap().unwrap(), snapshot);
}

#[test]
fn test_spreadsheet_snapshots_diff_with_typed_cells() {
    let dir = TempDir::new().unwrap();
    let raw = dir.path().join("raw");
    archive_fixture(&raw, "action_list_2024-01.xlsx", "2024-01-05");
    archive_fixture(&raw, "action_list_2024-02.xlsx", "2024-02-02");

    let diff = differ_in(&dir).diff_and_merge().unwrap().unwrap();

    assert_eq!(diff.len(), 2);
    assert_eq!(diff[0].get("Feature ID"), Some(&CellValue::Float(104.0)));
    assert_eq!(diff[0].get("Name"), Some(&CellValue::from("Sweetwater Canyon")));
    assert_eq!(diff[0].get("Decision Date"), Some(&midnight(2024, 2, 2)));
    assert_eq!(diff[1].get("Feature ID"), Some(&CellValue::Float(102.0)));
    assert_eq!(diff[1].get("Decision Date"), Some(&midnight(2024, 1, 5)));

    // First merge writes the newest workbook as the ledger
    let ledger = fs::read_to_string(dir.path().join("latest.csv")).unwrap();
    assert!(ledger.contains("104.0,Sweetwater Canyon,2024-02-02,Approved\n"));
}
