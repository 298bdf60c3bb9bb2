mod common;

use std::sync::Arc;

use logistics_risk_dashboard::data::{columns, DataLoader, LoaderError};
use tempfile::TempDir;

#[test]
fn same_path_is_read_from_disk_once() {
    let tmp = TempDir::new().unwrap();
    common::write_csv(tmp.path(), "traffic.csv", common::TRAFFIC);
    let path = tmp.path().join("traffic.csv");

    let loader = DataLoader::new();
    assert!(!loader.is_cached(&path));

    let first = loader.load_csv(&path).unwrap();
    let second = loader.load_csv(&path).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(loader.disk_reads(), 1);
    assert!(loader.is_cached(&path));
    assert_eq!(first.height(), 10);
}

#[test]
fn missing_file_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let loader = DataLoader::new();

    let err = loader.load_csv(tmp.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, LoaderError::NotFound(_)));
    assert_eq!(loader.disk_reads(), 0);
}

#[test]
fn padded_headers_are_trimmed() {
    let tmp = TempDir::new().unwrap();
    common::write_csv(
        tmp.path(),
        "rail.csv",
        " State Name ,Report Year\nTexas,2020\nOhio,2021\n",
    );

    let df = DataLoader::new()
        .load_csv(tmp.path().join("rail.csv"))
        .unwrap();
    let states = columns::text(&df, "State Name").unwrap();
    assert_eq!(states, vec![Some("Texas".to_string()), Some("Ohio".to_string())]);
}

#[test]
fn preload_warms_every_readable_path() {
    let tmp = TempDir::new().unwrap();
    common::write_csv(tmp.path(), "a.csv", common::SHIPPING);
    common::write_csv(tmp.path(), "b.csv", common::SUPPLY_CHAIN);
    let paths = vec![
        tmp.path().join("a.csv"),
        tmp.path().join("b.csv"),
        tmp.path().join("missing.csv"),
    ];

    let loader = DataLoader::new();
    loader.preload(&paths);

    assert!(loader.is_cached(&paths[0]));
    assert!(loader.is_cached(&paths[1]));
    assert!(!loader.is_cached(&paths[2]));
    assert_eq!(loader.disk_reads(), 2);
}

#[test]
fn preview_keeps_requested_rows() {
    let tmp = TempDir::new().unwrap();
    common::write_csv(tmp.path(), "ship.csv", common::SHIPPING);
    let df = DataLoader::new()
        .load_csv(tmp.path().join("ship.csv"))
        .unwrap();

    let preview = DataLoader::preview(&df, 2);
    assert_eq!(preview.rows.len(), 2);
    assert_eq!(preview.columns.len(), 12);
    assert_eq!(preview.rows[0][0], "Grounding");
}

#[test]
fn concurrent_loads_of_one_path_read_once() {
    let tmp = TempDir::new().unwrap();
    common::write_csv(tmp.path(), "traffic.csv", common::TRAFFIC);
    let path = tmp.path().join("traffic.csv");
    let loader = DataLoader::new();
    let (loader, path) = (&loader, &path);

    let tables: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(move || loader.load_csv(path).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(loader.disk_reads(), 1);
    assert!(tables.iter().all(|t| Arc::ptr_eq(t, &tables[0])));
}

#[test]
fn failed_load_is_retried_once_the_file_exists() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("late.csv");
    let loader = DataLoader::new();

    assert!(loader.load_csv(&path).is_err());
    assert!(!loader.is_cached(&path));

    common::write_csv(tmp.path(), "late.csv", common::SHIPPING);
    assert_eq!(loader.load_csv(&path).unwrap().height(), 5);
    assert_eq!(loader.disk_reads(), 1);
}
