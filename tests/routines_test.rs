//! Interactive routines driven from a hand-written data file

mod common;

use common::data_path;
use kairu::{Config, KairuApp, KairuError};
use std::fs;
use std::io::Cursor;
use tempfile::TempDir;

const STALE_FILE: &str = r#"
[[groups]]
id = 1
name = "Work"

[[tasks]]
id = 3
name = "Tax forms"
group = 1
priority = "high"
created_at = "2020-01-01T09:00:00"
due = "2020-02-01T17:00:00"
"#;

fn app_from(content: &str) -> (KairuApp, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    fs::write(data_path(&temp_dir), content).unwrap();
    let app = KairuApp::new(data_path(&temp_dir), false, Config::default()).unwrap();
    (app, temp_dir)
}

#[test]
fn test_unstuck_reschedule_is_saved() {
    let (mut app, temp_dir) = app_from(STALE_FILE);

    let mut input = Cursor::new(b"r\n2099-06-01 10:00\n".to_vec());
    let mut out = Vec::new();
    app.handle_unstuck(&mut input, &mut out).unwrap();
    let output = String::from_utf8(out).unwrap();
    assert!(output.contains("Task 'Tax forms' in group 'Work' was created on 2020-01-01"));
    assert!(output.contains("was due 2020-02-01 17:00"));
    assert!(output.contains("Task 3 rescheduled to 2099-06-01 10:00."));
    drop(app);

    let app = KairuApp::new(data_path(&temp_dir), false, Config::default()).unwrap();
    let due = app.data().task(3).unwrap().due.unwrap();
    assert_eq!(due.format("%Y-%m-%d %H:%M").to_string(), "2099-06-01 10:00");
}

#[test]
fn test_unstuck_bad_date_changes_nothing() {
    let (mut app, _temp_dir) = app_from(STALE_FILE);

    let mut input = Cursor::new(b"r\nsoon\n".to_vec());
    let mut out = Vec::new();
    let err = app.handle_unstuck(&mut input, &mut out).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<KairuError>(),
        Some(KairuError::Validation { .. })
    ));
    let due = app.data().task(3).unwrap().due.unwrap();
    assert_eq!(due.format("%Y-%m-%d").to_string(), "2020-02-01");
}

#[test]
fn test_plan_day_unknown_id_stars_nothing() {
    let (mut app, _temp_dir) = app_from(STALE_FILE);

    let mut input = Cursor::new(b"n\n3, 42\n".to_vec());
    let mut out = Vec::new();
    let err = app.handle_plan_day(&mut input, &mut out).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<KairuError>(),
        Some(KairuError::NotFound { .. })
    ));
    assert!(!app.data().task(3).unwrap().starred);
    assert!(String::from_utf8(out).unwrap().contains("Tax forms"));
}

#[test]
fn test_shutdown_with_empty_input_keeps_schedule() {
    let (mut app, _temp_dir) = app_from(STALE_FILE);

    let mut input = Cursor::new(Vec::new());
    let mut out = Vec::new();
    app.handle_shutdown(&mut input, &mut out).unwrap();
    let output = String::from_utf8(out).unwrap();
    assert!(output.contains("No tasks were completed today."));
    assert!(output.contains("ID 3: Tax forms"));
    assert!(!output.contains("Daily Report"));
    let due = app.data().task(3).unwrap().due.unwrap();
    assert_eq!(due.format("%Y-%m-%d").to_string(), "2020-02-01");
}
