//! Common test utilities for integration tests
#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use kairu::todo::{NewTask, Priority, TaskId, TodoData};
use kairu::{Config, KairuApp};
use tempfile::TempDir;

/// Create a test app backed by a data file in a temporary directory
pub fn get_test_app() -> (KairuApp, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let app = KairuApp::new(data_path(&temp_dir), false, Config::default()).unwrap();
    (app, temp_dir)
}

/// Path of the data file inside a test directory
pub fn data_path(temp_dir: &TempDir) -> std::path::PathBuf {
    temp_dir.path().join("kairu.toml")
}

/// Extract the task id from an `add` response
/// Response format: "Task '<name>' added to group '<group>' with ID: <id>"
pub fn extract_id_from_response(response: &str) -> TaskId {
    response
        .rsplit("ID: ")
        .next()
        .and_then(|id| id.trim().parse().ok())
        .unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

/// A task in `group` with everything else defaulted
pub fn new_task(name: &str, group: &str) -> NewTask {
    NewTask {
        name: name.to_string(),
        group: group.to_string(),
        ..Default::default()
    }
}

/// Model with a "Work" and a "Home" group
pub fn data_with_groups() -> TodoData {
    let mut data = TodoData::new();
    data.add_group("Work").unwrap();
    data.add_group("Home").unwrap();
    data
}

pub fn high(name: &str, group: &str) -> NewTask {
    NewTask {
        priority: Priority::high,
        ..new_task(name, group)
    }
}
