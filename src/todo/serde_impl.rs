//! Serialization and deserialization implementations for TodoData
//!
//! The file layout is flat: counters first, then the profile table, then the
//! goal, group, task and archive arrays. The group index is derived state and
//! is rebuilt here on load.

use super::profile::Profile;
use super::task::{GoalId, GroupId, Task, TaskId};
use super::todo_data::{FORMAT_VERSION, Goal, Group, TodoData};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};

/// On-disk shape of TodoData, every section optional
#[derive(Deserialize)]
#[serde(default)]
struct TodoDataFile {
    format_version: u32,
    last_task_id: TaskId,
    last_group_id: GroupId,
    last_goal_id: GoalId,
    profile: Profile,
    goals: Vec<Goal>,
    groups: Vec<Group>,
    tasks: Vec<Task>,
    archive: Vec<Task>,
}

impl Default for TodoDataFile {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            last_task_id: 0,
            last_group_id: 0,
            last_goal_id: 0,
            profile: Profile::default(),
            goals: Vec::new(),
            groups: Vec::new(),
            tasks: Vec::new(),
            archive: Vec::new(),
        }
    }
}

impl<'de> Deserialize<'de> for TodoData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let file = TodoDataFile::deserialize(deserializer)?;

        if file.format_version > FORMAT_VERSION {
            return Err(D::Error::custom(format!(
                "unsupported format_version {} (this build reads up to {})",
                file.format_version, FORMAT_VERSION
            )));
        }

        // Task ids must be unique across active tasks and the archive
        let mut seen = HashSet::new();
        for task in file.tasks.iter().chain(file.archive.iter()) {
            if !seen.insert(task.id) {
                return Err(D::Error::custom(format!("duplicate task id {}", task.id)));
            }
        }

        let group_ids: HashSet<GroupId> = file.groups.iter().map(|g| g.id).collect();
        let mut group_index: HashMap<GroupId, Vec<TaskId>> =
            group_ids.iter().map(|&id| (id, Vec::new())).collect();
        for task in &file.tasks {
            if !group_ids.contains(&task.group) {
                return Err(D::Error::custom(format!(
                    "task {} refers to unknown group {}",
                    task.id, task.group
                )));
            }
            group_index.entry(task.group).or_default().push(task.id);
        }

        // Never reissue an id, even if the counters were edited by hand
        let max_task_id = seen.iter().copied().max().unwrap_or(0);
        let max_group_id = file.groups.iter().map(|g| g.id).max().unwrap_or(0);
        let max_goal_id = file.goals.iter().map(|g| g.id).max().unwrap_or(0);

        let mut profile = file.profile;
        profile.repair();

        Ok(TodoData {
            format_version: FORMAT_VERSION,
            last_task_id: file.last_task_id.max(max_task_id),
            last_group_id: file.last_group_id.max(max_group_id),
            last_goal_id: file.last_goal_id.max(max_goal_id),
            goals: file.goals,
            groups: file.groups,
            tasks: file.tasks,
            archive: file.archive,
            profile,
            group_index,
        })
    }
}

impl Serialize for TodoData {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("TodoData", 9)?;
        state.serialize_field("format_version", &self.format_version)?;
        state.serialize_field("last_task_id", &self.last_task_id)?;
        state.serialize_field("last_group_id", &self.last_group_id)?;
        state.serialize_field("last_goal_id", &self.last_goal_id)?;
        state.serialize_field("profile", &self.profile)?;
        state.serialize_field("goals", &self.goals)?;
        state.serialize_field("groups", &self.groups)?;
        state.serialize_field("tasks", &self.tasks)?;
        state.serialize_field("archive", &self.archive)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::todo::task::{NewTask, Priority, Recurrence};
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 2, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_group_index_rebuilt_on_deserialize() {
        let mut data = TodoData::new();
        let work = data.add_group("Work").unwrap();
        data.add_goal("Ship v1", Some("First release".to_string()))
            .unwrap();
        let a = data
            .add_task(
                NewTask {
                    name: "Draft".to_string(),
                    group: "Work".to_string(),
                    goal: Some("ship v1".to_string()),
                    priority: Priority::high,
                    due: Some(at(3, 17)),
                    recurrence: Some(Recurrence::weekly),
                    ..Default::default()
                },
                at(1, 9),
            )
            .unwrap();
        data.add_sub_task(a, "Outline").unwrap();
        data.log_progress(a, "Started", at(2, 10)).unwrap();
        data.complete_task(a, at(2, 11), &Config::default()).unwrap();

        let toml_str = toml::to_string_pretty(&data).unwrap();
        assert!(!toml_str.contains("group_index"));

        let loaded: TodoData = toml::from_str(&toml_str).unwrap();
        assert_eq!(loaded.group_task_ids(work), data.group_task_ids(work));
        assert_eq!(loaded.tasks(), data.tasks());
        assert_eq!(loaded.archive(), data.archive());
        assert_eq!(loaded.profile, data.profile);
        assert_eq!(loaded.last_task_id(), data.last_task_id());
    }

    #[test]
    fn test_empty_document_loads_defaults() {
        let data: TodoData = toml::from_str("").unwrap();
        assert!(data.tasks().is_empty());
        assert_eq!(data.profile.active_theme, "default");
    }

    #[test]
    fn test_duplicate_task_ids_rejected() {
        let toml_str = r#"
[[groups]]
id = 1
name = "Work"

[[tasks]]
id = 4
name = "One"
group = 1
created_at = "2025-01-01T09:00:00"

[[archive]]
id = 4
name = "Two"
group = 1
status = "completed"
created_at = "2025-01-01T09:00:00"
"#;
        let result: Result<TodoData, _> = toml::from_str(toml_str);
        assert!(result.unwrap_err().to_string().contains("duplicate task id 4"));
    }

    #[test]
    fn test_counter_never_below_existing_ids() {
        let toml_str = r#"
last_task_id = 1

[[groups]]
id = 1
name = "Work"

[[tasks]]
id = 7
name = "One"
group = 1
created_at = "2025-01-01T09:00:00"
"#;
        let data: TodoData = toml::from_str(toml_str).unwrap();
        assert_eq!(data.last_task_id(), 7);
    }
}
