//! Edit handler for Kairu

use crate::KairuApp;
use crate::todo::TaskId;
use crate::validation::EditTaskInput;
use anyhow::Result;

impl KairuApp {
    /// Change any field of an active task
    ///
    /// `none` clears details, due, goal and recurrence. All fields are
    /// validated before the task is touched.
    pub fn handle_edit(&mut self, id: TaskId, input: EditTaskInput) -> Result<String> {
        let patch = input.validate()?;
        self.data.edit_task(id, patch)?;
        self.save_data_with_message(&format!("Edit task {}", id))?;
        Ok(format!("Task {} updated successfully", id))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::KairuError;
    use crate::todo::Priority;
    use crate::validation::{AddTaskInput, EditTaskInput};
    use crate::{Config, KairuApp};
    use tempfile::TempDir;

    fn app_with_task() -> (KairuApp, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut app = KairuApp::new(temp_dir.path().join("kairu.toml"), false, Config::default())
            .unwrap();
        app.handle_group_add("Work".to_string()).unwrap();
        app.handle_goal_add("Ship v1".to_string(), None).unwrap();
        app.handle_add(AddTaskInput {
            name: "Write report".to_string(),
            group: "Work".to_string(),
            goal: Some("Ship v1".to_string()),
            due: Some("2025-01-10".to_string()),
            details: Some("Quarterly numbers".to_string()),
            ..Default::default()
        })
        .unwrap();
        (app, temp_dir)
    }

    #[test]
    fn test_edit_fields_and_clear() {
        let (mut app, _temp_dir) = app_with_task();
        let result = app
            .handle_edit(
                1,
                EditTaskInput {
                    priority: Some("high".to_string()),
                    due: Some("none".to_string()),
                    goal: Some("none".to_string()),
                    details: Some("none".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(result, "Task 1 updated successfully");

        let task = app.data().task(1).unwrap();
        assert_eq!(task.priority, Priority::high);
        assert_eq!(task.due, None);
        assert_eq!(task.goal, None);
        assert_eq!(task.details, None);
    }

    #[test]
    fn test_invalid_field_leaves_task_unchanged() {
        let (mut app, _temp_dir) = app_with_task();
        let before = app.data().task(1).unwrap().clone();
        let err = app
            .handle_edit(
                1,
                EditTaskInput {
                    name: Some("Renamed".to_string()),
                    due: Some("next tuesday".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KairuError>(),
            Some(KairuError::Validation { .. })
        ));
        assert_eq!(app.data().task(1).unwrap(), &before);
    }

    #[test]
    fn test_edit_unknown_task() {
        let (mut app, _temp_dir) = app_with_task();
        let err = app
            .handle_edit(
                99,
                EditTaskInput {
                    name: Some("Ghost".to_string()),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KairuError>(),
            Some(KairuError::NotFound { .. })
        ));
    }
}
