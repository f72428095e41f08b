//! Status handlers: complete, star, log and delete

use crate::KairuApp;
use crate::formatting;
use crate::todo::{TaskId, local_now};
use anyhow::Result;
use tracing::info;

impl KairuApp {
    /// Complete an active task
    ///
    /// Awards points, updates the streak, archives the task and schedules the
    /// next occurrence of a recurring task.
    pub fn handle_done(&mut self, id: TaskId) -> Result<String> {
        let completion = self.data.complete_task(id, local_now(), &self.config)?;
        for achievement in &completion.achievements {
            info!("Achievement unlocked: {}", achievement.title());
        }
        self.save_data_with_message(&format!("Complete task {}", id))?;
        Ok(formatting::format_completion(&completion, &self.painter()))
    }

    pub fn handle_sub_done(&mut self, task_id: TaskId, sub_id: u32) -> Result<String> {
        self.data.complete_sub_task(task_id, sub_id)?;
        self.save_data_with_message(&format!("Complete sub-task {}.{}", task_id, sub_id))?;
        Ok(format!("Sub-task {}.{} marked as done", task_id, sub_id))
    }

    /// Star (`starred = true`) or unstar a task
    pub fn handle_star(&mut self, id: TaskId, starred: bool) -> Result<String> {
        let changed = self.data.set_starred(id, starred)?;
        let verb = if starred { "starred" } else { "unstarred" };
        if !changed {
            return Ok(format!("Task {} is already {}", id, verb));
        }
        let action = if starred { "Star" } else { "Unstar" };
        self.save_data_with_message(&format!("{} task {}", action, id))?;
        Ok(format!("Task {} {}", id, verb))
    }

    pub fn handle_log(&mut self, id: TaskId, message: String) -> Result<String> {
        self.data.log_progress(id, &message, local_now())?;
        self.save_data_with_message(&format!("Log progress on task {}", id))?;
        Ok(format!("Progress logged for task {}", id))
    }

    /// Permanently delete an active task together with its sub-tasks
    pub fn handle_delete(&mut self, id: TaskId) -> Result<String> {
        let task = self.data.delete_task(id)?;
        self.save_data_with_message(&format!("Delete task {}", id))?;
        Ok(format!("Task {} '{}' deleted", id, task.name))
    }
}
