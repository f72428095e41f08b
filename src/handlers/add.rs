//! Creation handlers: groups, goals, tasks and sub-tasks

use crate::KairuApp;
use crate::todo::{Achievement, TaskId, local_now};
use crate::validation::AddTaskInput;
use anyhow::Result;

impl KairuApp {
    pub fn handle_group_add(&mut self, name: String) -> Result<String> {
        let id = self.data.add_group(&name)?;
        let name = self
            .data
            .group(id)
            .map(|g| g.name.clone())
            .unwrap_or(name);
        self.save_data_with_message(&format!("Add group {}", name))?;
        Ok(format!("Group '{}' created", name))
    }

    pub fn handle_goal_add(&mut self, name: String, description: Option<String>) -> Result<String> {
        let id = self.data.add_goal(&name, description)?;
        let name = self
            .data
            .goal(id)
            .map(|g| g.name.clone())
            .unwrap_or(name);
        self.save_data_with_message(&format!("Add goal {}", name))?;
        Ok(format!("Goal '{}' created", name))
    }

    /// Add a task to an existing group
    pub fn handle_add(&mut self, input: AddTaskInput) -> Result<String> {
        let new_task = input.validate()?;
        let id = self.data.add_task(new_task, local_now())?;
        let (name, group) = match self.data.task(id) {
            Some(task) => (
                task.name.clone(),
                self.data
                    .group(task.group)
                    .map(|g| g.name.clone())
                    .unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        self.save_data_with_message(&format!("Add task {}", id))?;
        Ok(format!(
            "Task '{}' added to group '{}' with ID: {}",
            name, group, id
        ))
    }

    pub fn handle_sub_add(&mut self, task_id: TaskId, description: String) -> Result<String> {
        let (sub_id, delegator) = self.data.add_sub_task(task_id, &description)?;
        self.save_data_with_message(&format!("Add sub-task {}.{}", task_id, sub_id))?;

        let mut result = format!(
            "Sub-task {}.{} added: {}",
            task_id,
            sub_id,
            description.trim()
        );
        if delegator {
            result.push_str(&format!(
                "\nAchievement unlocked: {}!",
                Achievement::delegator.title()
            ));
        }
        Ok(result)
    }
}
