//! Read-only views: task list, single task, archive, search, focus

use crate::KairuApp;
use crate::error::KairuError;
use crate::formatting::{self, GroupBy};
use crate::todo::{SortKey, TaskId, ViewFilter};
use crate::validation;
use anyhow::Result;

/// Raw `view` options
#[derive(Debug, Clone, Default)]
pub struct ViewOptions {
    pub group: Option<String>,
    pub priority: Option<String>,
    pub tag: Option<String>,
    pub starred: bool,
    pub sort: Option<SortKey>,
    pub group_by: GroupBy,
}

impl KairuApp {
    /// List active tasks, sectioned by group or goal
    pub fn handle_view(&self, options: ViewOptions) -> Result<String> {
        let filter = ViewFilter {
            group: options
                .group
                .as_deref()
                .map(|g| self.data.resolve_group(g))
                .transpose()?,
            priority: options
                .priority
                .as_deref()
                .map(validation::parse_priority)
                .transpose()?,
            tag: options.tag.as_deref().map(validation::normalize_tag),
            starred_only: options.starred,
            sort: options.sort,
        };
        let tasks = self.data.view(&filter);
        Ok(formatting::format_task_list(
            &self.data,
            &tasks,
            options.group_by,
            &self.painter(),
        ))
    }

    /// Show one task, active or archived
    pub fn handle_view_task(&self, id: TaskId, show_log: bool) -> Result<String> {
        let task = self
            .data
            .any_task(id)
            .ok_or_else(|| KairuError::not_found("Task", id))?;
        Ok(formatting::format_task_detail(
            &self.data,
            task,
            show_log,
            &self.painter(),
        ))
    }

    pub fn handle_view_completed(&self, group: String) -> Result<String> {
        let group_id = self.data.resolve_group(&group)?;
        let name = self
            .data
            .group(group_id)
            .map(|g| g.name.as_str())
            .unwrap_or(group.as_str());
        let tasks = self.data.completed_in_group(group_id);
        Ok(formatting::format_completed(name, &tasks, &self.painter()))
    }

    pub fn handle_search(&self, keyword: String) -> Result<String> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(KairuError::validation("Search keyword cannot be empty").into());
        }
        Ok(formatting::format_search(
            keyword,
            self.data.search(keyword),
            &self.painter(),
        ))
    }

    /// Starred and urgent tasks first
    pub fn handle_focus(&self, group: Option<String>) -> Result<String> {
        let group = group
            .as_deref()
            .map(|g| self.data.resolve_group(g))
            .transpose()?;
        let tasks = self.data.focus(group);
        Ok(formatting::format_focus(&self.data, &tasks, &self.painter()))
    }

    pub fn handle_group_list(&self) -> Result<String> {
        Ok(formatting::format_groups(&self.data, &self.painter()))
    }

    pub fn handle_goal_list(&self) -> Result<String> {
        Ok(formatting::format_goals(&self.data, &self.painter()))
    }
}
