//! Validation helpers for raw command-line input
//!
//! Turns strings into typed values (priority, recurrence, due date-time,
//! tags, task ids) and builds `NewTask` / `TaskPatch` values. Everything here
//! fails with `KairuError::Validation` and never touches the model.

use crate::error::{KairuError, KairuResult};
use crate::todo::{NewTask, Priority, Recurrence, TaskId, TaskPatch};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::BTreeSet;

/// Date-time formats accepted for due dates
const DUE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Word that clears an optional field in `edit`
pub const CLEAR_WORD: &str = "none";

/// Parse a priority (low, medium, high)
pub fn parse_priority(s: &str) -> KairuResult<Priority> {
    s.parse::<Priority>().map_err(KairuError::validation)
}

/// Parse a recurrence rule. `none` means no recurrence.
pub fn parse_recurrence(s: &str) -> KairuResult<Option<Recurrence>> {
    if s.trim().eq_ignore_ascii_case(CLEAR_WORD) {
        return Ok(None);
    }
    s.parse::<Recurrence>()
        .map(Some)
        .map_err(KairuError::validation)
}

/// Parse a due date-time
///
/// Accepts `YYYY-MM-DD HH:MM` (also with `T` and optional seconds) or a bare
/// `YYYY-MM-DD`, which means the end of that day (23:59).
pub fn parse_due(s: &str) -> KairuResult<NaiveDateTime> {
    let s = s.trim();
    for format in DUE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN);
        return Ok(date.and_time(end_of_day));
    }
    Err(KairuError::validation(format!(
        "Invalid due date '{}'. Use 'YYYY-MM-DD HH:MM' or 'YYYY-MM-DD' (e.g., '2025-03-15 09:00')",
        s
    )))
}

/// Parse comma-separated tags into `#tag` form
///
/// `"work, #urgent,,"` becomes `{"#urgent", "#work"}`.
pub fn parse_tags(s: &str) -> BTreeSet<String> {
    s.split(',')
        .map(|tag| tag.trim().trim_start_matches('#').trim())
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{}", tag.to_lowercase()))
        .collect()
}

/// Normalise a single tag filter the same way `parse_tags` does
pub fn normalize_tag(s: &str) -> String {
    format!("#{}", s.trim().trim_start_matches('#').to_lowercase())
}

/// Parse a comma- or space-separated list of task ids
pub fn parse_id_list(s: &str) -> KairuResult<Vec<TaskId>> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.trim_start_matches('#').parse::<TaskId>().map_err(|_| {
                KairuError::validation(format!(
                    "Invalid task id '{}'. Enter numbers separated by commas.",
                    part
                ))
            })
        })
        .collect()
}

fn is_clear(s: &str) -> bool {
    s.trim().eq_ignore_ascii_case(CLEAR_WORD)
}

/// Raw `add` arguments
#[derive(Debug, Clone, Default)]
pub struct AddTaskInput {
    pub name: String,
    pub group: String,
    pub details: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub recurrence: Option<String>,
    pub tags: Option<String>,
    pub goal: Option<String>,
}

impl AddTaskInput {
    /// Validate every field and build a `NewTask`
    pub fn validate(self) -> KairuResult<NewTask> {
        if self.name.trim().is_empty() {
            return Err(KairuError::validation("Task name cannot be empty"));
        }
        Ok(NewTask {
            name: self.name.trim().to_string(),
            group: self.group,
            goal: self.goal,
            details: self.details,
            priority: self
                .priority
                .as_deref()
                .map(parse_priority)
                .transpose()?
                .unwrap_or_default(),
            due: self.due.as_deref().map(parse_due).transpose()?,
            recurrence: self
                .recurrence
                .as_deref()
                .map(parse_recurrence)
                .transpose()?
                .flatten(),
            tags: self.tags.as_deref().map(parse_tags).unwrap_or_default(),
        })
    }
}

/// Raw `edit` arguments. `none` clears details, due, goal and recurrence.
#[derive(Debug, Clone, Default)]
pub struct EditTaskInput {
    pub name: Option<String>,
    pub details: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub tags: Option<String>,
    pub goal: Option<String>,
    pub group: Option<String>,
    pub recurrence: Option<String>,
}

impl EditTaskInput {
    /// Validate every supplied field and build a `TaskPatch`
    pub fn validate(self) -> KairuResult<TaskPatch> {
        let patch = TaskPatch {
            name: self.name,
            details: self
                .details
                .map(|d| if is_clear(&d) { None } else { Some(d) }),
            priority: self.priority.as_deref().map(parse_priority).transpose()?,
            due: self
                .due
                .as_deref()
                .map(|d| if is_clear(d) { Ok(None) } else { parse_due(d).map(Some) })
                .transpose()?,
            tags: self.tags.as_deref().map(parse_tags),
            goal: self
                .goal
                .map(|g| if is_clear(&g) { None } else { Some(g) }),
            group: self.group,
            recurrence: self
                .recurrence
                .as_deref()
                .map(parse_recurrence)
                .transpose()?,
        };
        if patch.is_empty() {
            return Err(KairuError::validation(
                "Nothing to change. Pass at least one of --name, --details, --priority, --due, --tags, --goal, --group, --recurring",
            ));
        }
        Ok(patch)
    }
}
