use crate::error::{KairuError, KairuResult};
use chrono::{Duration, Local, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub type TaskId = u32;
pub type GroupId = u32;
pub type GoalId = u32;

/// Get the current date-time in the local timezone
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Get the current date in the local timezone
pub fn local_date_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Task priority
///
/// Variants are ordered, so `Priority::high > Priority::low`.
/// Uses lowercase naming to match the data file and the command line.
#[allow(non_camel_case_types)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    low,
    #[default]
    medium,
    high,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::low),
            "medium" => Ok(Priority::medium),
            "high" => Ok(Priority::high),
            _ => Err(format!(
                "Invalid priority '{}'. Valid options are: low, medium, high",
                s
            )),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::low => "low",
            Priority::medium => "medium",
            Priority::high => "high",
        };
        f.write_str(s)
    }
}

/// Recurrence rule for tasks that come back after completion
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Recurrence {
    /// Every day
    daily,
    /// Every seven days
    weekly,
    /// Same day next calendar month (clamped to the month's last day)
    monthly,
}

impl Recurrence {
    /// Advance a due date-time by one recurrence interval
    ///
    /// `None` when the result falls outside the supported calendar range.
    pub fn advance(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Recurrence::daily => from.checked_add_signed(Duration::days(1)),
            Recurrence::weekly => from.checked_add_signed(Duration::weeks(1)),
            Recurrence::monthly => from.checked_add_months(Months::new(1)),
        }
    }
}

impl FromStr for Recurrence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Recurrence::daily),
            "weekly" => Ok(Recurrence::weekly),
            "monthly" => Ok(Recurrence::monthly),
            _ => Err(format!(
                "Invalid recurrence '{}'. Valid options are: none, daily, weekly, monthly",
                s
            )),
        }
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Recurrence::daily => "daily",
            Recurrence::weekly => "weekly",
            Recurrence::monthly => "monthly",
        };
        f.write_str(s)
    }
}

/// Completion state shared by tasks and sub-tasks. One-way: active -> completed.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    active,
    completed,
}

/// A timestamped progress note
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: NaiveDateTime,
    pub note: String,
}

/// A checklist item owned by a task. Ids are unique within the parent only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    pub id: u32,
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
}

impl SubTask {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::completed
    }
}

/// A single task
///
/// The group and goal are stored as identifiers; the owning `TodoData`
/// keeps the group index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub group: GroupId,
    pub goal: Option<GoalId>,
    pub priority: Priority,
    /// Optional due date-time (local)
    pub due: Option<NaiveDateTime>,
    /// Optional free-text details
    pub details: Option<String>,
    /// Tags in `#tag` form
    pub tags: BTreeSet<String>,
    pub starred: bool,
    pub status: TaskStatus,
    pub recurrence: Option<Recurrence>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    /// Progress log, append-only, chronological
    pub log: Vec<LogEntry>,
    pub sub_tasks: Vec<SubTask>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: 0,
            name: String::new(),
            group: 0,
            goal: None,
            priority: Priority::default(),
            due: None,
            details: None,
            tags: BTreeSet::new(),
            starred: false,
            status: TaskStatus::active,
            recurrence: None,
            created_at: local_now(),
            completed_at: None,
            log: Vec::new(),
            sub_tasks: Vec::new(),
        }
    }
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::completed
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Next sub-task id within this task
    pub fn next_sub_task_id(&self) -> u32 {
        self.sub_tasks.iter().map(|s| s.id).max().unwrap_or(0) + 1
    }

    /// Whether this task was due on the given day
    pub fn is_due_on(&self, day: NaiveDate) -> bool {
        self.due.is_some_and(|d| d.date() == day)
    }

    /// Build the next instance of a recurring task
    ///
    /// The successor keeps the group, goal, tags, priority, details, star
    /// and recurrence; its sub-tasks are reset and its log starts empty.
    /// Without a due date the interval is counted from `completed_at`.
    /// Returns `Ok(None)` for a task that does not recur.
    pub fn successor(&self, id: TaskId, completed_at: NaiveDateTime) -> KairuResult<Option<Task>> {
        let Some(recurrence) = self.recurrence else {
            return Ok(None);
        };
        let base = self.due.unwrap_or(completed_at);
        let due = recurrence.advance(base).ok_or_else(|| {
            KairuError::validation(format!(
                "Cannot schedule the next {} occurrence of task {}: {} is too far in the future",
                recurrence, self.id, base
            ))
        })?;
        let sub_tasks = self
            .sub_tasks
            .iter()
            .map(|s| SubTask {
                status: TaskStatus::active,
                ..s.clone()
            })
            .collect();

        Ok(Some(Task {
            id,
            name: self.name.clone(),
            group: self.group,
            goal: self.goal,
            priority: self.priority,
            due: Some(due),
            details: self.details.clone(),
            tags: self.tags.clone(),
            starred: self.starred,
            status: TaskStatus::active,
            recurrence: Some(recurrence),
            created_at: completed_at,
            completed_at: None,
            log: Vec::new(),
            sub_tasks,
        }))
    }
}

/// Fields for a new task, already parsed
///
/// Group and goal are given by name; `TodoData::add_task` resolves them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub name: String,
    pub group: String,
    pub goal: Option<String>,
    pub details: Option<String>,
    pub priority: Priority,
    pub due: Option<NaiveDateTime>,
    pub recurrence: Option<Recurrence>,
    pub tags: BTreeSet<String>,
}

/// A partial update to a task: `None` leaves a field untouched
///
/// Clearable fields use a nested `Option`: `Some(None)` clears.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub details: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due: Option<Option<NaiveDateTime>>,
    pub tags: Option<BTreeSet<String>>,
    /// Goal name to link, or `Some(None)` to unlink
    pub goal: Option<Option<String>>,
    /// Group name to move the task into
    pub group: Option<String>,
    pub recurrence: Option<Option<Recurrence>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}
