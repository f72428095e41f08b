use crate::config::Config;
use crate::error::{KairuError, KairuResult};
use crate::todo::profile::{Achievement, Profile, StreakChange};
use crate::todo::task::{
    GoalId, GroupId, LogEntry, NewTask, Priority, SubTask, Task, TaskId, TaskPatch, TaskStatus,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info};

/// Current data file format version
pub const FORMAT_VERSION: u32 = 1;

/// A long-term objective tasks can be linked to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    pub description: Option<String>,
}

/// A named bucket every task belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
}

/// Breakdown of the points earned by one completion
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointAward {
    pub base: u64,
    pub priority: u64,
    pub star: u64,
    pub early: u64,
}

impl PointAward {
    /// Points for completing `task` at `now`
    pub fn compute(task: &Task, now: NaiveDateTime, config: &Config) -> Self {
        Self {
            base: config.base_points,
            priority: config.priority_bonus(task.priority),
            star: if task.starred { config.star_bonus } else { 0 },
            early: match task.due {
                Some(due) if now <= due => config.early_bonus,
                _ => 0,
            },
        }
    }

    pub fn total(&self) -> u64 {
        self.base + self.priority + self.star + self.early
    }
}

/// Everything that happened when a task was completed
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub task_id: TaskId,
    pub name: String,
    pub award: PointAward,
    pub streak_change: StreakChange,
    pub streak: u32,
    pub achievements: Vec<Achievement>,
    /// Id and due date of the next instance of a recurring task
    pub successor: Option<(TaskId, NaiveDateTime)>,
}

/// The whole in-memory model: goals, groups, active tasks, archive and profile
///
/// Active tasks and the archive are kept in `Vec`s in insertion order so the
/// data file diffs stay stable. `group_index` maps each group to the ids of
/// its active tasks; it is not serialized and is rebuilt on load.
#[derive(Debug, Clone)]
pub struct TodoData {
    pub format_version: u32,
    pub(crate) last_task_id: TaskId,
    pub(crate) last_group_id: GroupId,
    pub(crate) last_goal_id: GoalId,
    pub(crate) goals: Vec<Goal>,
    pub(crate) groups: Vec<Group>,
    pub(crate) tasks: Vec<Task>,
    pub(crate) archive: Vec<Task>,
    pub profile: Profile,
    pub(crate) group_index: HashMap<GroupId, Vec<TaskId>>,
}

impl Default for TodoData {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION,
            last_task_id: 0,
            last_group_id: 0,
            last_goal_id: 0,
            goals: Vec::new(),
            groups: Vec::new(),
            tasks: Vec::new(),
            archive: Vec::new(),
            profile: Profile::default(),
            group_index: HashMap::new(),
        }
    }
}

// Serialize/Deserialize implementations are in serde_impl.rs

impl TodoData {
    /// Create a new empty model with a default profile
    pub fn new() -> Self {
        Self::default()
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Active tasks in insertion order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Completed tasks in completion order
    pub fn archive(&self) -> &[Task] {
        &self.archive
    }

    pub fn last_task_id(&self) -> TaskId {
        self.last_task_id
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn goal(&self, id: GoalId) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    /// Find a group by name (case-insensitive)
    pub fn find_group_by_name(&self, name: &str) -> Option<&Group> {
        let name = name.trim();
        self.groups.iter().find(|g| g.name.eq_ignore_ascii_case(name))
    }

    /// Find a goal by name (case-insensitive)
    pub fn find_goal_by_name(&self, name: &str) -> Option<&Goal> {
        let name = name.trim();
        self.goals.iter().find(|g| g.name.eq_ignore_ascii_case(name))
    }

    /// Find an active task
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Find an archived task
    pub fn archived_task(&self, id: TaskId) -> Option<&Task> {
        self.archive.iter().find(|t| t.id == id)
    }

    /// Find a task in the active collection first, then in the archive
    pub fn any_task(&self, id: TaskId) -> Option<&Task> {
        self.task(id).or_else(|| self.archived_task(id))
    }

    /// Ids of the active tasks in a group
    pub fn group_task_ids(&self, group: GroupId) -> &[TaskId] {
        self.group_index
            .get(&group)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
    }

    fn task_mut(&mut self, id: TaskId) -> KairuResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| KairuError::not_found("Task", id))
    }

    pub(crate) fn resolve_group(&self, name: &str) -> KairuResult<GroupId> {
        self.find_group_by_name(name)
            .map(|g| g.id)
            .ok_or_else(|| KairuError::not_found("Group", name.trim()))
    }

    pub(crate) fn resolve_goal(&self, name: &str) -> KairuResult<GoalId> {
        self.find_goal_by_name(name)
            .map(|g| g.id)
            .ok_or_else(|| KairuError::not_found("Goal", name.trim()))
    }

    fn require_name(kind: &str, name: &str) -> KairuResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(KairuError::validation(format!("{} name cannot be empty", kind)));
        }
        Ok(name.to_string())
    }

    /// Reject a task name already used by another active task in the group
    fn check_unique_task_name(
        &self,
        group: GroupId,
        name: &str,
        except: Option<TaskId>,
    ) -> KairuResult<()> {
        let clash = self.tasks.iter().any(|t| {
            t.group == group && Some(t.id) != except && t.name.eq_ignore_ascii_case(name)
        });
        if clash {
            let group_name = self.group(group).map(|g| g.name.as_str()).unwrap_or("?");
            return Err(KairuError::validation(format!(
                "Task '{}' already exists in group '{}'",
                name, group_name
            )));
        }
        Ok(())
    }

    fn index_task(&mut self, group: GroupId, id: TaskId) {
        self.group_index.entry(group).or_default().push(id);
    }

    fn unindex_task(&mut self, group: GroupId, id: TaskId) {
        if let Some(ids) = self.group_index.get_mut(&group) {
            ids.retain(|&t| t != id);
        }
    }

    fn insert_task(&mut self, task: Task) {
        self.index_task(task.group, task.id);
        self.tasks.push(task);
    }

    fn remove_active(&mut self, id: TaskId) -> KairuResult<Task> {
        let pos = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| KairuError::not_found("Task", id))?;
        let task = self.tasks.remove(pos);
        self.unindex_task(task.group, task.id);
        Ok(task)
    }

    fn next_task_id(&mut self) -> TaskId {
        self.last_task_id += 1;
        self.last_task_id
    }

    /// Add a new group. Names are unique (case-insensitive).
    pub fn add_group(&mut self, name: &str) -> KairuResult<GroupId> {
        let name = Self::require_name("Group", name)?;
        if self.find_group_by_name(&name).is_some() {
            return Err(KairuError::validation(format!(
                "Group '{}' already exists",
                name
            )));
        }
        self.last_group_id += 1;
        let id = self.last_group_id;
        debug!("Adding group {} '{}'", id, name);
        self.groups.push(Group { id, name });
        self.group_index.entry(id).or_default();
        Ok(id)
    }

    /// Add a new goal. Names are unique (case-insensitive).
    pub fn add_goal(&mut self, name: &str, description: Option<String>) -> KairuResult<GoalId> {
        let name = Self::require_name("Goal", name)?;
        if self.find_goal_by_name(&name).is_some() {
            return Err(KairuError::validation(format!("Goal '{}' already exists", name)));
        }
        self.last_goal_id += 1;
        let id = self.last_goal_id;
        debug!("Adding goal {} '{}'", id, name);
        self.goals.push(Goal {
            id,
            name,
            description: description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
        });
        Ok(id)
    }

    /// Add a task to its group and return the new id
    pub fn add_task(&mut self, new_task: NewTask, now: NaiveDateTime) -> KairuResult<TaskId> {
        let name = Self::require_name("Task", &new_task.name)?;
        let group = self.resolve_group(&new_task.group)?;
        let goal = new_task
            .goal
            .as_deref()
            .map(|g| self.resolve_goal(g))
            .transpose()?;
        self.check_unique_task_name(group, &name, None)?;

        let id = self.next_task_id();
        debug!("Adding task {} '{}' to group {}", id, name, group);
        self.insert_task(Task {
            id,
            name,
            group,
            goal,
            priority: new_task.priority,
            due: new_task.due,
            details: new_task.details.filter(|d| !d.trim().is_empty()),
            tags: new_task.tags,
            starred: false,
            status: TaskStatus::active,
            recurrence: new_task.recurrence,
            created_at: now,
            completed_at: None,
            log: Vec::new(),
            sub_tasks: Vec::new(),
        });
        Ok(id)
    }

    /// Apply a partial update to an active task
    ///
    /// Every supplied field is validated before any field is written.
    pub fn edit_task(&mut self, id: TaskId, patch: TaskPatch) -> KairuResult<()> {
        let current = self
            .task(id)
            .ok_or_else(|| KairuError::not_found("Task", id))?;
        let current_group = current.group;

        let name = patch
            .name
            .as_deref()
            .map(|n| Self::require_name("Task", n))
            .transpose()?;
        let group = patch
            .group
            .as_deref()
            .map(|g| self.resolve_group(g))
            .transpose()?;
        let goal = match patch.goal {
            Some(Some(ref g)) => Some(Some(self.resolve_goal(g)?)),
            Some(None) => Some(None),
            None => None,
        };
        if name.is_some() || group.is_some() {
            let target_group = group.unwrap_or(current_group);
            let target_name = name.clone().unwrap_or_else(|| current.name.clone());
            self.check_unique_task_name(target_group, &target_name, Some(id))?;
        }

        if let Some(new_group) = group
            && new_group != current_group
        {
            self.unindex_task(current_group, id);
            self.index_task(new_group, id);
        }

        let task = self.task_mut(id)?;
        if let Some(name) = name {
            task.name = name;
        }
        if let Some(group) = group {
            task.group = group;
        }
        if let Some(goal) = goal {
            task.goal = goal;
        }
        if let Some(details) = patch.details {
            task.details = details.filter(|d| !d.trim().is_empty());
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(due) = patch.due {
            task.due = due;
        }
        if let Some(tags) = patch.tags {
            task.tags = tags;
        }
        if let Some(recurrence) = patch.recurrence {
            task.recurrence = recurrence;
        }
        debug!("Edited task {}", id);
        Ok(())
    }

    /// Complete an active task
    ///
    /// Awards points, updates the streak, checks achievements, moves the task
    /// to the archive and, for recurring tasks, creates the next instance.
    /// Archived ids are not looked up: completing one is `NotFound`.
    pub fn complete_task(
        &mut self,
        id: TaskId,
        now: NaiveDateTime,
        config: &Config,
    ) -> KairuResult<Completion> {
        let task = self
            .task(id)
            .ok_or_else(|| KairuError::not_found("Task", id))?;
        if task.is_completed() {
            return Err(KairuError::AlreadyCompleted {
                kind: "Task",
                id: id.to_string(),
            });
        }
        let award = PointAward::compute(task, now, config);
        // Build the next occurrence first: an unschedulable one fails the
        // whole completion before anything changes
        let successor = task.successor(self.last_task_id + 1, now)?;

        let mut task = self.remove_active(id)?;
        task.status = TaskStatus::completed;
        task.completed_at = Some(now);

        let profile = &mut self.profile;
        profile.points += award.total();
        profile.total_completed += 1;
        if task.priority == Priority::high {
            profile.high_priority_completed += 1;
        }
        let streak_change = profile.record_completion(now.date());
        let achievements = profile.evaluate_achievements(config);

        let successor = successor.map(|next| {
            let next_id = self.next_task_id();
            let due = next.due.unwrap_or(now);
            self.insert_task(Task { id: next_id, ..next });
            (next_id, due)
        });

        info!(
            "Completed task {} '{}' for {} points",
            task.id,
            task.name,
            award.total()
        );
        let completion = Completion {
            task_id: task.id,
            name: task.name.clone(),
            award,
            streak_change,
            streak: self.profile.streak,
            achievements,
            successor,
        };
        self.archive.push(task);
        Ok(completion)
    }

    /// Add a sub-task. Returns its id and whether "The Delegator" was unlocked.
    pub fn add_sub_task(&mut self, task_id: TaskId, description: &str) -> KairuResult<(u32, bool)> {
        let description = description.trim();
        if description.is_empty() {
            return Err(KairuError::validation("Sub-task description cannot be empty"));
        }
        let task = self.task_mut(task_id)?;
        let id = task.next_sub_task_id();
        task.sub_tasks.push(SubTask {
            id,
            description: description.to_string(),
            status: TaskStatus::active,
        });
        let unlocked = self.profile.unlock(Achievement::delegator);
        Ok((id, unlocked))
    }

    /// Complete a sub-task in place. No points, no archive move.
    pub fn complete_sub_task(&mut self, task_id: TaskId, sub_id: u32) -> KairuResult<()> {
        let task = self.task_mut(task_id)?;
        let sub = task
            .sub_tasks
            .iter_mut()
            .find(|s| s.id == sub_id)
            .ok_or_else(|| KairuError::not_found("Sub-task", format!("{}.{}", task_id, sub_id)))?;
        if sub.is_completed() {
            return Err(KairuError::AlreadyCompleted {
                kind: "Sub-task",
                id: format!("{}.{}", task_id, sub_id),
            });
        }
        sub.status = TaskStatus::completed;
        Ok(())
    }

    /// Star or unstar a task. Returns whether the flag changed.
    pub fn set_starred(&mut self, id: TaskId, starred: bool) -> KairuResult<bool> {
        let task = self.task_mut(id)?;
        let changed = task.starred != starred;
        task.starred = starred;
        Ok(changed)
    }

    /// Unstar every active task. Returns how many were starred.
    pub fn clear_stars(&mut self) -> usize {
        let mut cleared = 0;
        for task in self.tasks.iter_mut().filter(|t| t.starred) {
            task.starred = false;
            cleared += 1;
        }
        cleared
    }

    /// Append a progress note to a task's log
    pub fn log_progress(&mut self, id: TaskId, note: &str, now: NaiveDateTime) -> KairuResult<()> {
        let note = note.trim();
        if note.is_empty() {
            return Err(KairuError::validation("Progress note cannot be empty"));
        }
        let task = self.task_mut(id)?;
        task.log.push(LogEntry {
            timestamp: now,
            note: note.to_string(),
        });
        Ok(())
    }

    /// Permanently remove an active task and its sub-tasks
    pub fn delete_task(&mut self, id: TaskId) -> KairuResult<Task> {
        let task = self.remove_active(id)?;
        info!("Deleted task {} '{}'", task.id, task.name);
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn new_task(name: &str, group: &str) -> NewTask {
        NewTask {
            name: name.to_string(),
            group: group.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_group_index_tracks_active_tasks() {
        let mut data = TodoData::new();
        let work = data.add_group("Work").unwrap();
        let home = data.add_group("Home").unwrap();
        let a = data.add_task(new_task("A", "work"), at(2025, 1, 1, 9)).unwrap();
        let b = data.add_task(new_task("B", "Work"), at(2025, 1, 1, 9)).unwrap();

        assert_eq!(data.group_task_ids(work), &[a, b]);
        assert!(data.group_task_ids(home).is_empty());

        data.edit_task(
            b,
            TaskPatch {
                group: Some("home".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(data.group_task_ids(work), &[a]);
        assert_eq!(data.group_task_ids(home), &[b]);

        data.complete_task(a, at(2025, 1, 1, 10), &Config::default())
            .unwrap();
        assert!(data.group_task_ids(work).is_empty());

        data.delete_task(b).unwrap();
        assert!(data.group_task_ids(home).is_empty());
    }

    #[test]
    fn test_failed_add_does_not_consume_id() {
        let mut data = TodoData::new();
        assert!(data.add_task(new_task("A", "Nowhere"), at(2025, 1, 1, 9)).is_err());
        assert_eq!(data.last_task_id(), 0);
    }

    #[test]
    fn test_edit_is_all_or_nothing() {
        let mut data = TodoData::new();
        data.add_group("Work").unwrap();
        let id = data.add_task(new_task("A", "Work"), at(2025, 1, 1, 9)).unwrap();

        let result = data.edit_task(
            id,
            TaskPatch {
                name: Some("Renamed".to_string()),
                priority: Some(Priority::high),
                goal: Some(Some("Missing goal".to_string())),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(KairuError::NotFound { kind: "Goal", .. })));
        let task = data.task(id).unwrap();
        assert_eq!(task.name, "A");
        assert_eq!(task.priority, Priority::medium);
    }

    #[test]
    fn test_point_award() {
        let config = Config::default();
        let task = Task {
            priority: Priority::high,
            starred: true,
            due: Some(at(2025, 1, 10, 17)),
            ..Default::default()
        };
        let early = PointAward::compute(&task, at(2025, 1, 9, 12), &config);
        assert_eq!(early.total(), 10 + 10 + 5 + 15);
        let late = PointAward::compute(&task, at(2025, 1, 11, 12), &config);
        assert_eq!(late.total(), 10 + 10 + 5);
    }

    #[test]
    fn test_sub_task_ids_are_per_task() {
        let mut data = TodoData::new();
        data.add_group("Work").unwrap();
        let a = data.add_task(new_task("A", "Work"), at(2025, 1, 1, 9)).unwrap();
        let b = data.add_task(new_task("B", "Work"), at(2025, 1, 1, 9)).unwrap();

        assert_eq!(data.add_sub_task(a, "one").unwrap(), (1, true));
        assert_eq!(data.add_sub_task(a, "two").unwrap(), (2, false));
        assert_eq!(data.add_sub_task(b, "first of b").unwrap(), (1, false));
    }

    #[test]
    fn test_complete_sub_task_twice() {
        let mut data = TodoData::new();
        data.add_group("Work").unwrap();
        let a = data.add_task(new_task("A", "Work"), at(2025, 1, 1, 9)).unwrap();
        data.add_sub_task(a, "one").unwrap();

        data.complete_sub_task(a, 1).unwrap();
        assert!(matches!(
            data.complete_sub_task(a, 1),
            Err(KairuError::AlreadyCompleted { kind: "Sub-task", .. })
        ));
        assert!(matches!(
            data.complete_sub_task(a, 9),
            Err(KairuError::NotFound { kind: "Sub-task", .. })
        ));
        // Completing a sub-task does not touch the parent or the points
        assert!(!data.task(a).unwrap().is_completed());
        assert_eq!(data.profile.points, 0);
    }

    #[test]
    fn test_recurring_completion_consumes_one_id() {
        let mut data = TodoData::new();
        data.add_group("Home").unwrap();
        let id = data
            .add_task(
                NewTask {
                    recurrence: Some(crate::todo::Recurrence::daily),
                    due: Some(at(2025, 1, 10, 8)),
                    tags: BTreeSet::from(["#chore".to_string()]),
                    ..new_task("Dishes", "Home")
                },
                at(2025, 1, 1, 9),
            )
            .unwrap();

        let completion = data
            .complete_task(id, at(2025, 1, 10, 7), &Config::default())
            .unwrap();
        let (next_id, next_due) = completion.successor.unwrap();
        assert_eq!(next_id, id + 1);
        assert_eq!(next_due, at(2025, 1, 11, 8));
        assert_eq!(data.last_task_id(), id + 1);
        assert_eq!(data.tasks().len(), 1);
        assert_eq!(data.archive().len(), 1);
    }

    #[test]
    fn test_unschedulable_successor_leaves_model_unchanged() {
        let mut data = TodoData::new();
        data.add_group("Home").unwrap();
        let last_day = NaiveDate::MAX.and_hms_opt(23, 0, 0).unwrap();
        let id = data
            .add_task(
                NewTask {
                    recurrence: Some(crate::todo::Recurrence::daily),
                    due: Some(last_day),
                    ..new_task("Dishes", "Home")
                },
                at(2025, 1, 1, 9),
            )
            .unwrap();
        let before = data.clone();

        let result = data.complete_task(id, at(2025, 1, 10, 7), &Config::default());
        assert!(matches!(result, Err(KairuError::Validation { .. })));
        assert_eq!(data.tasks(), before.tasks());
        assert!(data.archive().is_empty());
        assert_eq!(data.profile, before.profile);
        assert_eq!(data.last_task_id(), before.last_task_id());
    }
}
