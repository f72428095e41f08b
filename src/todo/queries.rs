//! Read-only views over TodoData
//!
//! Search, focus ordering, staleness, health check and stats. None of these
//! mutate the model.

use super::profile::Achievement;
use super::task::{GroupId, Priority, Task, TaskId};
use super::todo_data::{Group, TodoData};
use crate::config::{Config, LevelSpec};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::cmp::Reverse;

/// Tag that marks a scheduled break
pub const REST_TAG: &str = "#rest";

/// Which field of a task matched a search keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchField {
    Name,
    Details,
    Tag(String),
    SubTask(u32),
    Group,
    Goal,
}

/// One search result. Each task appears at most once.
#[derive(Debug, Clone)]
pub struct SearchHit<'a> {
    pub task: &'a Task,
    pub group: &'a Group,
    pub archived: bool,
    /// The first field that matched
    pub field: MatchField,
}

/// Sort order for the task list view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Priority,
    Due,
}

/// Filters for the task list view
#[derive(Debug, Clone, Default)]
pub struct ViewFilter {
    pub group: Option<GroupId>,
    pub priority: Option<Priority>,
    pub tag: Option<String>,
    pub starred_only: bool,
    pub sort: Option<SortKey>,
}

/// Today's schedule summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HealthReport {
    pub total_today: usize,
    pub high_priority: usize,
    pub rest: usize,
}

impl HealthReport {
    /// Many high-priority tasks and no break scheduled
    pub fn burnout_risk(&self, config: &Config) -> bool {
        self.high_priority >= config.health_high_priority_warning && self.rest == 0
    }
}

/// Derived gamification view
#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub points: u64,
    pub level: String,
    pub next_level: Option<LevelSpec>,
    pub streak: u32,
    pub longest_streak: u32,
    pub streak_freezes: u32,
    pub completed_today: usize,
    pub completed_total: usize,
    pub achievements: Vec<(Achievement, bool)>,
}

/// A theme with its store status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeStatus {
    pub name: String,
    pub cost: u64,
    pub unlocked: bool,
    pub active: bool,
}

/// Focus ordering: starred first, then higher priority, then earlier due
/// date (undated last), then id.
fn focus_key(task: &Task) -> (Reverse<bool>, Reverse<Priority>, bool, Option<NaiveDateTime>, TaskId) {
    (
        Reverse(task.starred),
        Reverse(task.priority),
        task.due.is_none(),
        task.due,
        task.id,
    )
}

impl TodoData {
    /// Case-insensitive keyword search over active and archived tasks
    ///
    /// Looks at task name, details, tags, sub-task descriptions and the
    /// group and goal names. Results come lazily, ordered by group then task
    /// id. Call again to restart.
    pub fn search<'a>(&'a self, keyword: &str) -> impl Iterator<Item = SearchHit<'a>> + 'a {
        let needle = keyword.trim().to_lowercase();
        let mut groups: Vec<&'a Group> = self.groups.iter().collect();
        groups.sort_by_key(|g| g.id);

        groups.into_iter().flat_map(move |group| {
            let mut members: Vec<(&'a Task, bool)> = self
                .tasks
                .iter()
                .filter(|t| t.group == group.id)
                .map(|t| (t, false))
                .chain(
                    self.archive
                        .iter()
                        .filter(|t| t.group == group.id)
                        .map(|t| (t, true)),
                )
                .collect();
            members.sort_by_key(|(t, _)| t.id);

            let needle = needle.clone();
            members.into_iter().filter_map(move |(task, archived)| {
                self.match_field(task, group, &needle).map(|field| SearchHit {
                    task,
                    group,
                    archived,
                    field,
                })
            })
        })
    }

    fn match_field(&self, task: &Task, group: &Group, needle: &str) -> Option<MatchField> {
        let hit = |s: &str| s.to_lowercase().contains(needle);

        if hit(&task.name) {
            return Some(MatchField::Name);
        }
        if task.details.as_deref().is_some_and(hit) {
            return Some(MatchField::Details);
        }
        if let Some(tag) = task.tags.iter().find(|t| hit(t.as_str())) {
            return Some(MatchField::Tag(tag.clone()));
        }
        if let Some(sub) = task.sub_tasks.iter().find(|s| hit(&s.description)) {
            return Some(MatchField::SubTask(sub.id));
        }
        if hit(&group.name) {
            return Some(MatchField::Group);
        }
        task.goal
            .and_then(|g| self.goal(g))
            .filter(|g| hit(&g.name))
            .map(|_| MatchField::Goal)
    }

    /// Active tasks in focus order, optionally limited to one group
    pub fn focus(&self, group: Option<GroupId>) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| !t.is_completed())
            .filter(|t| group.is_none_or(|g| t.group == g))
            .collect();
        tasks.sort_by_key(|t| focus_key(t));
        tasks
    }

    /// Plan-day candidates: due today, starred or high priority, in focus order
    pub fn plan_candidates(&self, today: NaiveDate) -> Vec<&Task> {
        self.focus(None)
            .into_iter()
            .filter(|t| t.is_due_on(today) || t.starred || t.priority == Priority::high)
            .collect()
    }

    /// Active tasks for the list view
    pub fn view(&self, filter: &ViewFilter) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| filter.group.is_none_or(|g| t.group == g))
            .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
            .filter(|t| filter.tag.as_deref().is_none_or(|tag| t.has_tag(tag)))
            .filter(|t| !filter.starred_only || t.starred)
            .collect();

        match filter.sort {
            Some(SortKey::Priority) => tasks.sort_by_key(|t| (Reverse(t.priority), t.id)),
            Some(SortKey::Due) => tasks.sort_by_key(|t| (t.due.is_none(), t.due, t.id)),
            None => {}
        }
        tasks
    }

    /// Archived tasks of a group, most recently completed first
    pub fn completed_in_group(&self, group: GroupId) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self.archive.iter().filter(|t| t.group == group).collect();
        tasks.sort_by_key(|t| Reverse(t.completed_at));
        tasks
    }

    /// Archived tasks completed on a given day
    pub fn completed_on(&self, day: NaiveDate) -> Vec<&Task> {
        self.archive
            .iter()
            .filter(|t| t.completed_at.is_some_and(|c| c.date() == day))
            .collect()
    }

    /// A task is stale when its reference date (due, else creation) is more
    /// than `stale_days` in the past and it has no log entry since then.
    /// Recurring and completed tasks are never stale, and nothing is stale
    /// for a window that is not positive or reaches past the calendar.
    pub fn is_stale(task: &Task, now: NaiveDateTime, stale_days: i64) -> bool {
        if task.is_recurring() || task.is_completed() || stale_days <= 0 {
            return false;
        }
        let Some(cutoff) = Duration::try_days(stale_days).and_then(|d| now.checked_sub_signed(d))
        else {
            return false;
        };
        let reference = task.due.unwrap_or(task.created_at);
        reference < cutoff && !task.log.iter().any(|entry| entry.timestamp >= cutoff)
    }

    /// All stale active tasks, oldest reference date first
    pub fn stale_tasks(&self, now: NaiveDateTime, stale_days: i64) -> Vec<&Task> {
        let mut tasks: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| Self::is_stale(t, now, stale_days))
            .collect();
        tasks.sort_by_key(|t| (t.due.unwrap_or(t.created_at), t.id));
        tasks
    }

    /// The single most neglected task, if any
    pub fn find_stale_task(&self, now: NaiveDateTime, stale_days: i64) -> Option<&Task> {
        self.stale_tasks(now, stale_days).into_iter().next()
    }

    /// Summarise the active tasks due on `today`
    pub fn health_check(&self, today: NaiveDate) -> HealthReport {
        self.tasks
            .iter()
            .filter(|t| t.is_due_on(today))
            .fold(HealthReport::default(), |mut report, task| {
                report.total_today += 1;
                if task.priority == Priority::high {
                    report.high_priority += 1;
                }
                if task.has_tag(REST_TAG) {
                    report.rest += 1;
                }
                report
            })
    }

    pub fn stats(&self, today: NaiveDate, config: &Config) -> StatsView {
        let profile = &self.profile;
        StatsView {
            points: profile.points,
            level: config.level_for(profile.points).to_string(),
            next_level: config.next_level(profile.points).cloned(),
            streak: profile.streak,
            longest_streak: profile.longest_streak,
            streak_freezes: profile.streak_freezes,
            completed_today: self.completed_on(today).len(),
            completed_total: self.archive.len(),
            achievements: Achievement::ALL
                .iter()
                .map(|a| (*a, profile.has(*a)))
                .collect(),
        }
    }

    pub fn themes(&self, config: &Config) -> Vec<ThemeStatus> {
        config
            .themes
            .iter()
            .map(|t| ThemeStatus {
                name: t.name.clone(),
                cost: t.cost,
                unlocked: self.profile.unlocked_themes.contains(&t.name),
                active: self.profile.active_theme == t.name,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::todo::task::{LogEntry, NewTask};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn add(data: &mut TodoData, name: &str, group: &str, priority: Priority) -> TaskId {
        data.add_task(
            NewTask {
                name: name.to_string(),
                group: group.to_string(),
                priority,
                ..Default::default()
            },
            at(1, 9),
        )
        .unwrap()
    }

    #[test]
    fn test_focus_order() {
        let mut data = TodoData::new();
        data.add_group("Work").unwrap();
        let low = add(&mut data, "low", "Work", Priority::low);
        let high_undated = add(&mut data, "high undated", "Work", Priority::high);
        let high_dated = add(&mut data, "high dated", "Work", Priority::high);
        let starred_low = add(&mut data, "starred low", "Work", Priority::low);
        data.edit_task(
            high_dated,
            crate::todo::TaskPatch {
                due: Some(Some(at(20, 9))),
                ..Default::default()
            },
        )
        .unwrap();
        data.set_starred(starred_low, true).unwrap();

        let order: Vec<TaskId> = data.focus(None).iter().map(|t| t.id).collect();
        assert_eq!(order, vec![starred_low, high_dated, high_undated, low]);
    }

    #[test]
    fn test_focus_group_filter() {
        let mut data = TodoData::new();
        let work = data.add_group("Work").unwrap();
        data.add_group("Home").unwrap();
        let w = add(&mut data, "w", "Work", Priority::low);
        add(&mut data, "h", "Home", Priority::high);

        let ids: Vec<TaskId> = data.focus(Some(work)).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![w]);
    }

    #[test]
    fn test_search_is_restartable_and_ordered() {
        let mut data = TodoData::new();
        data.add_group("Work").unwrap();
        data.add_group("Home").unwrap();
        let home_task = add(&mut data, "Report taxes", "Home", Priority::low);
        let work_task = add(&mut data, "Write report", "Work", Priority::low);

        let first: Vec<TaskId> = data.search("REPORT").map(|h| h.task.id).collect();
        // Work was created first, so its tasks come first
        assert_eq!(first, vec![work_task, home_task]);
        let second: Vec<TaskId> = data.search("report").map(|h| h.task.id).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_search_matches_group_name() {
        let mut data = TodoData::new();
        data.add_group("Garden").unwrap();
        let id = add(&mut data, "Mow", "Garden", Priority::low);
        let hits: Vec<_> = data.search("garden").collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].task.id, id);
        assert_eq!(hits[0].field, MatchField::Group);
    }

    #[test]
    fn test_stale_classification() {
        let now = at(30, 12);
        let mut task = Task {
            created_at: at(1, 9),
            ..Default::default()
        };
        assert!(TodoData::is_stale(&task, now, 14));

        task.log.push(LogEntry {
            timestamp: at(25, 9),
            note: "poked at it".to_string(),
        });
        assert!(!TodoData::is_stale(&task, now, 14));

        let fresh_due = Task {
            created_at: at(1, 9),
            due: Some(at(28, 9)),
            ..Default::default()
        };
        assert!(!TodoData::is_stale(&fresh_due, now, 14));

        let recurring = Task {
            created_at: at(1, 9),
            recurrence: Some(crate::todo::Recurrence::daily),
            ..Default::default()
        };
        assert!(!TodoData::is_stale(&recurring, now, 14));
    }

    #[test]
    fn test_stale_window_out_of_range() {
        let now = at(30, 12);
        let old = Task {
            created_at: at(1, 9),
            ..Default::default()
        };
        assert!(!TodoData::is_stale(&old, now, 100_000_000));
        assert!(!TodoData::is_stale(&old, now, i64::MAX));
        assert!(!TodoData::is_stale(&old, now, 0));
        assert!(!TodoData::is_stale(&old, now, -5));
    }

    #[test]
    fn test_health_check_counts() {
        let mut data = TodoData::new();
        data.add_group("Work").unwrap();
        for i in 0..4 {
            data.add_task(
                NewTask {
                    name: format!("big {}", i),
                    group: "Work".to_string(),
                    priority: Priority::high,
                    due: Some(at(10, 9 + i)),
                    ..Default::default()
                },
                at(1, 9),
            )
            .unwrap();
        }
        let report = data.health_check(at(10, 0).date());
        assert_eq!(report.total_today, 4);
        assert_eq!(report.high_priority, 4);
        assert!(report.burnout_risk(&Config::default()));
        assert_eq!(data.health_check(at(11, 0).date()).total_today, 0);
    }
}
