//! Formatting helper functions for Kairu
//!
//! Text rendering of tasks, search results and the gamification views.
//! Every view takes a [`Painter`] that colours it with the active theme's
//! palette, or leaves it plain when colour is off.

use crate::config::{Config, Palette, ThemeColor};
use crate::todo::{
    Completion, HealthReport, MatchField, SearchHit, StatsView, StreakChange, Task, ThemeStatus,
    TodoData,
};
use owo_colors::{AnsiColors, OwoColorize};
use std::collections::BTreeMap;
use std::fmt::Display;

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// How the task list is grouped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupBy {
    #[default]
    Group,
    Goal,
}

/// Colour role of a piece of output, resolved through the palette
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Accent,
    Heading,
    Success,
    Warning,
    Alert,
    Info,
}

/// Applies a theme palette to output text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Painter {
    palette: Palette,
    enabled: bool,
}

impl Painter {
    pub fn new(palette: Palette, enabled: bool) -> Self {
        Self { palette, enabled }
    }

    /// A painter that never emits escape codes
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Terminal colour used for `role`
    pub fn color(&self, role: Role) -> AnsiColors {
        let color = match role {
            Role::Accent => self.palette.accent,
            Role::Heading => self.palette.heading,
            Role::Success => self.palette.success,
            Role::Warning => self.palette.warning,
            Role::Alert => self.palette.alert,
            Role::Info => self.palette.info,
        };
        ansi(color)
    }

    pub fn paint(&self, role: Role, text: impl Display) -> String {
        if self.enabled {
            text.color(self.color(role)).to_string()
        } else {
            text.to_string()
        }
    }

    /// Like [`Painter::paint`], in bold
    pub fn strong(&self, role: Role, text: impl Display) -> String {
        if self.enabled {
            text.color(self.color(role)).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

fn ansi(color: ThemeColor) -> AnsiColors {
    match color {
        ThemeColor::red => AnsiColors::Red,
        ThemeColor::green => AnsiColors::Green,
        ThemeColor::yellow => AnsiColors::Yellow,
        ThemeColor::blue => AnsiColors::Blue,
        ThemeColor::magenta => AnsiColors::Magenta,
        ThemeColor::cyan => AnsiColors::Cyan,
        ThemeColor::white => AnsiColors::White,
        ThemeColor::bright_red => AnsiColors::BrightRed,
        ThemeColor::bright_green => AnsiColors::BrightGreen,
        ThemeColor::bright_yellow => AnsiColors::BrightYellow,
        ThemeColor::bright_blue => AnsiColors::BrightBlue,
        ThemeColor::bright_magenta => AnsiColors::BrightMagenta,
        ThemeColor::bright_cyan => AnsiColors::BrightCyan,
    }
}

fn group_name(data: &TodoData, task: &Task) -> String {
    data.group(task.group)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| "N/A".to_string())
}

fn goal_name(data: &TodoData, task: &Task) -> Option<String> {
    task.goal.and_then(|g| data.goal(g)).map(|g| g.name.clone())
}

/// One-line summary of a task
pub fn format_task_line(task: &Task, painter: &Painter) -> String {
    let mut line = format!("{} ", painter.paint(Role::Accent, format!("[{}]", task.id)));
    if task.starred {
        line.push_str(&format!("{} ", painter.paint(Role::Warning, "★")));
    }
    line.push_str(&task.name);
    line.push_str(&format!(" ({}", task.priority));
    if let Some(due) = task.due {
        line.push_str(&format!(
            ", due {}",
            painter.paint(Role::Success, due.format(DATE_TIME_FORMAT))
        ));
    }
    if let Some(recurrence) = task.recurrence {
        line.push_str(&format!(", {}", recurrence));
    }
    line.push(')');
    if !task.sub_tasks.is_empty() {
        let done = task.sub_tasks.iter().filter(|s| s.is_completed()).count();
        line.push_str(&format!(" [{}/{}]", done, task.sub_tasks.len()));
    }
    if !task.tags.is_empty() {
        let tags: Vec<&str> = task.tags.iter().map(|t| t.as_str()).collect();
        line.push_str(&format!(" {}", painter.paint(Role::Info, tags.join(" "))));
    }
    line
}

/// Full details of a single task
pub fn format_task_detail(
    data: &TodoData,
    task: &Task,
    show_log: bool,
    painter: &Painter,
) -> String {
    let mut result = format!("{}\n", format_task_line(task, painter));
    result.push_str(&format!(
        "  Group: {}\n",
        painter.paint(Role::Accent, group_name(data, task))
    ));
    if let Some(goal) = goal_name(data, task) {
        result.push_str(&format!("  Goal: {}\n", goal));
    }
    let status = if task.is_completed() {
        let status = match task.completed_at {
            Some(at) => format!("completed {}", at.format(DATE_TIME_FORMAT)),
            None => "completed".to_string(),
        };
        painter.paint(Role::Success, status)
    } else {
        "active".to_string()
    };
    result.push_str(&format!("  Status: {}\n", status));
    result.push_str(&format!(
        "  Created: {}\n",
        task.created_at.format(DATE_TIME_FORMAT)
    ));
    if let Some(ref details) = task.details {
        result.push_str(&format!("  Details: {}\n", details));
    }
    for sub in &task.sub_tasks {
        let mark = if sub.is_completed() {
            painter.paint(Role::Success, "x")
        } else {
            " ".to_string()
        };
        result.push_str(&format!(
            "  [{}] {}.{} {}\n",
            mark, task.id, sub.id, sub.description
        ));
    }

    if show_log {
        if task.log.is_empty() {
            result.push_str("  No progress log for this task.\n");
        } else {
            result.push_str(&format!("  {}\n", painter.strong(Role::Heading, "Progress log:")));
            for entry in &task.log {
                result.push_str(&format!(
                    "    {}  {}\n",
                    painter.paint(Role::Info, entry.timestamp.format(DATE_TIME_FORMAT)),
                    entry.note
                ));
            }
        }
    }
    result.trim_end().to_string()
}

/// Active tasks, sectioned by group or by goal
pub fn format_task_list(
    data: &TodoData,
    tasks: &[&Task],
    group_by: GroupBy,
    painter: &Painter,
) -> String {
    if tasks.is_empty() {
        return "No tasks found".to_string();
    }

    let mut sections: BTreeMap<String, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        let key = match group_by {
            GroupBy::Group => group_name(data, task),
            GroupBy::Goal => goal_name(data, task).unwrap_or_else(|| "No goal".to_string()),
        };
        sections.entry(key).or_default().push(task);
    }

    let mut result = format!(
        "{}\n",
        painter.strong(Role::Heading, format!("Found {} task(s):", tasks.len()))
    );
    for (section, tasks) in sections {
        result.push_str(&format!("\n{}\n", painter.strong(Role::Accent, section)));
        for task in tasks {
            result.push_str(&format!("  - {}\n", format_task_line(task, painter)));
        }
    }
    result.trim_end().to_string()
}

/// Archived tasks of one group
pub fn format_completed(group: &str, tasks: &[&Task], painter: &Painter) -> String {
    if tasks.is_empty() {
        return format!("No completed tasks found in group '{}'", group);
    }
    let mut result = format!(
        "{}\n",
        painter.strong(Role::Heading, format!("Completed tasks in group '{}':", group))
    );
    for task in tasks {
        let when = task
            .completed_at
            .map(|at| at.format(DATE_TIME_FORMAT).to_string())
            .unwrap_or_else(|| "unknown".to_string());
        result.push_str(&format!(
            "- {} {} (completed {})\n",
            painter.paint(Role::Accent, format!("[{}]", task.id)),
            task.name,
            painter.paint(Role::Success, when)
        ));
    }
    result.trim_end().to_string()
}

pub fn format_search<'a>(
    keyword: &str,
    hits: impl Iterator<Item = SearchHit<'a>>,
    painter: &Painter,
) -> String {
    let mut count = 0;
    let mut body = String::new();
    for hit in hits {
        count += 1;
        let state = if hit.archived { "completed" } else { "active" };
        let matched = match hit.field {
            MatchField::Name => "name".to_string(),
            MatchField::Details => "details".to_string(),
            MatchField::Tag(tag) => format!("tag {}", tag),
            MatchField::SubTask(id) => format!("sub-task {}.{}", hit.task.id, id),
            MatchField::Group => "group".to_string(),
            MatchField::Goal => "goal".to_string(),
        };
        body.push_str(&format!(
            "- {} {} ({}, group '{}', matched {})\n",
            painter.paint(Role::Accent, format!("[{}]", hit.task.id)),
            hit.task.name,
            state,
            hit.group.name,
            painter.paint(Role::Info, matched)
        ));
    }
    if count == 0 {
        return format!("No results for '{}'", keyword);
    }
    let heading = format!("Found {} result(s) for '{}':", count, keyword);
    format!("{}\n{}", painter.strong(Role::Heading, heading), body)
        .trim_end()
        .to_string()
}

pub fn format_focus(data: &TodoData, tasks: &[&Task], painter: &Painter) -> String {
    if tasks.is_empty() {
        return "Nothing to focus on. Add a task or enjoy the quiet.".to_string();
    }
    let mut result = format!("{}\n", painter.strong(Role::Heading, "Focus:"));
    for (rank, task) in tasks.iter().enumerate() {
        result.push_str(&format!(
            "{:>2}. {}  [{}]\n",
            rank + 1,
            format_task_line(task, painter),
            painter.paint(Role::Accent, group_name(data, task))
        ));
    }
    result.trim_end().to_string()
}

pub fn format_completion(completion: &Completion, painter: &Painter) -> String {
    let award = &completion.award;
    let mut result = format!(
        "Completed '{}'! You earned {}",
        completion.name,
        painter.strong(Role::Accent, format!("{} points", award.total()))
    );
    let mut parts = vec![format!("base {}", award.base)];
    if award.priority > 0 {
        parts.push(format!("priority +{}", award.priority));
    }
    if award.star > 0 {
        parts.push(format!("star +{}", award.star));
    }
    if award.early > 0 {
        parts.push(format!("early +{}", award.early));
    }
    result.push_str(&format!(" ({}). Task archived.", parts.join(", ")));

    let streak = match completion.streak_change {
        StreakChange::SavedByFreeze => format!(
            "Your {}-day streak was saved by a freeze!",
            completion.streak
        ),
        StreakChange::Reset => "New streak started: 1 day.".to_string(),
        _ => format!("Streak: {} day(s).", completion.streak),
    };
    result.push_str(&format!("\n{}", painter.paint(Role::Alert, streak)));
    if let Some((id, due)) = completion.successor {
        result.push_str(&format!(
            "\nNext occurrence created: {} due {}",
            painter.paint(Role::Accent, format!("[{}]", id)),
            painter.paint(Role::Success, due.format(DATE_TIME_FORMAT))
        ));
    }
    for achievement in &completion.achievements {
        let line = format!("Achievement unlocked: {}!", achievement.title());
        result.push_str(&format!("\n{}", painter.strong(Role::Warning, line)));
    }
    result
}

pub fn format_stats(
    stats: &StatsView,
    active_theme: &str,
    config: &Config,
    painter: &Painter,
) -> String {
    let mut result = format!("{}\n", painter.strong(Role::Heading, "Your Kairu stats"));
    result.push_str(&format!(
        "  Points: {}\n",
        painter.strong(Role::Accent, stats.points)
    ));
    result.push_str(&format!(
        "  Level: {}",
        painter.paint(Role::Warning, &stats.level)
    ));
    if let Some(next) = &stats.next_level {
        result.push_str(&format!(
            " ({} more for {})",
            next.min_points - stats.points,
            next.name
        ));
    }
    result.push('\n');
    result.push_str(&format!(
        "  Streak: {} (best {})\n",
        painter.paint(Role::Alert, format!("{} day(s)", stats.streak)),
        stats.longest_streak
    ));
    result.push_str(&format!(
        "  Streak freezes: {}\n",
        painter.paint(Role::Info, stats.streak_freezes)
    ));
    result.push_str(&format!(
        "  Completed today: {}, all time: {}\n",
        stats.completed_today, stats.completed_total
    ));
    result.push_str(&format!(
        "  Theme: {}\n",
        painter.paint(Role::Accent, active_theme)
    ));
    result.push_str(&format!("{}\n", painter.strong(Role::Heading, "Achievements:")));
    for (achievement, unlocked) in &stats.achievements {
        let mark = if *unlocked {
            painter.paint(Role::Success, "x")
        } else {
            " ".to_string()
        };
        result.push_str(&format!(
            "  [{}] {} - {}\n",
            mark,
            achievement.title(),
            achievement.description(config)
        ));
    }
    result.trim_end().to_string()
}

pub fn format_themes(themes: &[ThemeStatus], painter: &Painter) -> String {
    let mut result = format!("{}\n", painter.strong(Role::Heading, "Themes:"));
    for theme in themes {
        let status = if theme.active {
            painter.paint(Role::Success, "active")
        } else if theme.unlocked {
            painter.paint(Role::Info, "unlocked")
        } else {
            painter.paint(Role::Alert, format!("locked, {} points", theme.cost))
        };
        result.push_str(&format!("  {} ({})\n", theme.name, status));
    }
    result.trim_end().to_string()
}

pub fn format_health(report: &HealthReport, config: &Config, painter: &Painter) -> String {
    if report.total_today == 0 {
        return painter.paint(
            Role::Success,
            "Your schedule for today is clear. A great time to plan or rest!",
        );
    }
    let mut result = format!(
        "You have {} task(s) scheduled for today.\n- {} are high priority.\n- {} are breaks (#rest).\n\n",
        painter.strong(Role::Accent, report.total_today),
        report.high_priority,
        report.rest
    );
    if report.burnout_risk(config) {
        result.push_str(&painter.strong(
            Role::Warning,
            "Warning: many high-priority tasks and no breaks. Consider adding downtime with --tags rest.",
        ));
    } else if report.rest > 0 {
        result.push_str(&painter.paint(Role::Success, "Great job scheduling breaks!"));
    } else {
        result.push_str("Your schedule looks manageable. Have a productive day!");
    }
    result
}

pub fn format_groups(data: &TodoData, painter: &Painter) -> String {
    if data.groups().is_empty() {
        return "No groups yet. Create one with group-add.".to_string();
    }
    let mut result = format!("{}\n", painter.strong(Role::Heading, "Groups:"));
    for group in data.groups() {
        let active = data.group_task_ids(group.id).len();
        let done = data.completed_in_group(group.id).len();
        result.push_str(&format!(
            "- {} ({} active, {} completed)\n",
            painter.paint(Role::Accent, &group.name),
            active,
            done
        ));
    }
    result.trim_end().to_string()
}

pub fn format_goals(data: &TodoData, painter: &Painter) -> String {
    if data.goals().is_empty() {
        return "No goals yet. Create one with goal-add.".to_string();
    }
    let mut result = format!("{}\n", painter.strong(Role::Heading, "Goals:"));
    for goal in data.goals() {
        let linked = data
            .tasks()
            .iter()
            .filter(|t| t.goal == Some(goal.id))
            .count();
        result.push_str(&format!(
            "- {} ({} active task(s))",
            painter.paint(Role::Accent, &goal.name),
            linked
        ));
        if let Some(ref description) = goal.description {
            result.push_str(&format!(": {}", description));
        }
        result.push('\n');
    }
    result.trim_end().to_string()
}
