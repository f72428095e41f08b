//! Guided routines: plan-day, shutdown, unstuck and the health check
//!
//! The interactive routines read answers line by line from `input` and write
//! prompts to `out`, so they run the same against a terminal or a buffer.
//! End of input aborts a routine; anything already saved stays saved.

use crate::KairuApp;
use crate::error::KairuError;
use crate::formatting;
use crate::todo::{Achievement, TaskPatch, local_date_today, local_now};
use crate::validation;
use anyhow::Result;
use chrono::{Days, NaiveDateTime, NaiveTime};
use std::io::{BufRead, Write};
use tracing::debug;

/// Write `question`, then read one trimmed line. `None` on end of input.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: &str,
) -> Result<Option<String>> {
    write!(out, "{}", question)?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(out)?;
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn is_yes(answer: Option<&str>) -> bool {
    answer.is_some_and(|a| a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes"))
}

impl KairuApp {
    /// Burnout check for today's schedule
    pub fn handle_health_check(&self) -> Result<String> {
        let report = self.data.health_check(local_date_today());
        Ok(formatting::format_health(&report, &self.config, &self.painter()))
    }

    /// Pick up to N of today's candidates and star them
    pub fn handle_plan_day<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        let max_stars = self.config.plan_day_max_stars;
        let painter = self.painter();
        let candidates: Vec<String> = self
            .data
            .plan_candidates(local_date_today())
            .into_iter()
            .map(|task| {
                let group = self
                    .data
                    .group(task.group)
                    .map(|g| g.name.as_str())
                    .unwrap_or("N/A");
                format!("  {}  [{}]", formatting::format_task_line(task, &painter), group)
            })
            .collect();

        if candidates.is_empty() {
            writeln!(
                out,
                "You have no urgent or starred tasks to plan. Feel free to add some!"
            )?;
            return Ok(());
        }
        writeln!(out, "Let's plan your day! Top candidates:")?;
        for line in &candidates {
            writeln!(out, "{}", line)?;
        }

        let answer = prompt(input, out, "\nClear all other stars first? (y/n): ")?;
        if is_yes(answer.as_deref()) {
            let cleared = self.data.clear_stars();
            self.save_data_with_message("Plan day: clear stars")?;
            writeln!(out, "Cleared {} star(s).", cleared)?;
        }

        let Some(answer) = prompt(
            input,
            out,
            &format!(
                "Enter the IDs of up to {} tasks to star as today's priorities: ",
                max_stars
            ),
        )?
        else {
            return Ok(());
        };
        let ids = validation::parse_id_list(&answer)?;
        if ids.is_empty() {
            writeln!(out, "No priorities chosen.")?;
            return Ok(());
        }
        if ids.len() > max_stars {
            return Err(KairuError::validation(format!(
                "Pick at most {} priorities, got {}",
                max_stars,
                ids.len()
            ))
            .into());
        }
        // Check every id before starring any
        if let Some(missing) = ids.iter().find(|id| self.data.task(**id).is_none()) {
            return Err(KairuError::not_found("Task", missing).into());
        }
        for id in &ids {
            self.data.set_starred(*id, true)?;
        }
        let planner = self.data.profile.unlock(Achievement::planner);
        self.save_data_with_message("Plan day")?;

        let list: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        writeln!(out, "Starred today's priorities: {}", list.join(", "))?;
        if planner {
            writeln!(out, "Achievement unlocked: {}!", Achievement::planner.title())?;
        }
        Ok(())
    }

    /// End-of-day review of completed and pending tasks
    pub fn handle_shutdown<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        let today = local_date_today();
        writeln!(out, "Let's wrap up the day.")?;

        let accomplished = self.data.completed_on(today);
        if accomplished.is_empty() {
            writeln!(out, "No tasks were completed today.")?;
        } else {
            writeln!(out, "Accomplished today:")?;
            for task in accomplished {
                writeln!(out, "- {}", task.name)?;
            }
        }

        let pending: Vec<(u32, String)> = self
            .data
            .tasks()
            .iter()
            .map(|t| (t.id, t.name.clone()))
            .collect();
        if pending.is_empty() {
            writeln!(out, "\nAll tasks cleared. You're all done!")?;
            writeln!(out, "{}", self.handle_stats()?)?;
            return Ok(());
        }

        writeln!(out, "\nPending tasks:")?;
        for (id, name) in &pending {
            writeln!(out, "  ID {}: {}", id, name)?;
        }

        let answer = prompt(
            input,
            out,
            &format!(
                "\nMove all {} pending tasks to tomorrow at 9 AM? (y/n): ",
                pending.len()
            ),
        )?;
        if is_yes(answer.as_deref()) {
            let tomorrow_9am = tomorrow_at_nine(today);
            for (id, _) in &pending {
                self.data.edit_task(
                    *id,
                    TaskPatch {
                        due: Some(Some(tomorrow_9am)),
                        ..Default::default()
                    },
                )?;
            }
            self.save_data_with_message(&format!(
                "Shutdown: reschedule {} task(s)",
                pending.len()
            ))?;
            writeln!(out, "All pending tasks have been rescheduled.")?;
        } else if answer.is_none() {
            return Ok(());
        }

        writeln!(out, "\n--- Daily Report ---")?;
        writeln!(out, "{}", self.handle_stats()?)?;
        let win = prompt(input, out, "\nWhat was one win today? (Press Enter to finish): ")?;
        if let Some(win) = win.filter(|w| !w.is_empty()) {
            debug!("Win of the day: {}", win);
        }
        writeln!(out, "Shutdown routine complete. Well done today!")?;
        Ok(())
    }

    /// Offer an action for the most neglected task
    pub fn handle_unstuck<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        self.unstuck_at(local_now(), input, out)
    }

    pub(crate) fn unstuck_at<R: BufRead, W: Write>(
        &mut self,
        now: NaiveDateTime,
        input: &mut R,
        out: &mut W,
    ) -> Result<()> {
        writeln!(out, "Let's find a task that might be stuck...")?;
        let Some(task) = self.data.find_stale_task(now, self.config.stale_days) else {
            writeln!(out, "No stale tasks found. Your list is fresh!")?;
            return Ok(());
        };
        let (id, name) = (task.id, task.name.clone());
        let group = self
            .data
            .group(task.group)
            .map(|g| g.name.clone())
            .unwrap_or_default();
        write!(
            out,
            "\nTask '{}' in group '{}' was created on {}",
            name,
            group,
            task.created_at.date()
        )?;
        if let Some(due) = task.due {
            write!(out, " and was due {}", due.format("%Y-%m-%d %H:%M"))?;
        }
        writeln!(out, ".")?;

        let action = prompt(
            input,
            out,
            "What's the next action? ([B]reak down, [R]eschedule, [D]elete, [S]kip): ",
        )?
        .unwrap_or_default()
        .to_lowercase();

        match action.as_str() {
            "b" => {
                writeln!(
                    out,
                    "Breaking it down is a great way to start. What is the very first step?"
                )?;
                let Some(step) = prompt(input, out, "First sub-task: ")?.filter(|s| !s.is_empty())
                else {
                    writeln!(out, "No sub-task added.")?;
                    return Ok(());
                };
                let (sub_id, delegator) = self.data.add_sub_task(id, &step)?;
                self.save_data_with_message(&format!("Add sub-task {}.{}", id, sub_id))?;
                writeln!(out, "Sub-task {}.{} added. Add more with sub-add.", id, sub_id)?;
                if delegator {
                    writeln!(out, "Achievement unlocked: {}!", Achievement::delegator.title())?;
                }
            }
            "r" => {
                let answer = prompt(
                    input,
                    out,
                    "When do you want to work on this? (YYYY-MM-DD HH:MM): ",
                )?
                .unwrap_or_default();
                let due = validation::parse_due(&answer)?;
                self.data.edit_task(
                    id,
                    TaskPatch {
                        due: Some(Some(due)),
                        ..Default::default()
                    },
                )?;
                self.save_data_with_message(&format!("Reschedule task {}", id))?;
                writeln!(out, "Task {} rescheduled to {}.", id, due.format("%Y-%m-%d %H:%M"))?;
            }
            "d" => {
                let answer = prompt(
                    input,
                    out,
                    &format!("Are you sure you want to delete '{}'? (y/n): ", name),
                )?;
                if is_yes(answer.as_deref()) {
                    self.data.delete_task(id)?;
                    self.save_data_with_message(&format!("Delete task {}", id))?;
                    writeln!(out, "Task {} '{}' deleted.", id, name)?;
                } else {
                    writeln!(out, "Kept '{}'.", name)?;
                }
            }
            "s" => writeln!(out, "Okay, we'll leave it for now.")?,
            _ => writeln!(out, "Invalid option. No action taken.")?,
        }
        Ok(())
    }
}

fn tomorrow_at_nine(today: chrono::NaiveDate) -> NaiveDateTime {
    let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN);
    today
        .checked_add_days(Days::new(1))
        .unwrap_or(today)
        .and_time(nine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::todo::{NewTask, Priority};
    use chrono::{Duration, NaiveDate};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn get_test_app() -> (KairuApp, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut app = KairuApp::new(temp_dir.path().join("kairu.toml"), false, Config::default())
            .unwrap();
        app.handle_group_add("Work".to_string()).unwrap();
        (app, temp_dir)
    }

    fn add(app: &mut KairuApp, name: &str, priority: Priority, created: NaiveDateTime) -> u32 {
        app.data
            .add_task(
                NewTask {
                    name: name.to_string(),
                    group: "Work".to_string(),
                    priority,
                    ..Default::default()
                },
                created,
            )
            .unwrap()
    }

    fn run_plan_day(app: &mut KairuApp, answers: &str) -> (Result<()>, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut out = Vec::new();
        let result = app.handle_plan_day(&mut input, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_plan_day_stars_and_unlocks_planner() {
        let (mut app, _temp_dir) = get_test_app();
        let now = local_now();
        let a = add(&mut app, "Write report", Priority::high, now);
        let b = add(&mut app, "Review budget", Priority::high, now);
        add(&mut app, "Water plants", Priority::low, now);
        app.data.set_starred(b, true).unwrap();

        let (result, output) = run_plan_day(&mut app, &format!("y\n{}\n", a));
        result.unwrap();
        assert!(output.contains("Write report"));
        assert!(!output.contains("Water plants"));
        assert!(output.contains("Cleared 1 star(s)."));
        assert!(output.contains("Achievement unlocked: The Planner!"));
        assert!(app.data().task(a).unwrap().starred);
        assert!(!app.data().task(b).unwrap().starred);
        assert!(app.data().profile.has(Achievement::planner));
    }

    #[test]
    fn test_plan_day_rejects_too_many_ids() {
        let (mut app, _temp_dir) = get_test_app();
        let now = local_now();
        for name in ["A", "B", "C", "D"] {
            add(&mut app, name, Priority::high, now);
        }
        let (result, _) = run_plan_day(&mut app, "n\n1,2,3,4\n");
        assert!(result.is_err());
        assert!(app.data().tasks().iter().all(|t| !t.starred));
        assert!(!app.data().profile.has(Achievement::planner));
    }

    #[test]
    fn test_plan_day_without_candidates() {
        let (mut app, _temp_dir) = get_test_app();
        add(&mut app, "Water plants", Priority::low, local_now());
        let (result, output) = run_plan_day(&mut app, "");
        result.unwrap();
        assert!(output.contains("no urgent or starred tasks"));
    }

    #[test]
    fn test_shutdown_reschedules_pending() {
        let (mut app, _temp_dir) = get_test_app();
        let now = local_now();
        let a = add(&mut app, "Write report", Priority::medium, now);
        let b = add(&mut app, "Review budget", Priority::medium, now);
        app.handle_done(b).unwrap();

        let mut input = Cursor::new(b"y\nShipped the budget\n".to_vec());
        let mut out = Vec::new();
        app.handle_shutdown(&mut input, &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();

        assert!(output.contains("Accomplished today:\n- Review budget"));
        assert!(output.contains("ID 1: Write report"));
        assert!(output.contains("--- Daily Report ---"));
        let expected = tomorrow_at_nine(local_date_today());
        assert_eq!(app.data().task(a).unwrap().due, Some(expected));
    }

    #[test]
    fn test_unstuck_break_down() {
        let (mut app, _temp_dir) = get_test_app();
        let now = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let old = add(&mut app, "Old task", Priority::medium, now - Duration::days(30));
        add(&mut app, "Fresh task", Priority::medium, now - Duration::days(1));

        let mut input = Cursor::new(b"b\nOpen the file\n".to_vec());
        let mut out = Vec::new();
        app.unstuck_at(now, &mut input, &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();

        assert!(output.contains("Task 'Old task' in group 'Work'"));
        let task = app.data().task(old).unwrap();
        assert_eq!(task.sub_tasks.len(), 1);
        assert_eq!(task.sub_tasks[0].description, "Open the file");
    }

    #[test]
    fn test_unstuck_delete_and_nothing_stale() {
        let (mut app, _temp_dir) = get_test_app();
        let now = NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let old = add(&mut app, "Old task", Priority::medium, now - Duration::days(30));

        let mut input = Cursor::new(b"d\ny\n".to_vec());
        let mut out = Vec::new();
        app.unstuck_at(now, &mut input, &mut out).unwrap();
        assert!(app.data().task(old).is_none());

        let mut input = Cursor::new(Vec::new());
        let mut out = Vec::new();
        app.unstuck_at(now, &mut input, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Your list is fresh!"));
    }

    #[test]
    fn test_health_check_clear_day() {
        let (app, _temp_dir) = get_test_app();
        assert!(app.handle_health_check().unwrap().contains("clear"));
    }
}
