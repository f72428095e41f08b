//! Gamification profile: points, streaks, achievements and themes

use crate::config::Config;
use crate::error::{KairuError, KairuResult};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{info, warn};

pub const DEFAULT_THEME: &str = "default";

/// Achievements that can be unlocked
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Achievement {
    /// Starred the day's priorities with plan-day
    planner,
    /// Kept a completion streak going
    on_a_roll,
    /// Completed many high-priority tasks
    high_achiever,
    /// Broke a task down into sub-tasks
    delegator,
}

impl Achievement {
    pub const ALL: [Achievement; 4] = [
        Achievement::planner,
        Achievement::on_a_roll,
        Achievement::high_achiever,
        Achievement::delegator,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Achievement::planner => "The Planner",
            Achievement::on_a_roll => "On a Roll",
            Achievement::high_achiever => "High Achiever",
            Achievement::delegator => "The Delegator",
        }
    }

    pub fn description(&self, config: &Config) -> String {
        match self {
            Achievement::planner => "Plan your day with plan-day".to_string(),
            Achievement::on_a_roll => {
                format!("Reach a {}-day completion streak", config.on_a_roll_streak)
            }
            Achievement::high_achiever => format!(
                "Complete {} high-priority tasks",
                config.high_achiever_count
            ),
            Achievement::delegator => "Add your first sub-task".to_string(),
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// What a completion did to the streak
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    /// First completion ever
    Started,
    /// Another completion on a day already counted
    SameDay,
    /// Previous completion was yesterday
    Extended,
    /// One day was missed and a freeze covered it
    SavedByFreeze,
    /// The gap was too long; streak restarts at 1
    Reset,
}

/// Process-wide gamification state, persisted with the data file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub points: u64,
    pub streak: u32,
    pub longest_streak: u32,
    pub last_completed: Option<NaiveDate>,
    pub streak_freezes: u32,
    pub high_priority_completed: u32,
    pub total_completed: u32,
    pub active_theme: String,
    pub unlocked_themes: BTreeSet<String>,
    pub achievements: BTreeSet<Achievement>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            points: 0,
            streak: 0,
            longest_streak: 0,
            last_completed: None,
            streak_freezes: 0,
            high_priority_completed: 0,
            total_completed: 0,
            active_theme: DEFAULT_THEME.to_string(),
            unlocked_themes: BTreeSet::from([DEFAULT_THEME.to_string()]),
            achievements: BTreeSet::new(),
        }
    }
}

impl Profile {
    pub fn has(&self, achievement: Achievement) -> bool {
        self.achievements.contains(&achievement)
    }

    /// Unlock an achievement. Returns true only the first time.
    pub fn unlock(&mut self, achievement: Achievement) -> bool {
        let unlocked = self.achievements.insert(achievement);
        if unlocked {
            info!("Achievement unlocked: {}", achievement.title());
        }
        unlocked
    }

    /// Update the streak for a completion made on `today`
    pub fn record_completion(&mut self, today: NaiveDate) -> StreakChange {
        let change = match self.last_completed {
            None => {
                self.streak = 1;
                StreakChange::Started
            }
            Some(last) => match (today - last).num_days() {
                gap if gap <= 0 => {
                    self.streak = self.streak.max(1);
                    StreakChange::SameDay
                }
                1 => {
                    self.streak += 1;
                    StreakChange::Extended
                }
                2 if self.streak_freezes > 0 => {
                    self.streak_freezes -= 1;
                    StreakChange::SavedByFreeze
                }
                _ => {
                    self.streak = 1;
                    StreakChange::Reset
                }
            },
        };

        if self.last_completed.is_none_or(|last| last < today) {
            self.last_completed = Some(today);
        }
        self.longest_streak = self.longest_streak.max(self.streak);
        info!("Streak {:?}: now {} day(s)", change, self.streak);
        change
    }

    /// Unlock achievements whose thresholds are now met
    pub fn evaluate_achievements(&mut self, config: &Config) -> Vec<Achievement> {
        let mut unlocked = Vec::new();
        if self.streak >= config.on_a_roll_streak && self.unlock(Achievement::on_a_roll) {
            unlocked.push(Achievement::on_a_roll);
        }
        if self.high_priority_completed >= config.high_achiever_count
            && self.unlock(Achievement::high_achiever)
        {
            unlocked.push(Achievement::high_achiever);
        }
        unlocked
    }

    /// Deduct points, failing without change if the balance is too low
    pub fn spend(&mut self, cost: u64) -> KairuResult<()> {
        if cost > self.points {
            return Err(KairuError::InsufficientPoints {
                needed: cost,
                available: self.points,
            });
        }
        self.points -= cost;
        Ok(())
    }

    /// Buy one streak freeze. Returns the number of freezes now held.
    pub fn buy_freeze(&mut self, config: &Config) -> KairuResult<u32> {
        self.spend(config.streak_freeze_cost)?;
        self.streak_freezes += 1;
        info!(
            "Bought streak freeze for {} points, {} held",
            config.streak_freeze_cost, self.streak_freezes
        );
        Ok(self.streak_freezes)
    }

    /// Buy a theme from the catalog. Returns the canonical theme name.
    pub fn unlock_theme(&mut self, name: &str, config: &Config) -> KairuResult<String> {
        let theme = config
            .theme(name)
            .ok_or_else(|| KairuError::not_found("Theme", name))?;
        if self.unlocked_themes.contains(&theme.name) {
            return Err(KairuError::validation(format!(
                "Theme '{}' is already unlocked",
                theme.name
            )));
        }
        self.spend(theme.cost)?;
        self.unlocked_themes.insert(theme.name.clone());
        info!("Unlocked theme '{}' for {} points", theme.name, theme.cost);
        Ok(theme.name.clone())
    }

    /// Activate an unlocked theme. Returns the canonical theme name.
    pub fn set_theme(&mut self, name: &str, config: &Config) -> KairuResult<String> {
        let theme = config
            .theme(name)
            .ok_or_else(|| KairuError::not_found("Theme", name))?;
        if !self.unlocked_themes.contains(&theme.name) {
            return Err(KairuError::validation(format!(
                "Theme '{}' is not unlocked yet. Use unlock-theme first.",
                theme.name
            )));
        }
        self.active_theme = theme.name.clone();
        Ok(theme.name.clone())
    }

    /// Restore the theme invariant after loading: the default theme is always
    /// unlocked and the active theme is always an unlocked one.
    pub fn repair(&mut self) {
        self.unlocked_themes.insert(DEFAULT_THEME.to_string());
        if !self.unlocked_themes.contains(&self.active_theme) {
            warn!(
                "Active theme '{}' is not unlocked, falling back to '{}'",
                self.active_theme, DEFAULT_THEME
            );
            self.active_theme = DEFAULT_THEME.to_string();
        }
    }
}
