//! Scoring and catalog configuration
//!
//! Point awards, store prices, theme palettes, level thresholds and
//! achievement thresholds live here instead of being hard-coded in the data
//! model. Every field has a default, so a config file only needs to list
//! what it overrides.

use crate::todo::{DEFAULT_THEME, Priority};
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A named level reached once the point total is at least `min_points`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSpec {
    pub name: String,
    pub min_points: u64,
}

/// Upper bound for `stale_days`, about a century
pub const MAX_STALE_DAYS: i64 = 36_500;

/// A terminal colour a palette can use
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeColor {
    red,
    green,
    yellow,
    blue,
    magenta,
    cyan,
    white,
    bright_red,
    bright_green,
    bright_yellow,
    bright_blue,
    bright_magenta,
    bright_cyan,
}

/// Colours for each role a view can paint
///
/// `accent` marks ids, group headings and point totals, `heading` list
/// titles, `success` due dates and completions, `warning` levels and
/// burnout advice, `alert` streaks and errors, `info` tags and freezes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub accent: ThemeColor,
    pub heading: ThemeColor,
    pub success: ThemeColor,
    pub warning: ThemeColor,
    pub alert: ThemeColor,
    pub info: ThemeColor,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            accent: ThemeColor::cyan,
            heading: ThemeColor::magenta,
            success: ThemeColor::green,
            warning: ThemeColor::yellow,
            alert: ThemeColor::red,
            info: ThemeColor::blue,
        }
    }
}

impl Palette {
    pub fn forest() -> Self {
        Self {
            accent: ThemeColor::green,
            heading: ThemeColor::bright_green,
            success: ThemeColor::green,
            warning: ThemeColor::yellow,
            alert: ThemeColor::bright_red,
            info: ThemeColor::bright_blue,
        }
    }

    pub fn ocean() -> Self {
        Self {
            accent: ThemeColor::blue,
            heading: ThemeColor::bright_blue,
            success: ThemeColor::cyan,
            warning: ThemeColor::bright_yellow,
            alert: ThemeColor::bright_red,
            info: ThemeColor::blue,
        }
    }
}

/// A theme in the store catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSpec {
    pub name: String,
    pub cost: u64,
    #[serde(default)]
    pub palette: Palette,
}

/// Extra points per priority on completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityBonus {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl Default for PriorityBonus {
    fn default() -> Self {
        Self {
            low: 0,
            medium: 5,
            high: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Points for every completed task
    pub base_points: u64,
    pub priority_bonus: PriorityBonus,
    /// Extra points when the task was starred
    pub star_bonus: u64,
    /// Extra points when completed at or before the due date-time
    pub early_bonus: u64,
    pub streak_freeze_cost: u64,
    pub themes: Vec<ThemeSpec>,
    /// Level table, ascending by `min_points`
    pub levels: Vec<LevelSpec>,
    /// Streak length that unlocks "On a Roll"
    pub on_a_roll_streak: u32,
    /// High-priority completions that unlock "High Achiever"
    pub high_achiever_count: u32,
    /// Days without progress before a task counts as stale
    pub stale_days: i64,
    /// High-priority tasks due today that trigger the burnout warning
    pub health_high_priority_warning: usize,
    /// Maximum number of tasks starred during plan-day
    pub plan_day_max_stars: usize,
}

impl Default for Config {
    fn default() -> Self {
        let level = |name: &str, min_points| LevelSpec {
            name: name.to_string(),
            min_points,
        };
        let theme = |name: &str, cost, palette| ThemeSpec {
            name: name.to_string(),
            cost,
            palette,
        };
        Self {
            base_points: 10,
            priority_bonus: PriorityBonus::default(),
            star_bonus: 5,
            early_bonus: 15,
            streak_freeze_cost: 10,
            themes: vec![
                theme(DEFAULT_THEME, 0, Palette::default()),
                theme("forest", 500, Palette::forest()),
                theme("ocean", 500, Palette::ocean()),
            ],
            levels: vec![
                level("Novice", 0),
                level("Apprentice", 100),
                level("Task Master", 250),
                level("Productivity Pro", 500),
                level("Focus Guru", 1000),
            ],
            on_a_roll_streak: 3,
            high_achiever_count: 10,
            stale_days: 14,
            health_high_priority_warning: 4,
            plan_day_max_stars: 3,
        }
    }
}

impl Config {
    /// Load a config file, falling back to defaults when it does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        config.levels.sort_by_key(|l| l.min_points);
        config
            .validate()
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Reject values the model cannot work with
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=MAX_STALE_DAYS).contains(&self.stale_days),
            "stale_days must be between 1 and {}, got {}",
            MAX_STALE_DAYS,
            self.stale_days
        );
        ensure!(
            self.plan_day_max_stars > 0,
            "plan_day_max_stars must be at least 1"
        );
        ensure!(!self.levels.is_empty(), "levels must list at least one level");
        ensure!(
            self.theme(DEFAULT_THEME).is_some_and(|t| t.cost == 0),
            "themes must include a free '{}' theme",
            DEFAULT_THEME
        );
        Ok(())
    }

    /// Default config location: `<config_dir>/kairu/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("kairu");
            p.push("config.toml");
            p
        })
    }

    pub fn priority_bonus(&self, priority: Priority) -> u64 {
        match priority {
            Priority::low => self.priority_bonus.low,
            Priority::medium => self.priority_bonus.medium,
            Priority::high => self.priority_bonus.high,
        }
    }

    /// Level name for a point total: the highest threshold not above `points`
    pub fn level_for(&self, points: u64) -> &str {
        self.levels
            .iter()
            .rev()
            .find(|l| l.min_points <= points)
            .or_else(|| self.levels.first())
            .map(|l| l.name.as_str())
            .unwrap_or("Novice")
    }

    /// The next level above `points`, if any
    pub fn next_level(&self, points: u64) -> Option<&LevelSpec> {
        self.levels.iter().find(|l| l.min_points > points)
    }

    /// Look up a theme by name (case-insensitive)
    pub fn theme(&self, name: &str) -> Option<&ThemeSpec> {
        self.themes
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Palette of the named theme, or the default palette if it is unknown
    pub fn palette(&self, theme: &str) -> Palette {
        self.theme(theme)
            .map(|t| t.palette)
            .unwrap_or_default()
    }
}
