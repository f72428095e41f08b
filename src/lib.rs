//! Kairu Library
//!
//! A local, single-user to-do manager organised as Goals → Groups → Tasks →
//! Sub-tasks, with planning routines, a pomodoro timer and a small
//! gamification layer (points, levels, streaks, achievements, themes).
//!
//! # Architecture
//!
//! The library follows a 3-layer architecture:
//! - **Command Layer**: `KairuApp` and the `handlers` module - validate input,
//!   mutate the model, save, and render text
//! - **Domain Layer**: `todo` module - data model, mutations and derived queries
//! - **Persistence Layer**: `storage` module - TOML file storage with optional Git sync
//!
//! # Example
//!
//! ```no_run
//! use kairu::{Config, KairuApp};
//! use anyhow::Result;
//!
//! fn main() -> Result<()> {
//!     let mut app = KairuApp::new("kairu.toml", false, Config::default())?;
//!     app.handle_group_add("Work".to_string())?;
//!     println!("{}", app.handle_focus(None)?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod formatting;
pub mod git_ops;
pub mod handlers;
pub mod storage;
pub mod todo;
pub mod validation;

use anyhow::Result;
use formatting::Painter;
use std::path::Path;
use tracing::warn;

pub use config::Config;
pub use error::{KairuError, KairuResult};
pub use storage::Storage;
pub use todo::{Goal, Group, Priority, Profile, Recurrence, Task, TodoData};

/// Command context: the loaded model, its storage and the scoring table
///
/// Built once per process by the command dispatcher and passed to every
/// handler. Dropping it pushes the data file when git sync is enabled.
pub struct KairuApp {
    pub(crate) data: TodoData,
    pub(crate) storage: Storage,
    pub(crate) config: Config,
    color: bool,
}

impl KairuApp {
    /// Load the data file at `storage_path` (or start empty)
    pub fn new(storage_path: impl AsRef<Path>, sync_git: bool, config: Config) -> Result<Self> {
        let storage = Storage::new(storage_path, sync_git);
        let data = storage.load()?;
        Ok(Self {
            data,
            storage,
            config,
            color: false,
        })
    }

    pub fn data(&self) -> &TodoData {
        &self.data
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// Colour rendered output with the active theme; off by default
    pub fn set_color(&mut self, enabled: bool) {
        self.color = enabled;
    }

    /// Painter for the active theme's palette
    pub fn painter(&self) -> Painter {
        Painter::new(
            self.config.palette(&self.data.profile.active_theme),
            self.color,
        )
    }

    /// Save the model with a commit message describing the change
    pub(crate) fn save_data_with_message(&self, message: &str) -> Result<()> {
        self.storage.save_with_message(&self.data, message)
    }
}

impl Drop for KairuApp {
    fn drop(&mut self) {
        if let Err(e) = self.storage.shutdown() {
            warn!("Shutdown git sync failed: {:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use owo_colors::{AnsiColors, OwoColorize};
    use tempfile::TempDir;

    #[test]
    fn test_custom_file_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");

        let mut app = KairuApp::new(&path, false, Config::default()).unwrap();
        assert_eq!(app.storage().file_path(), path.as_path());
        app.handle_group_add("Work".to_string()).unwrap();
        assert!(path.exists());

        let reloaded = KairuApp::new(&path, false, Config::default()).unwrap();
        assert!(reloaded.data().find_group_by_name("work").is_some());
    }

    #[test]
    fn test_painter_follows_active_theme() {
        let temp_dir = TempDir::new().unwrap();
        let mut app =
            KairuApp::new(temp_dir.path().join("kairu.toml"), false, Config::default()).unwrap();
        assert!(!app.painter().is_enabled());
        assert!(!app.handle_stats().unwrap().contains('\x1b'));

        app.set_color(true);
        assert_eq!(app.painter().palette(), &config::Palette::default());
        let points = "0".color(AnsiColors::Cyan).bold().to_string();
        assert!(app.handle_stats().unwrap().contains(&points));

        app.data.profile.points = 500;
        app.handle_unlock_theme("forest".to_string()).unwrap();
        app.handle_set_theme("forest".to_string()).unwrap();
        assert_eq!(app.painter().palette(), &config::Palette::forest());
        let stats = app.handle_stats().unwrap();
        assert!(stats.contains(&"0".color(AnsiColors::Green).bold().to_string()));
        assert!(stats.contains(&"forest".color(AnsiColors::Green).to_string()));
    }

    #[test]
    fn test_corrupt_store_is_a_domain_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kairu.toml");
        std::fs::write(&path, "[[tasks]]\nid = \"x\"").unwrap();

        let err = KairuApp::new(&path, false, Config::default()).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<KairuError>(),
            Some(KairuError::CorruptStore(_))
        ));
    }
}
