//! Gamification handlers: stats, themes and the points store

use crate::KairuApp;
use crate::formatting;
use crate::todo::local_date_today;
use anyhow::Result;

impl KairuApp {
    pub fn handle_stats(&self) -> Result<String> {
        let stats = self.data.stats(local_date_today(), &self.config);
        Ok(formatting::format_stats(
            &stats,
            &self.data.profile.active_theme,
            &self.config,
            &self.painter(),
        ))
    }

    pub fn handle_themes(&self) -> Result<String> {
        let themes = self.data.themes(&self.config);
        Ok(format!(
            "{}\nPoints available: {}",
            formatting::format_themes(&themes, &self.painter()),
            self.data.profile.points
        ))
    }

    /// Spend points on one streak freeze
    pub fn handle_buy_freeze(&mut self) -> Result<String> {
        let held = self.data.profile.buy_freeze(&self.config)?;
        self.save_data_with_message("Buy streak freeze")?;
        Ok(format!(
            "Bought a streak freeze for {} points. You now hold {} freeze(s) and {} points.",
            self.config.streak_freeze_cost, held, self.data.profile.points
        ))
    }

    pub fn handle_unlock_theme(&mut self, name: String) -> Result<String> {
        let theme = self.data.profile.unlock_theme(&name, &self.config)?;
        self.save_data_with_message(&format!("Unlock theme {}", theme))?;
        Ok(format!(
            "Theme '{}' unlocked! Activate it with set-theme {}.",
            theme, theme
        ))
    }

    pub fn handle_set_theme(&mut self, name: String) -> Result<String> {
        let theme = self.data.profile.set_theme(&name, &self.config)?;
        self.save_data_with_message(&format!("Set theme {}", theme))?;
        Ok(format!("Theme '{}' is now active", theme))
    }
}

#[cfg(test)]
mod tests {
    use crate::error::KairuError;
    use crate::{Config, KairuApp};
    use tempfile::TempDir;

    fn get_test_app() -> (KairuApp, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let app = KairuApp::new(temp_dir.path().join("kairu.toml"), false, Config::default())
            .unwrap();
        (app, temp_dir)
    }

    #[test]
    fn test_unlock_theme_insufficient_points() {
        let (mut app, _temp_dir) = get_test_app();
        app.data.profile.points = 120;

        let err = app.handle_unlock_theme("forest".to_string()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KairuError>(),
            Some(KairuError::InsufficientPoints {
                needed: 500,
                available: 120
            })
        ));
        assert_eq!(app.data().profile.points, 120);
        assert!(!app.data().profile.unlocked_themes.contains("forest"));
    }

    #[test]
    fn test_unlock_and_set_theme() {
        let (mut app, _temp_dir) = get_test_app();
        app.data.profile.points = 600;

        assert!(app.handle_set_theme("ocean".to_string()).is_err());
        app.handle_unlock_theme("Ocean".to_string()).unwrap();
        assert_eq!(app.data().profile.points, 100);
        app.handle_set_theme("ocean".to_string()).unwrap();
        assert_eq!(app.data().profile.active_theme, "ocean");

        let themes = app.handle_themes().unwrap();
        assert!(themes.contains("ocean (active)"));
        assert!(themes.contains("forest (locked, 500 points)"));

        let err = app.handle_unlock_theme("neon".to_string()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KairuError>(),
            Some(KairuError::NotFound { kind: "Theme", .. })
        ));
    }

    #[test]
    fn test_buy_freeze() {
        let (mut app, _temp_dir) = get_test_app();
        assert!(app.handle_buy_freeze().is_err());

        app.data.profile.points = 25;
        let result = app.handle_buy_freeze().unwrap();
        assert!(result.contains("1 freeze(s)"));
        assert_eq!(app.data().profile.points, 15);
        assert_eq!(app.data().profile.streak_freezes, 1);
    }

    #[test]
    fn test_stats_show_level() {
        let (mut app, _temp_dir) = get_test_app();
        app.data.profile.points = 260;
        let stats = app.handle_stats().unwrap();
        assert!(stats.contains("Level: Task Master (240 more for Productivity Pro)"));
        assert!(stats.contains("[ ] The Planner"));
    }
}
