use crate::error::KairuError;
use crate::git_ops::GitOps;
use crate::todo::TodoData;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File-backed persistence for the whole model
///
/// The model is read fully on start-up and written back explicitly after
/// each mutating command. Writes go to a sibling temp file that is renamed
/// over the target, so a failed save leaves the previous file intact.
pub struct Storage {
    file_path: PathBuf,
    git_ops: Option<GitOps>,
}

impl Storage {
    /// Create storage for `file_path`, optionally synchronised through git
    pub fn new(file_path: impl AsRef<Path>, sync_git: bool) -> Self {
        let file_path = file_path.as_ref().to_path_buf();
        let git_ops = if sync_git {
            Some(GitOps::new(&file_path))
        } else {
            None
        };
        Self { file_path, git_ops }
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Default data file: `<data_dir>/kairu/kairu.toml`, else `./kairu.toml`
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|mut p| {
                p.push("kairu");
                p.push("kairu.toml");
                p
            })
            .unwrap_or_else(|| PathBuf::from("kairu.toml"))
    }

    /// Load the model. A missing file yields an empty model.
    pub fn load(&self) -> Result<TodoData, KairuError> {
        if let Some(git) = &self.git_ops
            && let Err(e) = git.pull()
        {
            warn!("Git pull failed, continuing with local data: {:#}", e);
        }

        if !self.file_path.exists() {
            info!(
                "No data file at {}, starting fresh",
                self.file_path.display()
            );
            return Ok(TodoData::new());
        }

        let content = fs::read_to_string(&self.file_path)?;
        let data: TodoData =
            toml::from_str(&content).map_err(|e| KairuError::CorruptStore(e.to_string()))?;
        debug!(
            "Loaded {} active and {} archived task(s) from {}",
            data.tasks().len(),
            data.archive().len(),
            self.file_path.display()
        );
        Ok(data)
    }

    /// Write the model to disk
    pub fn save(&self, data: &TodoData) -> Result<(), KairuError> {
        let content = toml::to_string_pretty(data)
            .map_err(|e| KairuError::CorruptStore(format!("cannot serialize data: {}", e)))?;

        if let Some(parent) = self.file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = self.file_path.as_os_str().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);
        fs::write(&tmp_path, content)?;
        if let Err(e) = fs::rename(&tmp_path, &self.file_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        debug!("Saved data to {}", self.file_path.display());
        Ok(())
    }

    /// Save, then commit the file with `message` when git sync is enabled
    ///
    /// Git failures are logged and never fail the save.
    pub fn save_with_message(&self, data: &TodoData, message: &str) -> Result<()> {
        self.save(data)
            .with_context(|| format!("Failed to save {}", self.file_path.display()))?;
        if let Some(git) = &self.git_ops
            && let Err(e) = git.commit(&self.file_path, message)
        {
            warn!("Git commit failed: {:#}", e);
        }
        Ok(())
    }

    /// Push committed changes on exit when git sync is enabled
    pub fn shutdown(&self) -> Result<()> {
        if let Some(git) = &self.git_ops
            && git.is_git_managed()
        {
            git.push().context("Failed to push data file")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty_model() {
        let temp_dir = TempDir::new().unwrap();
        let storage = Storage::new(temp_dir.path().join("kairu.toml"), false);
        let data = storage.load().unwrap();
        assert!(data.tasks().is_empty());
        assert!(data.groups().is_empty());
    }

    #[test]
    fn test_save_creates_parent_dirs_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("kairu.toml");
        let storage = Storage::new(&path, false);

        let mut data = TodoData::new();
        data.add_group("Work").unwrap();
        storage.save(&data).unwrap();

        assert!(path.exists());
        assert!(!temp_dir.path().join("nested").join("kairu.toml.tmp").exists());
        let loaded = storage.load().unwrap();
        assert_eq!(loaded.groups().len(), 1);
    }

    #[test]
    fn test_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("kairu.toml");
        fs::write(&path, "tasks = \"not a list\"").unwrap();
        let storage = Storage::new(&path, false);
        assert!(matches!(storage.load(), Err(KairuError::CorruptStore(_))));
    }
}
