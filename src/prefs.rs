use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PrefsFile {
    #[serde(default)]
    theme: Theme,
}

/// The persisted theme flag. Read once at startup, written on every toggle.
#[derive(Debug)]
pub struct PrefsStore {
    path: Option<PathBuf>,
    theme: Theme,
}

impl PrefsStore {
    pub fn open(path: Option<PathBuf>) -> Self {
        let path = path.or_else(default_prefs_path);
        let theme = path.as_deref().map(read_theme).unwrap_or_default();
        Self { path, theme }
    }

    /// Store that never touches disk.
    pub fn in_memory(theme: Theme) -> Self {
        Self { path: None, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        self.theme = self.theme.toggle();
        self.save()?;
        Ok(self.theme)
    }

    fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(&PrefsFile { theme: self.theme })?;
        fs::write(path, body).with_context(|| format!("cannot write {}", path.display()))?;
        tracing::debug!(path = %path.display(), theme = self.theme.as_str(), "saved preferences");
        Ok(())
    }
}

fn default_prefs_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("portx").join("prefs.json"))
}

fn read_theme(path: &Path) -> Theme {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Theme::default(),
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "cannot read preferences");
            return Theme::default();
        }
    };
    match serde_json::from_str::<PrefsFile>(&raw) {
        Ok(file) => file.theme,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "ignoring corrupt preferences");
            Theme::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_defaults_to_light() {
        let temp = TempDir::new().expect("temp dir");
        let store = PrefsStore::open(Some(temp.path().join("prefs.json")));
        assert_eq!(store.theme(), Theme::Light);
    }

    #[test]
    fn test_toggle_persists_across_reopen() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("nested").join("prefs.json");

        let mut store = PrefsStore::open(Some(path.clone()));
        assert_eq!(store.toggle_theme().expect("toggle"), Theme::Dark);

        let reopened = PrefsStore::open(Some(path.clone()));
        assert_eq!(reopened.theme(), Theme::Dark);
        let raw = fs::read_to_string(&path).expect("prefs written");
        assert!(raw.contains("\"dark\""));
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("prefs.json");
        fs::write(&path, "{not json").expect("seed");
        assert_eq!(PrefsStore::open(Some(path)).theme(), Theme::Light);
    }

    #[test]
    fn test_in_memory_toggle_does_not_write() {
        let mut store = PrefsStore::in_memory(Theme::Dark);
        assert_eq!(store.toggle_theme().expect("toggle"), Theme::Light);
        assert!(store.path().is_none());
    }
}
