//! PKCE verifier persistence.
//!
//! The verifier is minted when a flow starts (OAuth, signup) and consumed by
//! the code exchange, which may run in a later `portx callback` process. It
//! lives in `pkce.json` next to the preferences file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use zeroize::Zeroize;

const PKCE_FILE: &str = "pkce.json";

#[derive(Serialize, Deserialize)]
struct PkceFile {
    code_verifier: String,
}

pub struct PkceStore {
    path: Option<PathBuf>,
    memory: Mutex<Option<String>>,
}

impl PkceStore {
    /// Store beside `prefs_path`, or in `<config_dir>/portx/` by default.
    pub fn beside(prefs_path: Option<&Path>) -> Self {
        let path = match prefs_path {
            Some(prefs) => Some(prefs.with_file_name(PKCE_FILE)),
            None => dirs::config_dir().map(|dir| dir.join("portx").join(PKCE_FILE)),
        };
        Self {
            path,
            memory: Mutex::new(None),
        }
    }

    pub fn mint() -> String {
        format!("{}-{}", uuid::Uuid::new_v4(), uuid::Uuid::new_v4())
    }

    pub fn save(&self, verifier: &str) -> Result<()> {
        if let Ok(mut slot) = self.memory.lock() {
            *slot = Some(verifier.to_string());
        }
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("cannot create {}", parent.display()))?;
        }
        let mut body = serde_json::to_string(&PkceFile {
            code_verifier: verifier.to_string(),
        })?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let written = options
            .open(path)
            .and_then(|mut file| file.write_all(body.as_bytes()))
            .with_context(|| format!("cannot write {}", path.display()));
        body.zeroize();
        written
    }

    /// Remove and return the pending verifier. A verifier is good for one
    /// exchange only.
    pub fn take(&self) -> Option<String> {
        let in_memory = self.memory.lock().ok().and_then(|mut slot| slot.take());
        let on_disk = self.path.as_deref().and_then(take_file);
        in_memory.or(on_disk)
    }
}

fn take_file(path: &Path) -> Option<String> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return None,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "cannot read pkce verifier");
            return None;
        }
    };
    if let Err(error) = fs::remove_file(path) {
        tracing::warn!(path = %path.display(), %error, "cannot remove used pkce verifier");
    }
    match serde_json::from_str::<PkceFile>(&raw) {
        Ok(file) if !file.code_verifier.is_empty() => Some(file.code_verifier),
        Ok(_) => None,
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "corrupt pkce verifier file");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verifier_survives_a_new_store() {
        let dir = tempfile::tempdir().expect("temp dir");
        let prefs = dir.path().join("prefs.json");

        let first = PkceStore::beside(Some(&prefs));
        first.save("verifier-1").expect("saved");
        assert!(dir.path().join("pkce.json").exists());

        let second = PkceStore::beside(Some(&prefs));
        assert_eq!(second.take().as_deref(), Some("verifier-1"));
        assert_eq!(second.take(), None);
        assert!(!dir.path().join("pkce.json").exists());
    }

    #[test]
    fn test_corrupt_file_yields_nothing() {
        let dir = tempfile::tempdir().expect("temp dir");
        fs::write(dir.path().join("pkce.json"), "not json").expect("write");
        let store = PkceStore::beside(Some(&dir.path().join("prefs.json")));
        assert_eq!(store.take(), None);
    }

    #[test]
    fn test_minted_verifiers_differ() {
        let a = PkceStore::mint();
        assert_ne!(a, PkceStore::mint());
        assert!(a.len() >= 43);
    }
}
