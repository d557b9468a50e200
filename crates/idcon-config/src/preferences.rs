// File-backed preference store.
//
// One TOML file holds every user's preferences, one table per
// `<domain>/<username>` scope. Writes rewrite the whole file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use idcon_core::{CoreError, PreferenceStore, Preferences};

use crate::ConfigError;

type Scopes = BTreeMap<String, BTreeMap<String, String>>;

/// Default location of the preferences file.
pub fn preferences_path() -> PathBuf {
    crate::data_dir().join("preferences.toml")
}

/// Preferences of one user from the default file.
pub fn user_preferences(domain: &str, username: &str) -> Result<Preferences, ConfigError> {
    let store = FilePreferenceStore::open(preferences_path(), domain, username)?;
    Ok(Preferences::new(Arc::new(store)))
}

#[derive(Debug)]
pub struct FilePreferenceStore {
    path: PathBuf,
    scope: String,
    scopes: Mutex<Scopes>,
}

impl FilePreferenceStore {
    /// Open the store at `path` for one user. A missing file is empty.
    pub fn open(path: impl Into<PathBuf>, domain: &str, username: &str) -> Result<Self, ConfigError> {
        let path = path.into();
        let scopes = read_scopes(&path)?;
        Ok(Self {
            path,
            scope: format!("{domain}/{username}"),
            scopes: Mutex::new(scopes),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, scopes: &Scopes) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, toml::to_string_pretty(scopes)?)?;
        Ok(())
    }
}

fn read_scopes(path: &Path) -> Result<Scopes, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(raw) => toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Scopes::new()),
        Err(e) => Err(e.into()),
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.scopes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&self.scope)?
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let mut scopes = self.scopes.lock().unwrap_or_else(PoisonError::into_inner);
        scopes
            .entry(self.scope.clone())
            .or_default()
            .insert(key.to_owned(), value.to_owned());
        self.persist(&scopes).map_err(|e| CoreError::Config {
            message: format!("saving preferences to {}: {e}", self.path.display()),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use idcon_core::EntityKind;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rows_survive_reopen_per_user() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("preferences.toml");

        let store = FilePreferenceStore::open(&path, "Master", "admin").unwrap();
        let prefs = Preferences::new(Arc::new(store));
        prefs.set_paginator_rows(EntityKind::User, 25).unwrap();

        let reopened = Preferences::new(Arc::new(
            FilePreferenceStore::open(&path, "Master", "admin").unwrap(),
        ));
        assert_eq!(reopened.paginator_rows(EntityKind::User), 25);

        let other = Preferences::new(Arc::new(
            FilePreferenceStore::open(&path, "Two", "admin").unwrap(),
        ));
        assert_eq!(other.paginator_rows(EntityKind::User), 10);
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(
            FilePreferenceStore::open(&path, "Master", "admin"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
