// ── Per-user preferences ──
//
// Rows per page and visible columns survive between sessions. Core only
// knows the `PreferenceStore` trait; the config crate supplies a
// file-backed store keyed by domain and username.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::warn;

use crate::error::CoreError;
use crate::model::EntityKind;

/// Rows-per-page choices offered by every directory.
pub const PAGINATOR_CHOICES: [u32; 4] = [10, 25, 50, 100];

/// Rows per page when nothing (valid) is stored.
pub const DEFAULT_ROWS: u32 = 10;

/// Key/value persistence for one user's preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError>;
}

/// Volatile store, for tests and one-shot CLI calls.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, String>>,
}

impl PreferenceStore for MemoryPreferences {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Typed access to the preference keys the directories use.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn PreferenceStore>,
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self::new(Arc::new(MemoryPreferences::default()))
    }
}

impl Preferences {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    /// Stored rows per page for `kind`, or [`DEFAULT_ROWS`] when missing
    /// or not one of [`PAGINATOR_CHOICES`].
    pub fn paginator_rows(&self, kind: EntityKind) -> u32 {
        self.store
            .get(&kind.paginator_rows_key())
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|rows| PAGINATOR_CHOICES.contains(rows))
            .unwrap_or(DEFAULT_ROWS)
    }

    pub fn set_paginator_rows(&self, kind: EntityKind, rows: u32) -> Result<(), CoreError> {
        if !PAGINATOR_CHOICES.contains(&rows) {
            return Err(CoreError::validation(format!(
                "rows per page must be one of {PAGINATOR_CHOICES:?}"
            )));
        }
        self.store
            .set(&kind.paginator_rows_key(), &rows.to_string())
    }

    /// Stored visible column ids for `kind`, or `defaults`.
    pub fn visible_columns(&self, kind: EntityKind, defaults: &[&str]) -> Vec<String> {
        self.store
            .get(&kind.columns_key())
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                    .map(str::to_owned)
                    .collect::<Vec<_>>()
            })
            .filter(|cols| !cols.is_empty())
            .unwrap_or_else(|| defaults.iter().map(|c| (*c).to_owned()).collect())
    }

    pub fn set_visible_columns(&self, kind: EntityKind, columns: &[String]) -> Result<(), CoreError> {
        self.store.set(&kind.columns_key(), &columns.join(","))
    }

    /// Best-effort save; a failing store only logs.
    pub(crate) fn try_set_paginator_rows(&self, kind: EntityKind, rows: u32) {
        if let Err(e) = self.set_paginator_rows(kind, rows) {
            warn!(error = %e, %kind, "could not save rows per page");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn rows_default_when_missing_or_invalid() {
        let store = Arc::new(MemoryPreferences::default());
        let prefs = Preferences::new(store.clone());
        assert_eq!(prefs.paginator_rows(EntityKind::User), 10);
        store.set("users.paginator.rows", "33").unwrap();
        assert_eq!(prefs.paginator_rows(EntityKind::User), 10);
        store.set("users.paginator.rows", "50").unwrap();
        assert_eq!(prefs.paginator_rows(EntityKind::User), 50);
        assert_eq!(prefs.paginator_rows(EntityKind::Group), 10);
    }

    #[test]
    fn rejects_unknown_rows_choice() {
        let prefs = Preferences::default();
        assert!(prefs.set_paginator_rows(EntityKind::Role, 7).is_err());
        prefs.set_paginator_rows(EntityKind::Role, 25).unwrap();
        assert_eq!(prefs.paginator_rows(EntityKind::Role), 25);
    }

    #[test]
    fn visible_columns_round_trip() {
        let prefs = Preferences::default();
        assert_eq!(
            prefs.visible_columns(EntityKind::User, &["key", "username"]),
            vec!["key", "username"]
        );
        prefs
            .set_visible_columns(EntityKind::User, &["key".into(), "status".into()])
            .unwrap();
        assert_eq!(
            prefs.visible_columns(EntityKind::User, &["key"]),
            vec!["key", "status"]
        );
    }
}
