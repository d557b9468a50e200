// ── Authenticated session ──
//
// Who is logged in, what they may do where, and the queue of
// notifications waiting to be shown.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Mutex, PoisonError};

use tracing::error;

use crate::entitlement::REALM_SEARCH;
use crate::error::CoreError;
use crate::model::SelfInfo;
use crate::notification::{Level, Notification, describe};

const MAX_NOTIFICATIONS: usize = 32;

#[derive(Debug)]
pub struct Session {
    username: String,
    domain: String,
    /// Entitlement name to the realms where it is held.
    entitlements: BTreeMap<String, BTreeSet<String>>,
    delegations: Vec<String>,
    notifications: Mutex<VecDeque<Notification>>,
}

/// Realm part of an owned realm entry; dynamic-realm conditions follow `@`.
fn full_path(realm: &str) -> &str {
    realm.split_once('@').map_or(realm, |(path, _)| path)
}

impl Session {
    pub fn new(
        username: impl Into<String>,
        domain: impl Into<String>,
        entitlements: BTreeMap<String, BTreeSet<String>>,
    ) -> Self {
        Self {
            username: username.into(),
            domain: domain.into(),
            entitlements,
            delegations: Vec::new(),
            notifications: Mutex::new(VecDeque::new()),
        }
    }

    /// Session from the `users/self` response.
    pub fn from_self(info: SelfInfo, domain: impl Into<String>) -> Self {
        let mut session = Self::new(info.user.username, domain, info.entitlements);
        session.delegations = info.delegations;
        session
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn delegations(&self) -> &[String] {
        &self.delegations
    }

    pub fn entitlements(&self) -> impl Iterator<Item = &str> {
        self.entitlements.keys().map(String::as_str)
    }

    // ── Authorization ────────────────────────────────────────────────

    /// Whether the session owns `entitlements` (comma-separated) in any of
    /// `realms`.
    ///
    /// The first listed entitlement the session holds decides. With no
    /// realms, holding it anywhere is enough. A realm path is owned below
    /// any owned realm; other realm strings (dynamic realm keys) must match
    /// exactly.
    pub fn owns(&self, entitlements: &str, realms: &[&str]) -> bool {
        if entitlements.trim().is_empty() {
            return true;
        }
        let Some(owned) = entitlements
            .split(',')
            .map(str::trim)
            .find_map(|e| self.entitlements.get(e))
        else {
            return false;
        };
        let owned: BTreeSet<&str> = owned.iter().map(|r| full_path(r)).collect();
        if realms.is_empty() {
            return !owned.is_empty();
        }
        realms.iter().any(|requested| {
            if requested.starts_with('/') {
                owned.iter().any(|o| requested.starts_with(o))
            } else {
                owned.contains(requested)
            }
        })
    }

    /// Realms where the session may search realms, sorted.
    pub fn searchable_realms(&self) -> Vec<String> {
        let mut realms: Vec<String> = self
            .entitlements
            .get(REALM_SEARCH)
            .map(|set| set.iter().map(|r| full_path(r).to_owned()).collect())
            .unwrap_or_default();
        realms.sort();
        realms.dedup();
        realms
    }

    /// Starting realm for directories: `initial` when it lies under a
    /// searchable realm, else the first searchable realm, else `/`.
    pub fn root_realm(&self, initial: Option<&str>) -> String {
        let searchable = self.searchable_realms();
        match initial {
            Some(initial) if searchable.iter().any(|r| initial.starts_with(r.as_str())) => {
                initial.to_owned()
            }
            _ => searchable.into_iter().next().unwrap_or_else(|| "/".into()),
        }
    }

    // ── Notifications ────────────────────────────────────────────────

    pub fn notify(&self, notification: Notification) {
        let mut queue = self
            .notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if queue.len() == MAX_NOTIFICATIONS {
            queue.pop_front();
        }
        queue.push_back(notification);
    }

    pub fn success(&self) {
        self.notify(Notification::success());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(Notification::new(Level::Info, message));
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.notify(Notification::new(Level::Warning, message));
    }

    /// Log `err` and queue it as an error notification; returns the text
    /// shown to the operator.
    pub fn on_exception(&self, err: &CoreError) -> String {
        let message = describe(err);
        error!(error = %err, user = %self.username, "operation failed");
        self.notify(Notification::error(message.clone()));
        message
    }

    /// Queue a success or the error of `result`, passing it through.
    pub fn report<T>(&self, result: Result<T, CoreError>) -> Result<T, CoreError> {
        match &result {
            Ok(_) => self.success(),
            Err(e) => {
                self.on_exception(e);
            }
        }
        result
    }

    /// Take every queued notification, oldest first.
    pub fn drain_notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::notification::SUCCESS_MESSAGE;

    fn session(pairs: &[(&str, &[&str])]) -> Session {
        let entitlements = pairs
            .iter()
            .map(|(e, realms)| {
                (
                    (*e).to_owned(),
                    realms.iter().map(|r| (*r).to_owned()).collect(),
                )
            })
            .collect();
        Session::new("admin", "Master", entitlements)
    }

    #[test]
    fn empty_entitlements_are_always_owned() {
        assert!(session(&[]).owns("", &["/any"]));
    }

    #[test]
    fn realm_paths_are_owned_below_owned_realms() {
        let s = session(&[("USER_UPDATE", &["/even"])]);
        assert!(s.owns("USER_UPDATE", &["/even/two"]));
        assert!(s.owns("USER_UPDATE", &[]));
        assert!(!s.owns("USER_UPDATE", &["/odd"]));
        assert!(!s.owns("USER_DELETE", &[]));
    }

    #[test]
    fn dynamic_realms_match_exactly() {
        let s = session(&[("USER_READ", &["/", "dynRealm1"])]);
        assert!(s.owns("USER_READ", &["dynRealm1"]));
        assert!(!s.owns("USER_READ", &["dynRealm2"]));
    }

    #[test]
    fn one_owned_realm_among_several_is_enough() {
        let s = session(&[("USER_UPDATE", &["/even"])]);
        assert!(s.owns("USER_UPDATE", &["/odd", "/even/two"]));
        assert!(s.owns("USER_UPDATE", &["dynRealm1", "/even"]));
        assert!(!s.owns("USER_UPDATE", &["/odd", "dynRealm1"]));
    }

    #[test]
    fn first_held_entitlement_decides() {
        let s = session(&[("USER_READ", &["/odd"]), ("USER_UPDATE", &["/"])]);
        assert!(!s.owns("USER_READ,USER_UPDATE", &["/even"]));
        assert!(s.owns("USER_CREATE,USER_UPDATE", &["/even"]));
    }

    #[test]
    fn owned_realm_conditions_are_stripped() {
        let s = session(&[("GROUP_READ", &["/even@$groups==root"])]);
        assert!(s.owns("GROUP_READ", &["/even/two"]));
    }

    #[test]
    fn root_realm_prefers_initial_when_searchable() {
        let s = session(&[("REALM_SEARCH", &["/odd", "/even"])]);
        assert_eq!(s.searchable_realms(), vec!["/even", "/odd"]);
        assert_eq!(s.root_realm(Some("/even/two")), "/even/two");
        assert_eq!(s.root_realm(Some("/other")), "/even");
        assert_eq!(session(&[]).root_realm(None), "/");
    }

    #[test]
    fn exceptions_become_error_notifications() {
        let s = session(&[]);
        let message = s.on_exception(&CoreError::Timeout);
        s.success();
        let drained = s.drain_notifications();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].level, Level::Error);
        assert_eq!(drained[0].message, message);
        assert_eq!(drained[1].message, SUCCESS_MESSAGE);
        assert!(s.drain_notifications().is_empty());
    }
}
