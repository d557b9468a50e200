// ── Row and batch actions ──
//
// Each directory offers a fixed set of actions; each action carries the
// entitlements the session must own in the row's realm.

use serde::Serialize;
use strum::{Display, EnumString};

use crate::entitlement::{
    APPLICATION_CREATE, APPLICATION_DELETE, APPLICATION_UPDATE, GROUP_CREATE, GROUP_DELETE,
    IMPLEMENTATION_CREATE, IMPLEMENTATION_DELETE, IMPLEMENTATION_UPDATE, KEYMASTER,
    REALM_CREATE, REALM_DELETE, REALM_UPDATE, ROLE_CREATE, ROLE_DELETE, SCHEMA_CREATE,
    SCHEMA_DELETE, SCHEMA_UPDATE, USER_CREATE, USER_DELETE, USER_UPDATE,
};
use crate::model::EntityKind;
use crate::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ActionType {
    Create,
    Edit,
    Clone,
    Delete,
    MustChangePassword,
    Suspend,
    Reactivate,
}

impl ActionType {
    pub fn label(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Edit => "Edit",
            Self::Clone => "Clone",
            Self::Delete => "Delete",
            Self::MustChangePassword => "Must change password",
            Self::Suspend => "Suspend",
            Self::Reactivate => "Reactivate",
        }
    }

    /// Destructive actions ask for confirmation first.
    pub fn needs_confirm(self) -> bool {
        matches!(self, Self::Delete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionType,
    /// Comma-separated entitlements, as checked by [`Session::owns`].
    pub entitlements: &'static str,
}

const fn action(kind: ActionType, entitlements: &'static str) -> Action {
    Action { kind, entitlements }
}

const USER_EDIT: &str = "USER_READ,USER_UPDATE";
const GROUP_EDIT: &str = "GROUP_READ,GROUP_UPDATE";
const ROLE_EDIT: &str = "ROLE_READ,ROLE_UPDATE";

const USER_ROWS: &[Action] = &[
    action(ActionType::Edit, USER_EDIT),
    action(ActionType::MustChangePassword, USER_UPDATE),
    action(ActionType::Clone, USER_CREATE),
    action(ActionType::Delete, USER_DELETE),
];
const GROUP_ROWS: &[Action] = &[
    action(ActionType::Edit, GROUP_EDIT),
    action(ActionType::Clone, GROUP_CREATE),
    action(ActionType::Delete, GROUP_DELETE),
];
const ROLE_ROWS: &[Action] = &[
    action(ActionType::Edit, ROLE_EDIT),
    action(ActionType::Clone, ROLE_CREATE),
    action(ActionType::Delete, ROLE_DELETE),
];
const REALM_ROWS: &[Action] = &[
    action(ActionType::Edit, REALM_UPDATE),
    action(ActionType::Delete, REALM_DELETE),
];
const SCHEMA_ROWS: &[Action] = &[
    action(ActionType::Edit, SCHEMA_UPDATE),
    action(ActionType::Delete, SCHEMA_DELETE),
];
const APPLICATION_ROWS: &[Action] = &[
    action(ActionType::Edit, APPLICATION_UPDATE),
    action(ActionType::Delete, APPLICATION_DELETE),
];
const IMPLEMENTATION_ROWS: &[Action] = &[
    action(ActionType::Edit, IMPLEMENTATION_UPDATE),
    action(ActionType::Delete, IMPLEMENTATION_DELETE),
];
const KEYMASTER_ROWS: &[Action] = &[
    action(ActionType::Edit, KEYMASTER),
    action(ActionType::Delete, KEYMASTER),
];

const USER_BATCH: &[Action] = &[
    action(ActionType::MustChangePassword, USER_UPDATE),
    action(ActionType::Delete, USER_DELETE),
    action(ActionType::Suspend, USER_UPDATE),
    action(ActionType::Reactivate, USER_UPDATE),
];
const GROUP_BATCH: &[Action] = &[action(ActionType::Delete, GROUP_DELETE)];

/// Per-row actions of a directory, in menu order.
pub fn row_actions(kind: EntityKind) -> &'static [Action] {
    match kind {
        EntityKind::User => USER_ROWS,
        EntityKind::Group => GROUP_ROWS,
        EntityKind::Role => ROLE_ROWS,
        EntityKind::Realm => REALM_ROWS,
        EntityKind::PlainSchema | EntityKind::DerSchema | EntityKind::VirSchema => SCHEMA_ROWS,
        EntityKind::Application => APPLICATION_ROWS,
        EntityKind::Privilege => &[],
        EntityKind::Implementation => IMPLEMENTATION_ROWS,
        EntityKind::Domain | EntityKind::Parameter => KEYMASTER_ROWS,
    }
}

/// Actions offered on the checkbox selection.
pub fn batch_actions(kind: EntityKind) -> &'static [Action] {
    match kind {
        EntityKind::User => USER_BATCH,
        EntityKind::Group => GROUP_BATCH,
        _ => &[],
    }
}

/// Entitlement of the directory's create action, if it has one.
pub fn create_entitlement(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::User => Some(USER_CREATE),
        EntityKind::Group => Some(GROUP_CREATE),
        EntityKind::Role => Some(ROLE_CREATE),
        EntityKind::Realm => Some(REALM_CREATE),
        EntityKind::PlainSchema | EntityKind::DerSchema | EntityKind::VirSchema => {
            Some(SCHEMA_CREATE)
        }
        EntityKind::Application => Some(APPLICATION_CREATE),
        EntityKind::Implementation => Some(IMPLEMENTATION_CREATE),
        EntityKind::Domain | EntityKind::Parameter => Some(KEYMASTER),
        EntityKind::Privilege => None,
    }
}

fn realms(realm: Option<&str>) -> Vec<&str> {
    realm.into_iter().collect()
}

/// Row actions the session may run on a row in `realm`.
pub fn visible_actions(session: &Session, kind: EntityKind, realm: Option<&str>) -> Vec<ActionType> {
    let realms = realms(realm);
    row_actions(kind)
        .iter()
        .filter(|a| session.owns(a.entitlements, &realms))
        .map(|a| a.kind)
        .collect()
}

/// Batch actions the session may run in `realm`.
pub fn visible_batch_actions(
    session: &Session,
    kind: EntityKind,
    realm: Option<&str>,
) -> Vec<ActionType> {
    let realms = realms(realm);
    batch_actions(kind)
        .iter()
        .filter(|a| session.owns(a.entitlements, &realms))
        .map(|a| a.kind)
        .collect()
}

/// Whether the create action is offered in `realm`.
pub fn can_create(session: &Session, kind: EntityKind, realm: Option<&str>) -> bool {
    create_entitlement(kind).is_some_and(|e| session.owns(e, &realms(realm)))
}

/// Whether `action` on `kind` is allowed in `realm`.
pub fn allowed(session: &Session, kind: EntityKind, action: ActionType, realm: Option<&str>) -> bool {
    if action == ActionType::Create {
        return can_create(session, kind, realm);
    }
    let realms = realms(realm);
    row_actions(kind)
        .iter()
        .chain(batch_actions(kind))
        .filter(|a| a.kind == action)
        .any(|a| session.owns(a.entitlements, &realms))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use pretty_assertions::assert_eq;

    use super::*;

    fn session(entitlements: &[&str], realm: &str) -> Session {
        let map: BTreeMap<String, BTreeSet<String>> = entitlements
            .iter()
            .map(|e| ((*e).to_owned(), BTreeSet::from([realm.to_owned()])))
            .collect();
        Session::new("operator", "Master", map)
    }

    #[test]
    fn user_row_actions_follow_entitlements() {
        let s = session(&["USER_READ", "USER_UPDATE", "USER_CREATE"], "/even");
        assert_eq!(
            visible_actions(&s, EntityKind::User, Some("/even/two")),
            vec![ActionType::Edit, ActionType::MustChangePassword, ActionType::Clone]
        );
        assert!(visible_actions(&s, EntityKind::User, Some("/odd")).is_empty());
    }

    #[test]
    fn user_batch_actions() {
        let s = session(&["USER_UPDATE", "USER_DELETE"], "/");
        assert_eq!(
            visible_batch_actions(&s, EntityKind::User, Some("/")),
            vec![
                ActionType::MustChangePassword,
                ActionType::Delete,
                ActionType::Suspend,
                ActionType::Reactivate
            ]
        );
        assert!(visible_batch_actions(&s, EntityKind::Role, None).is_empty());
    }

    #[test]
    fn keymaster_gates_domains() {
        let s = session(&["KEYMASTER"], "/");
        assert!(can_create(&s, EntityKind::Domain, None));
        assert!(allowed(&s, EntityKind::Parameter, ActionType::Delete, None));
        assert!(!can_create(&s, EntityKind::User, None));
    }

    #[test]
    fn every_editable_kind_offers_edit_then_delete_last() {
        use strum::IntoEnumIterator;

        for kind in EntityKind::iter().filter(|k| *k != EntityKind::Privilege) {
            let rows = row_actions(kind);
            assert_eq!(rows.first().map(|a| a.kind), Some(ActionType::Edit), "{kind}");
            assert_eq!(rows.last().map(|a| a.kind), Some(ActionType::Delete), "{kind}");
        }
        assert!(row_actions(EntityKind::Privilege).is_empty());
        assert_eq!(batch_actions(EntityKind::Group).len(), 1);
        assert!(batch_actions(EntityKind::Realm).is_empty());
    }

    #[test]
    fn action_names_parse() {
        assert_eq!(
            "must_change_password".parse::<ActionType>().unwrap_or(ActionType::Edit),
            ActionType::MustChangePassword
        );
        assert_eq!(ActionType::Reactivate.to_string(), "REACTIVATE");
    }
}
