// ── Entity identity ──
//
// A uniform view over the wire types: opaque key, display name, realm
// scope and the entity tag used for conditional writes.

use idcon_api::{
    Application, ConfParam, DerSchema, Domain, Group, Implementation, PlainSchema, Privilege,
    Realm, Role, User, VirSchema,
};

use super::EntityKind;

/// Identity and lifecycle hooks shared by all administrable entities.
pub trait Entity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    /// The opaque key; `None` until the entity exists on the server.
    fn key(&self) -> Option<&str>;

    fn set_key(&mut self, key: Option<String>);

    /// Label shown in lists and messages.
    fn name(&self) -> &str;

    /// Realm the entity lives in, for realm-scoped entitlement checks.
    fn realm(&self) -> Option<&str> {
        None
    }

    /// Entity tag derived from the entity itself, when the server
    /// computes one from its last change date.
    fn etag(&self) -> Option<String> {
        None
    }

    /// A copy suitable for a create wizard.
    fn clone_for_create(&self) -> Self {
        let mut copy = self.clone();
        copy.set_key(None);
        copy
    }
}

fn etag_from(date: Option<chrono::DateTime<chrono::Utc>>) -> Option<String> {
    date.map(|d| format!("\"{}\"", d.timestamp_millis()))
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn set_key(&mut self, key: Option<String>) {
        self.key = key;
    }

    fn name(&self) -> &str {
        &self.username
    }

    fn realm(&self) -> Option<&str> {
        Some(&self.realm)
    }

    fn etag(&self) -> Option<String> {
        etag_from(self.last_change_date)
    }

    fn clone_for_create(&self) -> Self {
        Self {
            key: None,
            username: format!("{}_clone", self.username),
            password: None,
            status: None,
            creation_date: None,
            last_change_date: None,
            last_login_date: None,
            failed_logins: None,
            ..self.clone()
        }
    }
}

impl Entity for Group {
    const KIND: EntityKind = EntityKind::Group;

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn set_key(&mut self, key: Option<String>) {
        self.key = key;
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn realm(&self) -> Option<&str> {
        Some(&self.realm)
    }

    fn etag(&self) -> Option<String> {
        etag_from(self.last_change_date)
    }

    fn clone_for_create(&self) -> Self {
        Self {
            key: None,
            creation_date: None,
            last_change_date: None,
            ..self.clone()
        }
    }
}

impl Entity for Realm {
    const KIND: EntityKind = EntityKind::Realm;

    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    fn set_key(&mut self, key: Option<String>) {
        self.key = key;
    }

    fn name(&self) -> &str {
        &self.full_path
    }

    fn realm(&self) -> Option<&str> {
        Some(&self.full_path)
    }
}

/// Entities keyed by a name the operator chooses.
macro_rules! named_entity {
    ($ty:ty, $kind:expr) => {
        impl Entity for $ty {
            const KIND: EntityKind = $kind;

            fn key(&self) -> Option<&str> {
                self.key.as_deref()
            }

            fn set_key(&mut self, key: Option<String>) {
                self.key = key;
            }

            fn name(&self) -> &str {
                self.key.as_deref().unwrap_or_default()
            }
        }
    };
}

named_entity!(Role, EntityKind::Role);
named_entity!(PlainSchema, EntityKind::PlainSchema);
named_entity!(DerSchema, EntityKind::DerSchema);
named_entity!(VirSchema, EntityKind::VirSchema);
named_entity!(Domain, EntityKind::Domain);
named_entity!(Application, EntityKind::Application);
named_entity!(Implementation, EntityKind::Implementation);
named_entity!(ConfParam, EntityKind::Parameter);

impl Entity for Privilege {
    const KIND: EntityKind = EntityKind::Privilege;

    fn key(&self) -> Option<&str> {
        Some(self.key.as_str()).filter(|k| !k.is_empty())
    }

    fn set_key(&mut self, key: Option<String>) {
        self.key = key.unwrap_or_default();
    }

    fn name(&self) -> &str {
        &self.key
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn user_clone_clears_key_and_suffixes_username() {
        let user = User {
            key: Some("1417acbe".into()),
            username: "rossini".into(),
            password: Some("secret".into()),
            roles: vec!["Other".into()],
            ..User::default()
        };
        let clone = user.clone_for_create();
        assert_eq!(clone.key, None);
        assert_eq!(clone.username, "rossini_clone");
        assert_eq!(clone.password, None);
        assert_eq!(clone.roles, vec!["Other".to_owned()]);
    }

    #[test]
    fn group_clone_keeps_name() {
        let group = Group {
            key: Some("g1".into()),
            name: "root".into(),
            ..Group::default()
        };
        let clone = group.clone_for_create();
        assert_eq!(clone.key, None);
        assert_eq!(clone.name, "root");
    }

    #[test]
    fn etag_from_last_change_date() {
        let user = User {
            last_change_date: Some(chrono::Utc.timestamp_millis_opt(1_700_000_000_123).unwrap()),
            ..User::default()
        };
        assert_eq!(user.etag().as_deref(), Some("\"1700000000123\""));
        assert_eq!(Role::default().etag(), None);
    }

    #[test]
    fn privilege_empty_key_is_none() {
        let mut p = Privilege::default();
        assert_eq!(p.key(), None);
        p.set_key(Some("postMighty".into()));
        assert_eq!(p.key(), Some("postMighty"));
    }
}
