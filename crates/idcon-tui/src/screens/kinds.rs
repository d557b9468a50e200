//! Directory kinds: where each screen's rows come from.

use idcon_core::directory::{CollectionProvider, RemoteProvider};
use idcon_core::search::directory_fiql;
use idcon_core::{
    Application, ConfParam, Console, DerSchema, Domain, Entity, Group, Implementation,
    PlainSchema, Realm, Role, User, VirSchema,
};

use super::directory::DirectoryKind;

pub struct Users;
pub struct Groups;
pub struct Roles;
pub struct Realms;
pub struct PlainSchemas;
pub struct DerSchemas;
pub struct VirSchemas;
pub struct Applications;
pub struct Domains;
pub struct Params;

/// Implementations of one type.
pub struct Implementations(pub &'static str);

impl DirectoryKind for Users {
    type Item = User;
    type Provider = RemoteProvider<User>;
    const CHECKBOXES: bool = true;

    fn provider(&self, console: &Console, keyword: Option<&str>) -> Self::Provider {
        console.users(None, directory_fiql(User::KIND, keyword, &[]))
    }

    fn template(&self) -> User {
        User {
            realm: "/".into(),
            ..User::default()
        }
    }
}

impl DirectoryKind for Groups {
    type Item = Group;
    type Provider = RemoteProvider<Group>;
    const CHECKBOXES: bool = true;

    fn provider(&self, console: &Console, keyword: Option<&str>) -> Self::Provider {
        console.groups(None, directory_fiql(Group::KIND, keyword, &[]))
    }

    fn template(&self) -> Group {
        Group {
            realm: "/".into(),
            ..Group::default()
        }
    }
}

impl DirectoryKind for Realms {
    type Item = Realm;
    type Provider = RemoteProvider<Realm>;

    fn provider(&self, console: &Console, keyword: Option<&str>) -> Self::Provider {
        console.realms(None, keyword.map(str::to_owned))
    }

    fn template(&self) -> Realm {
        Realm {
            parent: Some("/".into()),
            ..Realm::default()
        }
    }
}

impl DirectoryKind for Implementations {
    type Item = Implementation;
    type Provider = CollectionProvider<Implementation>;

    fn provider(&self, console: &Console, keyword: Option<&str>) -> Self::Provider {
        console.implementations(self.0, keyword.map(str::to_owned))
    }

    fn template(&self) -> Implementation {
        Implementation {
            kind: self.0.to_owned(),
            ..Implementation::default()
        }
    }
}

/// Kinds listed as a whole collection and filtered by keyword.
macro_rules! collection_kind {
    ($kind:ty, $item:ty, $method:ident) => {
        impl DirectoryKind for $kind {
            type Item = $item;
            type Provider = CollectionProvider<$item>;

            fn provider(&self, console: &Console, keyword: Option<&str>) -> Self::Provider {
                console.$method(keyword.map(str::to_owned))
            }
        }
    };
}

collection_kind!(Roles, Role, roles);
collection_kind!(PlainSchemas, PlainSchema, plain_schemas);
collection_kind!(DerSchemas, DerSchema, der_schemas);
collection_kind!(VirSchemas, VirSchema, vir_schemas);
collection_kind!(Applications, Application, applications);
collection_kind!(Domains, Domain, domains);
collection_kind!(Params, ConfParam, params);
