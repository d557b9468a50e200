use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Every kind of entity the console administers.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum EntityKind {
    User,
    Group,
    Role,
    Realm,
    PlainSchema,
    DerSchema,
    VirSchema,
    Domain,
    Application,
    Privilege,
    Implementation,
    Parameter,
}

impl EntityKind {
    /// Human-readable plural, for titles.
    pub fn title(self) -> &'static str {
        match self {
            Self::User => "Users",
            Self::Group => "Groups",
            Self::Role => "Roles",
            Self::Realm => "Realms",
            Self::PlainSchema => "Plain schemas",
            Self::DerSchema => "Derived schemas",
            Self::VirSchema => "Virtual schemas",
            Self::Domain => "Domains",
            Self::Application => "Applications",
            Self::Privilege => "Privileges",
            Self::Implementation => "Implementations",
            Self::Parameter => "Parameters",
        }
    }

    /// Human-readable singular.
    pub fn singular(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Role => "role",
            Self::Realm => "realm",
            Self::PlainSchema => "plain schema",
            Self::DerSchema => "derived schema",
            Self::VirSchema => "virtual schema",
            Self::Domain => "domain",
            Self::Application => "application",
            Self::Privilege => "privilege",
            Self::Implementation => "implementation",
            Self::Parameter => "parameter",
        }
    }

    /// Prefix of the per-user preference keys of this kind's directory.
    pub fn preference_prefix(self) -> &'static str {
        match self {
            Self::User => "users",
            Self::Group => "groups",
            Self::Role => "roles",
            Self::Realm => "realms",
            Self::PlainSchema => "schemas.plain",
            Self::DerSchema => "schemas.derived",
            Self::VirSchema => "schemas.virtual",
            Self::Domain => "domains",
            Self::Application => "applications",
            Self::Privilege => "privileges",
            Self::Implementation => "implementations",
            Self::Parameter => "parameters",
        }
    }

    /// Preference key holding the rows-per-page choice.
    pub fn paginator_rows_key(self) -> String {
        format!("{}.paginator.rows", self.preference_prefix())
    }

    /// Preference key holding the visible column ids.
    pub fn columns_key(self) -> String {
        format!("{}.list.columns", self.preference_prefix())
    }

    /// Whether the server pages and sorts this kind (as opposed to
    /// returning the whole collection).
    pub fn server_paged(self) -> bool {
        matches!(self, Self::User | Self::Group | Self::Realm)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn preference_keys() {
        assert_eq!(EntityKind::User.paginator_rows_key(), "users.paginator.rows");
        assert_eq!(
            EntityKind::PlainSchema.columns_key(),
            "schemas.plain.list.columns"
        );
    }

    #[test]
    fn parses_from_cli_spelling() {
        assert_eq!(
            "plain_schema".parse::<EntityKind>().unwrap(),
            EntityKind::PlainSchema
        );
        assert_eq!(EntityKind::VirSchema.to_string(), "vir_schema");
    }
}
