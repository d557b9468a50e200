// ── Directory columns ──
//
// Column ids double as server sort properties for the kinds the server
// pages, so they use the wire (camelCase) spelling.

use chrono::{DateTime, Utc};

use crate::model::{
    Application, ConfParam, DerSchema, Domain, Entity, Group, Implementation, PlainSchema,
    Privilege, Realm, Role, User, VirSchema,
};

use super::sort::SortValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub id: &'static str,
    pub title: &'static str,
    pub sortable: bool,
    /// Shown when the operator has not chosen columns.
    pub default_visible: bool,
}

const fn col(id: &'static str, title: &'static str) -> Column {
    Column {
        id,
        title,
        sortable: true,
        default_visible: true,
    }
}

const fn hidden(id: &'static str, title: &'static str) -> Column {
    Column {
        id,
        title,
        sortable: true,
        default_visible: false,
    }
}

const fn fixed(id: &'static str, title: &'static str) -> Column {
    Column {
        id,
        title,
        sortable: false,
        default_visible: true,
    }
}

/// Column id always shown regardless of preferences.
pub const KEY_COLUMN: &str = "key";

/// An entity that can be rendered as a directory row.
pub trait Tabular: Entity {
    fn columns() -> &'static [Column];

    /// Display text of one cell; unknown columns render empty.
    fn cell(&self, column: &str) -> String;

    fn sort_value(&self, column: &str) -> SortValue {
        SortValue::text(self.cell(column))
    }

    /// Keyword match for client-side filtering.
    fn matches(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();
        self.name().to_lowercase().contains(&keyword)
            || self
                .key()
                .is_some_and(|k| k.to_lowercase().contains(&keyword))
    }

    fn column(id: &str) -> Option<&'static Column> {
        Self::columns().iter().find(|c| c.id == id)
    }

    fn default_columns() -> Vec<&'static str> {
        Self::columns()
            .iter()
            .filter(|c| c.default_visible)
            .map(|c| c.id)
            .collect()
    }
}

fn date(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(String::new, |d| d.format("%Y-%m-%d %H:%M:%S").to_string())
}

fn date_sort(value: Option<DateTime<Utc>>) -> SortValue {
    value.map_or(SortValue::Missing, |d| SortValue::Number(d.timestamp_millis()))
}

fn opt(value: Option<&str>) -> String {
    value.unwrap_or_default().to_owned()
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_owned()
}

// ── Users & groups ───────────────────────────────────────────────────

impl Tabular for User {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            col("key", "Key"),
            col("username", "Username"),
            col("status", "Status"),
            col("realm", "Realm"),
            hidden("mustChangePassword", "Must change password"),
            hidden("failedLogins", "Failed logins"),
            hidden("creationDate", "Created"),
            col("lastChangeDate", "Last change"),
            hidden("lastLoginDate", "Last login"),
        ];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => opt(self.key.as_deref()),
            "username" => self.username.clone(),
            "status" => opt(self.status.as_deref()),
            "realm" => self.realm.clone(),
            "mustChangePassword" => yes_no(self.must_change_password),
            "failedLogins" => self.failed_logins.map(|n| n.to_string()).unwrap_or_default(),
            "creationDate" => date(self.creation_date),
            "lastChangeDate" => date(self.last_change_date),
            "lastLoginDate" => date(self.last_login_date),
            _ => String::new(),
        }
    }

    fn sort_value(&self, column: &str) -> SortValue {
        match column {
            "mustChangePassword" => SortValue::Flag(self.must_change_password),
            "failedLogins" => self
                .failed_logins
                .map_or(SortValue::Missing, |n| SortValue::Number(i64::from(n))),
            "creationDate" => date_sort(self.creation_date),
            "lastChangeDate" => date_sort(self.last_change_date),
            "lastLoginDate" => date_sort(self.last_login_date),
            other => SortValue::text(self.cell(other)),
        }
    }
}

impl Tabular for Group {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            col("key", "Key"),
            col("name", "Name"),
            col("realm", "Realm"),
            hidden("userOwner", "User owner"),
            hidden("groupOwner", "Group owner"),
            hidden("creationDate", "Created"),
            col("lastChangeDate", "Last change"),
        ];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => opt(self.key.as_deref()),
            "name" => self.name.clone(),
            "realm" => self.realm.clone(),
            "userOwner" => opt(self.user_owner.as_deref()),
            "groupOwner" => opt(self.group_owner.as_deref()),
            "creationDate" => date(self.creation_date),
            "lastChangeDate" => date(self.last_change_date),
            _ => String::new(),
        }
    }

    fn sort_value(&self, column: &str) -> SortValue {
        match column {
            "creationDate" => date_sort(self.creation_date),
            "lastChangeDate" => date_sort(self.last_change_date),
            other => SortValue::text(self.cell(other)),
        }
    }
}

// ── Access ───────────────────────────────────────────────────────────

impl Tabular for Role {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            col("key", "Key"),
            fixed("entitlements", "Entitlements"),
            fixed("realms", "Realms"),
            hidden("dynamicRealms", "Dynamic realms"),
        ];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => opt(self.key.as_deref()),
            "entitlements" => self.entitlements.len().to_string(),
            "realms" => self.realms.join(", "),
            "dynamicRealms" => self.dynamic_realms.join(", "),
            _ => String::new(),
        }
    }
}

impl Tabular for Realm {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            fixed("key", "Key"),
            fixed("name", "Name"),
            fixed("fullPath", "Full path"),
            fixed("accountPolicy", "Account policy"),
            fixed("passwordPolicy", "Password policy"),
        ];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => opt(self.key.as_deref()),
            "name" => self.name.clone(),
            "fullPath" => self.full_path.clone(),
            "accountPolicy" => opt(self.account_policy.as_deref()),
            "passwordPolicy" => opt(self.password_policy.as_deref()),
            _ => String::new(),
        }
    }
}

impl Tabular for Application {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            col("key", "Key"),
            col("description", "Description"),
            fixed("privileges", "Privileges"),
        ];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => opt(self.key.as_deref()),
            "description" => opt(self.description.as_deref()),
            "privileges" => self
                .privileges
                .iter()
                .map(|p| p.key.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            _ => String::new(),
        }
    }
}

impl Tabular for Privilege {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[col("key", "Key"), col("description", "Description")];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => self.key.clone(),
            "description" => opt(self.description.as_deref()),
            _ => String::new(),
        }
    }
}

// ── Schemas ──────────────────────────────────────────────────────────

impl Tabular for PlainSchema {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            col("key", "Key"),
            col("type", "Type"),
            col("anyTypeClass", "Any type class"),
            col("mandatoryCondition", "Mandatory"),
            hidden("multivalue", "Multivalue"),
            hidden("uniqueConstraint", "Unique"),
            hidden("readonly", "Read-only"),
        ];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => opt(self.key.as_deref()),
            "type" => self.kind.to_string(),
            "anyTypeClass" => opt(self.any_type_class.as_deref()),
            "mandatoryCondition" => self.mandatory_condition.clone(),
            "multivalue" => yes_no(self.multivalue),
            "uniqueConstraint" => yes_no(self.unique_constraint),
            "readonly" => yes_no(self.readonly),
            _ => String::new(),
        }
    }

    fn sort_value(&self, column: &str) -> SortValue {
        match column {
            "multivalue" => SortValue::Flag(self.multivalue),
            "uniqueConstraint" => SortValue::Flag(self.unique_constraint),
            "readonly" => SortValue::Flag(self.readonly),
            other => SortValue::text(self.cell(other)),
        }
    }
}

impl Tabular for DerSchema {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            col("key", "Key"),
            col("anyTypeClass", "Any type class"),
            col("expression", "Expression"),
        ];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => opt(self.key.as_deref()),
            "anyTypeClass" => opt(self.any_type_class.as_deref()),
            "expression" => self.expression.clone(),
            _ => String::new(),
        }
    }
}

impl Tabular for VirSchema {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            col("key", "Key"),
            col("anyTypeClass", "Any type class"),
            col("resource", "Resource"),
            col("anyType", "Any type"),
            col("extAttrName", "External attribute"),
            hidden("readonly", "Read-only"),
        ];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => opt(self.key.as_deref()),
            "anyTypeClass" => opt(self.any_type_class.as_deref()),
            "resource" => self.resource.clone(),
            "anyType" => self.any_type.clone(),
            "extAttrName" => self.ext_attr_name.clone(),
            "readonly" => yes_no(self.readonly),
            _ => String::new(),
        }
    }
}

// ── Keymaster & implementations ──────────────────────────────────────

impl Tabular for Domain {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            col("key", "Key"),
            col("jdbcURL", "JDBC URL"),
            hidden("dbUsername", "DB user"),
            col("poolMaxActive", "Pool max"),
            col("poolMinIdle", "Pool min"),
            hidden("adminCipherAlgorithm", "Admin cipher"),
        ];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => opt(self.key.as_deref()),
            "jdbcURL" => self.jdbc_url.clone(),
            "dbUsername" => self.db_username.clone(),
            "poolMaxActive" => self.pool_max_active.to_string(),
            "poolMinIdle" => self.pool_min_idle.to_string(),
            "adminCipherAlgorithm" => self.admin_cipher_algorithm.clone(),
            _ => String::new(),
        }
    }

    fn sort_value(&self, column: &str) -> SortValue {
        match column {
            "poolMaxActive" => SortValue::Number(i64::from(self.pool_max_active)),
            "poolMinIdle" => SortValue::Number(i64::from(self.pool_min_idle)),
            other => SortValue::text(self.cell(other)),
        }
    }
}

impl Tabular for Implementation {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            col("key", "Key"),
            col("type", "Type"),
            col("engine", "Engine"),
        ];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => opt(self.key.as_deref()),
            "type" => self.kind.clone(),
            "engine" => self.engine.to_string(),
            _ => String::new(),
        }
    }
}

impl Tabular for ConfParam {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            col("key", "Key"),
            col("type", "Type"),
            hidden("multivalue", "Multivalue"),
            fixed("values", "Values"),
        ];
        COLUMNS
    }

    fn cell(&self, column: &str) -> String {
        match column {
            "key" => opt(self.key.as_deref()),
            "type" => self.kind.to_string(),
            "multivalue" => yes_no(self.multivalue),
            "values" => self.values.join(", "),
            _ => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_defaults_include_key() {
        let defaults = User::default_columns();
        assert!(defaults.contains(&KEY_COLUMN));
        assert!(!defaults.contains(&"creationDate"));
    }

    #[test]
    fn keyword_matches_name_case_insensitively() {
        let role = Role {
            key: Some("Search for realm evenTwo".into()),
            ..Role::default()
        };
        assert!(role.matches("EVENTWO"));
        assert!(!role.matches("odd"));
    }

    #[test]
    fn user_sorts_dates_numerically() {
        let user = User::default();
        assert_eq!(user.sort_value("lastChangeDate"), SortValue::Missing);
        assert_eq!(
            User {
                must_change_password: true,
                ..User::default()
            }
            .sort_value("mustChangePassword"),
            SortValue::Flag(true)
        );
    }
}
