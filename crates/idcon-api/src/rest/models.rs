// Wire types for the identity repository REST API.
//
// Field names follow the server's camelCase JSON. Every entity carries an
// optional opaque `key`; a missing key means "not yet created".

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Conversion pattern marking an encrypted schema as transparently decoded.
pub const ENCRYPTED_DECODE_CONVERSION_PATTERN: &str = "==●●●Decode●●●==";

// ── Envelopes ────────────────────────────────────────────────────────

/// One page of a server-side search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default = "Vec::new")]
    pub result: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// An entity together with the `ETag` the server returned for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub entity: T,
    pub etag: Option<String>,
}

/// Outcome of a write on a provisioned entity (user, group, realm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningResult<T> {
    pub entity: T,
    #[serde(default)]
    pub propagation_statuses: Vec<PropagationStatus>,
}

/// Per-resource propagation outcome, shown verbatim to the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationStatus {
    pub resource: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Error body returned with non-success responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub status: u16,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub elements: Vec<String>,
}

/// The authenticated caller, as returned by the self endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfInfo {
    pub user: User,
    /// Entitlement name to the realms it is granted on.
    pub entitlements: BTreeMap<String, BTreeSet<String>>,
    pub delegations: Vec<String>,
}

/// A bearer token issued at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: Option<String>,
}

// ── Shared ───────────────────────────────────────────────────────────

/// A plain attribute value set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attr {
    pub schema: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub group_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

// ── Users & groups ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub username: String,
    #[serde(default = "root_realm")]
    pub realm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub must_change_password: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_change_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_logins: Option<u32>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub aux_classes: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
    #[serde(default)]
    pub plain_attrs: Vec<Attr>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: String,
    #[serde(default = "root_realm")]
    pub realm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub udyn_membership_cond: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_change_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub aux_classes: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub plain_attrs: Vec<Attr>,
}

/// Target status of a user status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusType {
    Suspend,
    Reactivate,
}

/// Body of a user status change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub key: String,
    #[serde(rename = "type")]
    pub kind: StatusType,
    pub on_syncope: bool,
}

// ── Roles & realms ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub entitlements: Vec<String>,
    #[serde(default)]
    pub realms: Vec<String>,
    #[serde(default)]
    pub dynamic_realms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dyn_membership_cond: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Realm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub full_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_policy: Option<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub actions: Vec<String>,
}

impl Realm {
    /// Path of the parent realm, derived from the full path.
    pub fn parent_path(&self) -> &str {
        match self.full_path.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &self.full_path[..idx],
        }
    }
}

fn root_realm() -> String {
    "/".into()
}

// ── Schemas ──────────────────────────────────────────────────────────

/// Schema flavor, used as a path segment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SchemaType {
    Plain,
    Derived,
    Virtual,
}

/// Value type of a plain schema; the discriminant of the schema form.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum AttrSchemaType {
    #[default]
    String,
    Long,
    Double,
    Boolean,
    Date,
    Enum,
    Dropdown,
    Encrypted,
    Binary,
}

/// Cipher algorithms accepted for encrypted schemas and domain admins.
pub const CIPHER_ALGORITHMS: &[&str] = &[
    "SHA", "SHA1", "SHA256", "SHA512", "AES", "SMD5", "SSHA", "SSHA1", "SSHA256", "SSHA512",
    "BCRYPT",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlainSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: AttrSchemaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_type_class: Option<String>,
    #[serde(default = "mandatory_false")]
    pub mandatory_condition: String,
    #[serde(default)]
    pub multivalue: bool,
    #[serde(default)]
    pub unique_constraint: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversion_pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub enum_values: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropdown_value_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cipher_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl Default for PlainSchema {
    fn default() -> Self {
        Self {
            key: None,
            kind: AttrSchemaType::String,
            any_type_class: None,
            mandatory_condition: mandatory_false(),
            multivalue: false,
            unique_constraint: false,
            readonly: false,
            conversion_pattern: None,
            validator: None,
            enum_values: BTreeMap::new(),
            dropdown_value_provider: None,
            secret_key: None,
            cipher_algorithm: None,
            mime_type: None,
        }
    }
}

fn mandatory_false() -> String {
    "false".into()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_type_class: Option<String>,
    #[serde(default)]
    pub expression: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_type_class: Option<String>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub any_type: String,
    #[serde(default)]
    pub ext_attr_name: String,
}

/// Binds a schema wire type to its path segment.
pub trait SchemaPayload: Serialize + serde::de::DeserializeOwned + Send + Sync {
    const TYPE: SchemaType;
    fn key(&self) -> Option<&str>;
}

impl SchemaPayload for PlainSchema {
    const TYPE: SchemaType = SchemaType::Plain;
    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl SchemaPayload for DerSchema {
    const TYPE: SchemaType = SchemaType::Derived;
    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

impl SchemaPayload for VirSchema {
    const TYPE: SchemaType = SchemaType::Virtual;
    fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

// ── Keymaster: domains & parameters ──────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub jdbc_driver: String,
    #[serde(rename = "jdbcURL", default)]
    pub jdbc_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_schema: Option<String>,
    #[serde(default)]
    pub db_username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_password: Option<String>,
    #[serde(default = "default_pool_max")]
    pub pool_max_active: u32,
    #[serde(default = "default_pool_min")]
    pub pool_min_idle: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(default = "default_admin_cipher")]
    pub admin_cipher_algorithm: String,
}

impl Default for Domain {
    fn default() -> Self {
        Self {
            key: None,
            jdbc_driver: String::new(),
            jdbc_url: String::new(),
            db_schema: None,
            db_username: String::new(),
            db_password: None,
            pool_max_active: default_pool_max(),
            pool_min_idle: default_pool_min(),
            admin_password: None,
            admin_cipher_algorithm: default_admin_cipher(),
        }
    }
}

fn default_pool_max() -> u32 {
    10
}

fn default_pool_min() -> u32 {
    2
}

fn default_admin_cipher() -> String {
    "SHA512".into()
}

/// A configuration parameter: a key with its typed values.
///
/// The server stores parameters as a JSON map; the console edits them
/// through this typed view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfParam {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: AttrSchemaType,
    #[serde(default)]
    pub multivalue: bool,
    #[serde(default)]
    pub values: Vec<String>,
}

// ── Applications & implementations ───────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub privileges: Vec<Privilege>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Privilege {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<String>,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ImplementationEngine {
    #[default]
    Java,
    Groovy,
}

/// Implementation types the console offers; the server accepts others too.
pub const IMPLEMENTATION_TYPES: &[&str] = &[
    "ACCOUNT_RULE",
    "PASSWORD_RULE",
    "ATTR_VALUE_VALIDATOR",
    "DROPDOWN_VALUE_PROVIDER",
    "ITEM_TRANSFORMER",
    "LOGIC_ACTIONS",
    "RECIPIENTS_PROVIDER",
    "REPORT_DELEGATE",
    "TASKJOB_DELEGATE",
    "COMMAND",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Implementation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub engine: ImplementationEngine,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub body: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn realm_parent_path() {
        let mut realm = Realm {
            full_path: "/even/two".into(),
            ..Realm::default()
        };
        assert_eq!(realm.parent_path(), "/even");
        realm.full_path = "/even".into();
        assert_eq!(realm.parent_path(), "/");
        realm.full_path = "/".into();
        assert_eq!(realm.parent_path(), "/");
    }

    #[test]
    fn paged_result_tolerates_missing_fields() {
        let page: PagedResult<Role> =
            serde_json::from_str(r#"{"totalCount": 3, "result": [{"key": "a"}]}"#).unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.result[0].key.as_deref(), Some("a"));
        assert_eq!(page.page, 0);
    }

    #[test]
    fn schema_type_parses_case_insensitively() {
        assert_eq!("plain".parse::<SchemaType>().unwrap(), SchemaType::Plain);
        assert_eq!("enum".parse::<AttrSchemaType>().unwrap(), AttrSchemaType::Enum);
        assert_eq!(SchemaType::Virtual.to_string(), "VIRTUAL");
    }
}
