// ── Per-entity forms ──

use std::collections::BTreeMap;

use crate::error::CoreError;
use crate::model::{
    Application, AttrSchemaType, CIPHER_ALGORITHMS, ConfParam, DerSchema, Domain,
    ENCRYPTED_DECODE_CONVERSION_PATTERN, Group, IMPLEMENTATION_TYPES, Implementation,
    ImplementationEngine, PlainSchema, Privilege, Realm, Role, User, VirSchema,
};

use super::Mode;
use super::form::{Field, FieldKind, FieldValue, Form, Lookup, Step, unknown_field};

const DETAILS: &str = "details";

const fn step(id: &'static str, title: &'static str) -> Step {
    Step { id, title }
}

const fn text(id: &'static str, label: &'static str, step: &'static str) -> Field {
    Field::new(id, label, step, FieldKind::Text)
}

const fn flag(id: &'static str, label: &'static str, step: &'static str) -> Field {
    Field::new(id, label, step, FieldKind::Flag)
}

const fn list(id: &'static str, label: &'static str, step: &'static str) -> Field {
    Field::new(id, label, step, FieldKind::List(None))
}

pub const ATTR_SCHEMA_TYPES: &[&str] = &[
    "String",
    "Long",
    "Double",
    "Boolean",
    "Date",
    "Enum",
    "Dropdown",
    "Encrypted",
    "Binary",
];

pub const ENGINES: &[&str] = &["JAVA", "GROOVY"];

fn parse_choice<T: std::str::FromStr>(field: &str, value: &FieldValue) -> Result<T, CoreError> {
    value
        .as_text()
        .parse()
        .map_err(|_| CoreError::validation(format!("invalid {field}: {value}")))
}

/// Create-mode key for kinds whose key the operator types.
fn set_key(key: &mut Option<String>, value: FieldValue) {
    *key = value.into_opt();
}

// ── Users ────────────────────────────────────────────────────────────

impl Form for User {
    fn steps() -> &'static [Step] {
        const STEPS: &[Step] = &[
            step(DETAILS, "Details"),
            step("password", "Password"),
            step("roles", "Roles"),
        ];
        STEPS
    }

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            text("username", "Username", DETAILS).required(),
            Field::new("realm", "Realm", DETAILS, FieldKind::Lookup(Lookup::Realms)).required(),
            text("securityQuestion", "Security question", DETAILS),
            list("auxClasses", "Auxiliary classes", DETAILS),
            Field::new("password", "Password", "password", FieldKind::Secret),
            flag("mustChangePassword", "Must change password", "password"),
            Field::new("roles", "Roles", "roles", FieldKind::List(Some(Lookup::Roles))),
            list("resources", "Resources", "roles"),
        ];
        FIELDS
    }

    fn value(&self, field: &str) -> FieldValue {
        match field {
            "username" => FieldValue::text(&self.username),
            "realm" => FieldValue::text(&self.realm),
            "securityQuestion" => FieldValue::opt(self.security_question.as_deref()),
            "auxClasses" => FieldValue::List(self.aux_classes.clone()),
            "password" => FieldValue::opt(self.password.as_deref()),
            "mustChangePassword" => FieldValue::Flag(self.must_change_password),
            "roles" => FieldValue::List(self.roles.clone()),
            "resources" => FieldValue::List(self.resources.clone()),
            _ => FieldValue::text(""),
        }
    }

    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "username" => self.username = value.as_text(),
            "realm" => self.realm = value.as_text(),
            "securityQuestion" => self.security_question = value.into_opt(),
            "auxClasses" => self.aux_classes = value.into_list(),
            "password" => self.password = value.into_opt(),
            "mustChangePassword" => self.must_change_password = value.as_flag(),
            "roles" => self.roles = value.into_list(),
            "resources" => self.resources = value.into_list(),
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }

    fn check(&self, _mode: Mode) -> Result<(), CoreError> {
        if !self.realm.starts_with('/') {
            return Err(CoreError::validation("realm must be a full path"));
        }
        Ok(())
    }
}

// ── Groups ───────────────────────────────────────────────────────────

impl Form for Group {
    fn steps() -> &'static [Step] {
        const STEPS: &[Step] = &[step(DETAILS, "Details"), step("ownership", "Ownership")];
        STEPS
    }

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            text("name", "Name", DETAILS).required(),
            Field::new("realm", "Realm", DETAILS, FieldKind::Lookup(Lookup::Realms)).required(),
            list("auxClasses", "Auxiliary classes", DETAILS),
            list("resources", "Resources", DETAILS),
            text("userOwner", "User owner", "ownership"),
            text("groupOwner", "Group owner", "ownership"),
            text("udynMembershipCond", "Dynamic user membership (FIQL)", "ownership"),
        ];
        FIELDS
    }

    fn value(&self, field: &str) -> FieldValue {
        match field {
            "name" => FieldValue::text(&self.name),
            "realm" => FieldValue::text(&self.realm),
            "auxClasses" => FieldValue::List(self.aux_classes.clone()),
            "resources" => FieldValue::List(self.resources.clone()),
            "userOwner" => FieldValue::opt(self.user_owner.as_deref()),
            "groupOwner" => FieldValue::opt(self.group_owner.as_deref()),
            "udynMembershipCond" => FieldValue::opt(self.udyn_membership_cond.as_deref()),
            _ => FieldValue::text(""),
        }
    }

    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "name" => self.name = value.as_text(),
            "realm" => self.realm = value.as_text(),
            "auxClasses" => self.aux_classes = value.into_list(),
            "resources" => self.resources = value.into_list(),
            "userOwner" => self.user_owner = value.into_opt(),
            "groupOwner" => self.group_owner = value.into_opt(),
            "udynMembershipCond" => self.udyn_membership_cond = value.into_opt(),
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }

    fn check(&self, _mode: Mode) -> Result<(), CoreError> {
        if self.user_owner.is_some() && self.group_owner.is_some() {
            return Err(CoreError::validation(
                "a group is owned by a user or a group, not both",
            ));
        }
        Ok(())
    }
}

// ── Roles ────────────────────────────────────────────────────────────

impl Form for Role {
    fn steps() -> &'static [Step] {
        const STEPS: &[Step] = &[
            step(DETAILS, "Details"),
            step("entitlements", "Entitlements"),
            step("realms", "Realms"),
        ];
        STEPS
    }

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            text("key", "Key", DETAILS).required().create_only(),
            text("dynMembershipCond", "Dynamic membership (FIQL)", DETAILS),
            list("entitlements", "Entitlements", "entitlements"),
            Field::new("realms", "Realms", "realms", FieldKind::List(Some(Lookup::Realms))),
            list("dynamicRealms", "Dynamic realms", "realms"),
        ];
        FIELDS
    }

    fn value(&self, field: &str) -> FieldValue {
        match field {
            "key" => FieldValue::opt(self.key.as_deref()),
            "dynMembershipCond" => FieldValue::opt(self.dyn_membership_cond.as_deref()),
            "entitlements" => FieldValue::List(self.entitlements.clone()),
            "realms" => FieldValue::List(self.realms.clone()),
            "dynamicRealms" => FieldValue::List(self.dynamic_realms.clone()),
            _ => FieldValue::text(""),
        }
    }

    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "key" => set_key(&mut self.key, value),
            "dynMembershipCond" => self.dyn_membership_cond = value.into_opt(),
            "entitlements" => self.entitlements = value.into_list(),
            "realms" => self.realms = value.into_list(),
            "dynamicRealms" => self.dynamic_realms = value.into_list(),
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }
}

// ── Realms ───────────────────────────────────────────────────────────

impl Form for Realm {
    fn steps() -> &'static [Step] {
        const STEPS: &[Step] = &[step(DETAILS, "Details"), step("policies", "Policies")];
        STEPS
    }

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            text("name", "Name", DETAILS).required().create_only(),
            Field::new("parent", "Parent", DETAILS, FieldKind::Lookup(Lookup::Realms))
                .required()
                .create_only(),
            list("resources", "Resources", DETAILS),
            Field::new(
                "actions",
                "Logic actions",
                DETAILS,
                FieldKind::List(Some(Lookup::Implementations("LOGIC_ACTIONS"))),
            ),
            text("accountPolicy", "Account policy", "policies"),
            text("passwordPolicy", "Password policy", "policies"),
            text("authPolicy", "Authentication policy", "policies"),
            text("accessPolicy", "Access policy", "policies"),
        ];
        FIELDS
    }

    fn value(&self, field: &str) -> FieldValue {
        match field {
            "name" => FieldValue::text(&self.name),
            "parent" => FieldValue::text(self.parent_path()),
            "resources" => FieldValue::List(self.resources.clone()),
            "actions" => FieldValue::List(self.actions.clone()),
            "accountPolicy" => FieldValue::opt(self.account_policy.as_deref()),
            "passwordPolicy" => FieldValue::opt(self.password_policy.as_deref()),
            "authPolicy" => FieldValue::opt(self.auth_policy.as_deref()),
            "accessPolicy" => FieldValue::opt(self.access_policy.as_deref()),
            _ => FieldValue::text(""),
        }
    }

    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "name" => {
                let parent = self.parent_path().to_owned();
                self.name = value.as_text();
                self.full_path = join_path(&parent, &self.name);
            }
            "parent" => {
                let parent = value.as_text();
                self.full_path = join_path(&parent, &self.name);
            }
            "resources" => self.resources = value.into_list(),
            "actions" => self.actions = value.into_list(),
            "accountPolicy" => self.account_policy = value.into_opt(),
            "passwordPolicy" => self.password_policy = value.into_opt(),
            "authPolicy" => self.auth_policy = value.into_opt(),
            "accessPolicy" => self.access_policy = value.into_opt(),
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }

    fn check(&self, _mode: Mode) -> Result<(), CoreError> {
        if self.name.contains('/') {
            return Err(CoreError::validation("realm name cannot contain '/'"));
        }
        Ok(())
    }
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() || parent == "/" {
        format!("/{name}")
    } else {
        format!("{}/{name}", parent.trim_end_matches('/'))
    }
}

// ── Schemas ──────────────────────────────────────────────────────────

const TYPE_DETAILS: &str = "type_details";

fn shown_for(kind: AttrSchemaType, field: &str) -> bool {
    use AttrSchemaType::{Binary, Date, Double, Dropdown, Encrypted, Enum, Long};
    match field {
        "conversionPattern" => matches!(kind, Long | Double | Date),
        "enumValues" => kind == Enum,
        "dropdownValueProvider" => kind == Dropdown,
        "secretKey" | "cipherAlgorithm" | "transparentEncryption" => kind == Encrypted,
        "mimeType" => kind == Binary,
        _ => true,
    }
}

fn enum_values_to_list(values: &BTreeMap<String, String>) -> Vec<String> {
    values
        .iter()
        .map(|(k, v)| if k == v { k.clone() } else { format!("{k}={v}") })
        .collect()
}

fn enum_values_from_list(entries: Vec<String>) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .map(|entry| match entry.split_once('=') {
            Some((k, v)) => (k.trim().to_owned(), v.trim().to_owned()),
            None => (entry.clone(), entry),
        })
        .collect()
}

/// Clear type-specific attributes the schema's current type does not use.
fn clear_hidden(schema: &mut PlainSchema) {
    let kind = schema.kind;
    let keep_pattern = match kind {
        AttrSchemaType::Long | AttrSchemaType::Double | AttrSchemaType::Date => {
            !transparent_encryption(schema)
        }
        AttrSchemaType::Encrypted => transparent_encryption(schema),
        _ => false,
    };
    if !keep_pattern {
        schema.conversion_pattern = None;
    }
    if !shown_for(kind, "enumValues") {
        schema.enum_values.clear();
    }
    if !shown_for(kind, "dropdownValueProvider") {
        schema.dropdown_value_provider = None;
    }
    if !shown_for(kind, "secretKey") {
        schema.secret_key = None;
        schema.cipher_algorithm = None;
    }
    if !shown_for(kind, "mimeType") {
        schema.mime_type = None;
    }
}

fn transparent_encryption(schema: &PlainSchema) -> bool {
    schema.conversion_pattern.as_deref() == Some(ENCRYPTED_DECODE_CONVERSION_PATTERN)
}

impl Form for PlainSchema {
    fn steps() -> &'static [Step] {
        const STEPS: &[Step] = &[step(DETAILS, "Details"), step(TYPE_DETAILS, "Type details")];
        STEPS
    }

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            text("key", "Key", DETAILS).required().create_only(),
            Field::new("type", "Type", DETAILS, FieldKind::Choice(ATTR_SCHEMA_TYPES))
                .required()
                .create_only(),
            text("anyTypeClass", "Any type class", DETAILS),
            text("mandatoryCondition", "Mandatory condition", DETAILS),
            flag("multivalue", "Multivalue", DETAILS),
            flag("uniqueConstraint", "Unique constraint", DETAILS).create_only(),
            flag("readonly", "Read-only", DETAILS),
            Field::new(
                "validator",
                "Validator",
                DETAILS,
                FieldKind::Lookup(Lookup::Implementations("ATTR_VALUE_VALIDATOR")),
            ),
            text("conversionPattern", "Conversion pattern", TYPE_DETAILS),
            list("enumValues", "Enumeration values (key=value)", TYPE_DETAILS),
            Field::new(
                "dropdownValueProvider",
                "Dropdown value provider",
                TYPE_DETAILS,
                FieldKind::Lookup(Lookup::Implementations("DROPDOWN_VALUE_PROVIDER")),
            )
            .required(),
            Field::new("secretKey", "Secret key", TYPE_DETAILS, FieldKind::Secret),
            Field::new(
                "cipherAlgorithm",
                "Cipher algorithm",
                TYPE_DETAILS,
                FieldKind::Choice(CIPHER_ALGORITHMS),
            ),
            flag("transparentEncryption", "Transparent encryption", TYPE_DETAILS),
            text("mimeType", "MIME type", TYPE_DETAILS),
        ];
        FIELDS
    }

    fn value(&self, field: &str) -> FieldValue {
        match field {
            "key" => FieldValue::opt(self.key.as_deref()),
            "type" => FieldValue::text(self.kind.to_string()),
            "anyTypeClass" => FieldValue::opt(self.any_type_class.as_deref()),
            "mandatoryCondition" => FieldValue::text(&self.mandatory_condition),
            "multivalue" => FieldValue::Flag(self.multivalue),
            "uniqueConstraint" => FieldValue::Flag(self.unique_constraint),
            "readonly" => FieldValue::Flag(self.readonly),
            "validator" => FieldValue::opt(self.validator.as_deref()),
            "conversionPattern" => FieldValue::opt(self.conversion_pattern.as_deref()),
            "enumValues" => FieldValue::List(enum_values_to_list(&self.enum_values)),
            "dropdownValueProvider" => FieldValue::opt(self.dropdown_value_provider.as_deref()),
            "secretKey" => FieldValue::opt(self.secret_key.as_deref()),
            "cipherAlgorithm" => FieldValue::opt(self.cipher_algorithm.as_deref()),
            "transparentEncryption" => FieldValue::Flag(transparent_encryption(self)),
            "mimeType" => FieldValue::opt(self.mime_type.as_deref()),
            _ => FieldValue::text(""),
        }
    }

    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "key" => set_key(&mut self.key, value),
            "type" => {
                self.kind = parse_choice("type", &value)?;
                clear_hidden(self);
            }
            "anyTypeClass" => self.any_type_class = value.into_opt(),
            "mandatoryCondition" => {
                self.mandatory_condition = value.into_opt().unwrap_or_else(|| "false".into());
            }
            "multivalue" => self.multivalue = value.as_flag(),
            "uniqueConstraint" => self.unique_constraint = value.as_flag(),
            "readonly" => self.readonly = value.as_flag(),
            "validator" => self.validator = value.into_opt(),
            "conversionPattern" => self.conversion_pattern = value.into_opt(),
            "enumValues" => self.enum_values = enum_values_from_list(value.into_list()),
            "dropdownValueProvider" => self.dropdown_value_provider = value.into_opt(),
            "secretKey" => self.secret_key = value.into_opt(),
            "cipherAlgorithm" => self.cipher_algorithm = value.into_opt(),
            "transparentEncryption" => {
                self.conversion_pattern = value
                    .as_flag()
                    .then(|| ENCRYPTED_DECODE_CONVERSION_PATTERN.to_owned());
            }
            "mimeType" => self.mime_type = value.into_opt(),
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }

    fn field_visible(&self, field: &Field, _mode: Mode) -> bool {
        shown_for(self.kind, field.id)
    }

    fn check(&self, _mode: Mode) -> Result<(), CoreError> {
        if self.kind == AttrSchemaType::Enum && self.enum_values.is_empty() {
            return Err(CoreError::validation("enumeration values are required"));
        }
        if self.kind == AttrSchemaType::Encrypted
            && (self.secret_key.is_none() || self.cipher_algorithm.is_none())
        {
            return Err(CoreError::validation(
                "secret key and cipher algorithm are required",
            ));
        }
        Ok(())
    }
}

impl Form for DerSchema {
    fn steps() -> &'static [Step] {
        const STEPS: &[Step] = &[step(DETAILS, "Details")];
        STEPS
    }

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            text("key", "Key", DETAILS).required().create_only(),
            text("anyTypeClass", "Any type class", DETAILS),
            text("expression", "Expression", DETAILS).required(),
        ];
        FIELDS
    }

    fn value(&self, field: &str) -> FieldValue {
        match field {
            "key" => FieldValue::opt(self.key.as_deref()),
            "anyTypeClass" => FieldValue::opt(self.any_type_class.as_deref()),
            "expression" => FieldValue::text(&self.expression),
            _ => FieldValue::text(""),
        }
    }

    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "key" => set_key(&mut self.key, value),
            "anyTypeClass" => self.any_type_class = value.into_opt(),
            "expression" => self.expression = value.as_text(),
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }
}

impl Form for VirSchema {
    fn steps() -> &'static [Step] {
        const STEPS: &[Step] = &[step(DETAILS, "Details")];
        STEPS
    }

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            text("key", "Key", DETAILS).required().create_only(),
            text("anyTypeClass", "Any type class", DETAILS),
            flag("readonly", "Read-only", DETAILS),
            text("resource", "Resource", DETAILS).required(),
            text("anyType", "Any type", DETAILS).required(),
            text("extAttrName", "External attribute", DETAILS).required(),
        ];
        FIELDS
    }

    fn value(&self, field: &str) -> FieldValue {
        match field {
            "key" => FieldValue::opt(self.key.as_deref()),
            "anyTypeClass" => FieldValue::opt(self.any_type_class.as_deref()),
            "readonly" => FieldValue::Flag(self.readonly),
            "resource" => FieldValue::text(&self.resource),
            "anyType" => FieldValue::text(&self.any_type),
            "extAttrName" => FieldValue::text(&self.ext_attr_name),
            _ => FieldValue::text(""),
        }
    }

    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "key" => set_key(&mut self.key, value),
            "anyTypeClass" => self.any_type_class = value.into_opt(),
            "readonly" => self.readonly = value.as_flag(),
            "resource" => self.resource = value.as_text(),
            "anyType" => self.any_type = value.as_text(),
            "extAttrName" => self.ext_attr_name = value.as_text(),
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }
}

// ── Applications ─────────────────────────────────────────────────────

impl Form for Application {
    fn steps() -> &'static [Step] {
        const STEPS: &[Step] = &[step(DETAILS, "Details"), step("privileges", "Privileges")];
        STEPS
    }

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            text("key", "Key", DETAILS).required().create_only(),
            text("description", "Description", DETAILS),
            list("privileges", "Privileges", "privileges"),
        ];
        FIELDS
    }

    fn value(&self, field: &str) -> FieldValue {
        match field {
            "key" => FieldValue::opt(self.key.as_deref()),
            "description" => FieldValue::opt(self.description.as_deref()),
            "privileges" => {
                FieldValue::List(self.privileges.iter().map(|p| p.key.clone()).collect())
            }
            _ => FieldValue::text(""),
        }
    }

    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "key" => set_key(&mut self.key, value),
            "description" => self.description = value.into_opt(),
            "privileges" => {
                // Existing privileges keep their description and spec.
                let mut previous = std::mem::take(&mut self.privileges);
                self.privileges = value
                    .into_list()
                    .into_iter()
                    .map(|key| match previous.iter().position(|p| p.key == key) {
                        Some(idx) => previous.swap_remove(idx),
                        None => Privilege {
                            key,
                            ..Privilege::default()
                        },
                    })
                    .collect();
            }
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }
}

// ── Implementations ──────────────────────────────────────────────────

impl Form for Implementation {
    fn steps() -> &'static [Step] {
        const STEPS: &[Step] = &[step(DETAILS, "Details"), step("body", "Body")];
        STEPS
    }

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            text("key", "Key", DETAILS).required().create_only(),
            Field::new("type", "Type", DETAILS, FieldKind::Choice(IMPLEMENTATION_TYPES))
                .required()
                .create_only(),
            Field::new("engine", "Engine", DETAILS, FieldKind::Choice(ENGINES))
                .required()
                .create_only(),
            Field::new("body", "Body", "body", FieldKind::Multiline).required(),
        ];
        FIELDS
    }

    fn value(&self, field: &str) -> FieldValue {
        match field {
            "key" => FieldValue::opt(self.key.as_deref()),
            "type" => FieldValue::text(&self.kind),
            "engine" => FieldValue::text(self.engine.to_string()),
            "body" => FieldValue::text(&self.body),
            _ => FieldValue::text(""),
        }
    }

    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "key" => set_key(&mut self.key, value),
            "type" => self.kind = value.as_text().to_ascii_uppercase(),
            "engine" => self.engine = parse_choice::<ImplementationEngine>("engine", &value)?,
            "body" => {
                self.body = match value {
                    FieldValue::Text(t) => t,
                    other => other.as_text(),
                };
            }
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }
}

// ── Keymaster ────────────────────────────────────────────────────────

impl Form for Domain {
    fn steps() -> &'static [Step] {
        const STEPS: &[Step] = &[step(DETAILS, "Details"), step("storage", "Storage")];
        STEPS
    }

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            text("key", "Key", DETAILS).required().create_only(),
            Field::new("adminPassword", "Admin password", DETAILS, FieldKind::Secret),
            Field::new(
                "adminCipherAlgorithm",
                "Admin cipher algorithm",
                DETAILS,
                FieldKind::Choice(CIPHER_ALGORITHMS),
            )
            .required(),
            text("jdbcDriver", "JDBC driver", "storage").required().create_only(),
            text("jdbcURL", "JDBC URL", "storage").required().create_only(),
            text("dbSchema", "DB schema", "storage").create_only(),
            text("dbUsername", "DB username", "storage").required().create_only(),
            Field::new("dbPassword", "DB password", "storage", FieldKind::Secret).create_only(),
            Field::new("poolMaxActive", "Pool max active", "storage", FieldKind::Number).required(),
            Field::new("poolMinIdle", "Pool min idle", "storage", FieldKind::Number).required(),
        ];
        FIELDS
    }

    fn value(&self, field: &str) -> FieldValue {
        match field {
            "key" => FieldValue::opt(self.key.as_deref()),
            "adminPassword" => FieldValue::opt(self.admin_password.as_deref()),
            "adminCipherAlgorithm" => FieldValue::text(&self.admin_cipher_algorithm),
            "jdbcDriver" => FieldValue::text(&self.jdbc_driver),
            "jdbcURL" => FieldValue::text(&self.jdbc_url),
            "dbSchema" => FieldValue::opt(self.db_schema.as_deref()),
            "dbUsername" => FieldValue::text(&self.db_username),
            "dbPassword" => FieldValue::opt(self.db_password.as_deref()),
            "poolMaxActive" => FieldValue::text(self.pool_max_active.to_string()),
            "poolMinIdle" => FieldValue::text(self.pool_min_idle.to_string()),
            _ => FieldValue::text(""),
        }
    }

    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "key" => set_key(&mut self.key, value),
            "adminPassword" => self.admin_password = value.into_opt(),
            "adminCipherAlgorithm" => self.admin_cipher_algorithm = value.as_text(),
            "jdbcDriver" => self.jdbc_driver = value.as_text(),
            "jdbcURL" => self.jdbc_url = value.as_text(),
            "dbSchema" => self.db_schema = value.into_opt(),
            "dbUsername" => self.db_username = value.as_text(),
            "dbPassword" => self.db_password = value.into_opt(),
            "poolMaxActive" => self.pool_max_active = value.as_number(field)?,
            "poolMinIdle" => self.pool_min_idle = value.as_number(field)?,
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }

    fn check(&self, mode: Mode) -> Result<(), CoreError> {
        if mode == Mode::Create && self.admin_password.is_none() {
            return Err(CoreError::validation("admin password is required"));
        }
        if self.pool_min_idle > self.pool_max_active {
            return Err(CoreError::validation(
                "pool min idle cannot exceed pool max active",
            ));
        }
        Ok(())
    }
}

impl Form for ConfParam {
    fn steps() -> &'static [Step] {
        const STEPS: &[Step] = &[step("schema", "Schema"), step("values", "Values")];
        STEPS
    }

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[
            text("key", "Key", "schema").required().create_only(),
            Field::new("type", "Type", "schema", FieldKind::Choice(ATTR_SCHEMA_TYPES)).required(),
            flag("multivalue", "Multivalue", "schema"),
            list("values", "Values", "values"),
        ];
        FIELDS
    }

    fn value(&self, field: &str) -> FieldValue {
        match field {
            "key" => FieldValue::opt(self.key.as_deref()),
            "type" => FieldValue::text(self.kind.to_string()),
            "multivalue" => FieldValue::Flag(self.multivalue),
            "values" => FieldValue::List(self.values.clone()),
            _ => FieldValue::text(""),
        }
    }

    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError> {
        match field {
            "key" => set_key(&mut self.key, value),
            "type" => self.kind = parse_choice("type", &value)?,
            "multivalue" => self.multivalue = value.as_flag(),
            "values" => self.values = value.into_list(),
            other => return Err(unknown_field(other)),
        }
        Ok(())
    }

    fn check(&self, _mode: Mode) -> Result<(), CoreError> {
        if !self.multivalue && self.values.len() > 1 {
            return Err(CoreError::validation(
                "a single-valued parameter takes one value",
            ));
        }
        for value in &self.values {
            let ok = match self.kind {
                AttrSchemaType::Long => value.parse::<i64>().is_ok(),
                AttrSchemaType::Double => value.parse::<f64>().is_ok(),
                AttrSchemaType::Boolean => value.parse::<bool>().is_ok(),
                _ => true,
            };
            if !ok {
                return Err(CoreError::validation(format!(
                    "{value} is not a valid {} value",
                    self.kind
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn type_change_clears_hidden_fields() {
        let mut schema = PlainSchema::default();
        schema
            .set_value("type", FieldValue::text("Long"))
            .unwrap();
        schema
            .set_value("conversionPattern", FieldValue::text("###"))
            .unwrap();
        schema.set_value("type", FieldValue::text("Enum")).unwrap();
        assert_eq!(schema.conversion_pattern, None);
        schema
            .set_value("enumValues", FieldValue::text("M=Male, F=Female"))
            .unwrap();
        assert_eq!(schema.enum_values.len(), 2);
        schema.set_value("type", FieldValue::text("String")).unwrap();
        assert!(schema.enum_values.is_empty());
    }

    #[test]
    fn transparent_encryption_uses_decode_pattern() {
        let mut schema = PlainSchema::default();
        schema
            .set_value("type", FieldValue::text("Encrypted"))
            .unwrap();
        schema
            .set_value("transparentEncryption", FieldValue::Flag(true))
            .unwrap();
        assert_eq!(
            schema.conversion_pattern.as_deref(),
            Some(ENCRYPTED_DECODE_CONVERSION_PATTERN)
        );
        assert_eq!(schema.value("transparentEncryption"), FieldValue::Flag(true));
        schema.set_value("type", FieldValue::text("Binary")).unwrap();
        assert_eq!(schema.conversion_pattern, None);
    }

    #[test]
    fn numeric_type_change_keeps_conversion_pattern() {
        let mut schema = PlainSchema::default();
        schema.set_value("type", FieldValue::text("Long")).unwrap();
        schema
            .set_value("conversionPattern", FieldValue::text("#,##0"))
            .unwrap();
        schema.set_value("type", FieldValue::text("Double")).unwrap();
        assert_eq!(schema.conversion_pattern.as_deref(), Some("#,##0"));
        assert_eq!(schema.value("transparentEncryption"), FieldValue::Flag(false));
    }

    #[test]
    fn schema_fields_follow_type() {
        let mut schema = PlainSchema::default();
        let pattern = PlainSchema::field("conversionPattern").unwrap();
        let provider = PlainSchema::field("dropdownValueProvider").unwrap();
        assert!(!schema.field_visible(pattern, Mode::Create));
        schema.set_value("type", FieldValue::text("Date")).unwrap();
        assert!(schema.field_visible(pattern, Mode::Create));
        schema.set_value("type", FieldValue::text("Dropdown")).unwrap();
        assert!(schema.field_visible(provider, Mode::Create));
        assert!(!schema.field_visible(pattern, Mode::Create));
    }

    #[test]
    fn enum_values_render_plain_when_key_equals_value() {
        let mut schema = PlainSchema::default();
        schema.kind = AttrSchemaType::Enum;
        schema
            .set_value("enumValues", FieldValue::List(vec!["red".into(), "b=blue".into()]))
            .unwrap();
        assert_eq!(
            schema.value("enumValues"),
            FieldValue::List(vec!["b=blue".into(), "red".into()])
        );
    }

    #[test]
    fn realm_path_follows_name_and_parent() {
        let mut realm = Realm::default();
        realm.set_value("parent", FieldValue::text("/even")).unwrap();
        realm.set_value("name", FieldValue::text("two")).unwrap();
        assert_eq!(realm.full_path, "/even/two");
        assert_eq!(realm.value("parent"), FieldValue::text("/even"));
    }

    #[test]
    fn application_privileges_keep_specs() {
        let mut app = Application {
            privileges: vec![Privilege {
                key: "getMighty".into(),
                spec: Some("{}".into()),
                ..Privilege::default()
            }],
            ..Application::default()
        };
        app.set_value("privileges", FieldValue::text("getMighty, postMighty"))
            .unwrap();
        assert_eq!(app.privileges.len(), 2);
        assert_eq!(app.privileges[0].spec.as_deref(), Some("{}"));
    }

    #[test]
    fn single_valued_param_rejects_many_values() {
        let param = ConfParam {
            key: Some("password.cipher.algorithm".into()),
            values: vec!["SHA1".into(), "SHA256".into()],
            ..ConfParam::default()
        };
        assert!(param.check(Mode::Edit).is_err());
        let param = ConfParam {
            key: Some("token.length".into()),
            kind: AttrSchemaType::Long,
            values: vec!["x".into()],
            ..ConfParam::default()
        };
        assert!(param.check(Mode::Edit).is_err());
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(User::default().set_value("nickname", FieldValue::text("x")).is_err());
    }
}
