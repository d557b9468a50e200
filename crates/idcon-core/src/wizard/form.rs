// ── Form model ──
//
// Wizards edit entities field by field. A `Form` implementation maps
// field ids to the entity's own attributes and decides which steps and
// fields the current working copy shows.

use std::fmt;

use serde::Serialize;

use crate::error::CoreError;
use crate::model::Entity;

use super::Mode;

/// One page of a wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Step {
    pub id: &'static str,
    pub title: &'static str,
}

/// Where the choices of a lookup field come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Lookup {
    Roles,
    Realms,
    /// Implementations of the given type.
    Implementations(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldKind {
    Text,
    /// Masked on screen, never echoed back.
    Secret,
    Multiline,
    Flag,
    Number,
    /// One of a fixed set.
    Choice(&'static [&'static str]),
    /// One of a set fetched from the server.
    Lookup(Lookup),
    /// Several values; lookups restrict the allowed entries.
    List(Option<Lookup>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Field {
    pub id: &'static str,
    pub label: &'static str,
    pub step: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Editable only while creating.
    pub create_only: bool,
}

impl Field {
    pub const fn new(id: &'static str, label: &'static str, step: &'static str, kind: FieldKind) -> Self {
        Self {
            id,
            label,
            step,
            kind,
            required: false,
            create_only: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    pub fn lookup(&self) -> Option<Lookup> {
        match self.kind {
            FieldKind::Lookup(lookup) | FieldKind::List(Some(lookup)) => Some(lookup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn opt(value: Option<&str>) -> Self {
        Self::Text(value.unwrap_or_default().to_owned())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(t) => t.trim().is_empty(),
            Self::Flag(_) => false,
            Self::List(l) => l.is_empty(),
        }
    }

    /// Text content, trimmed; flags and lists render as text.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(t) => t.trim().to_owned(),
            Self::Flag(b) => b.to_string(),
            Self::List(l) => l.join(", "),
        }
    }

    /// `None` for blank text.
    pub fn into_opt(self) -> Option<String> {
        Some(self.as_text()).filter(|t| !t.is_empty())
    }

    pub fn as_flag(&self) -> bool {
        match self {
            Self::Flag(b) => *b,
            Self::Text(t) => matches!(t.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"),
            Self::List(l) => !l.is_empty(),
        }
    }

    /// Lists as-is; text split on commas and newlines.
    pub fn into_list(self) -> Vec<String> {
        match self {
            Self::List(l) => l,
            Self::Text(t) => t
                .split([',', '\n'])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
            Self::Flag(b) => vec![b.to_string()],
        }
    }

    pub fn as_number(&self, field: &str) -> Result<u32, CoreError> {
        self.as_text()
            .parse()
            .map_err(|_| CoreError::validation(format!("{field} must be a number")))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// Field-level access to an entity for wizards.
pub trait Form: Entity {
    fn steps() -> &'static [Step];

    fn fields() -> &'static [Field];

    fn value(&self, field: &str) -> FieldValue;

    /// Store `value`; unknown fields are rejected.
    fn set_value(&mut self, field: &str, value: FieldValue) -> Result<(), CoreError>;

    /// Whether `field` is shown for the current working copy.
    fn field_visible(&self, _field: &Field, _mode: Mode) -> bool {
        true
    }

    /// Entity-specific checks beyond required fields.
    fn check(&self, _mode: Mode) -> Result<(), CoreError> {
        Ok(())
    }

    fn field(id: &str) -> Option<&'static Field> {
        Self::fields().iter().find(|f| f.id == id)
    }
}

pub(crate) fn unknown_field(field: &str) -> CoreError {
    CoreError::validation(format!("unknown field {field}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_splits_into_list() {
        assert_eq!(
            FieldValue::text("a, b,\nc,,").into_list(),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn blank_text_is_empty_and_none() {
        let v = FieldValue::text("   ");
        assert!(v.is_empty());
        assert_eq!(v.into_opt(), None);
        assert!(!FieldValue::Flag(false).is_empty());
    }

    #[test]
    fn number_parse_error_names_field() {
        let err = FieldValue::text("ten").as_number("poolMaxActive").err();
        assert!(err.is_some_and(|e| e.to_string().contains("poolMaxActive")));
    }
}
