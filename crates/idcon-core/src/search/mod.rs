// ── FIQL search ──
//
// Directories filter server-side with FIQL. Operators compose clauses
// (attribute, membership, resource) that are rendered left to right:
// an OR joins with `,`, an AND with `;`, and an AND following an OR
// parenthesizes what came before.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::error::CoreError;
use crate::model::EntityKind;

/// Token for a null value in FIQL comparisons.
pub const NULL_VALUE: &str = "$null";

const GROUPS_PROPERTY: &str = "$groups";
const ROLES_PROPERTY: &str = "$roles";
const RESOURCES_PROPERTY: &str = "$resources";
const RELATIONSHIPS_PROPERTY: &str = "$relationships";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ClauseType {
    #[default]
    Attribute,
    GroupMembership,
    RoleMembership,
    Resource,
    Relationship,
    /// Property and comparator written as-is.
    Custom,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Operator {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "snake_case")]
pub enum Comparator {
    #[default]
    Equals,
    NotEquals,
    LessThan,
    LessOrEquals,
    GreaterThan,
    GreaterOrEquals,
    IsNull,
    IsNotNull,
}

impl Comparator {
    /// FIQL operator.
    pub fn fiql(self) -> &'static str {
        match self {
            Self::Equals | Self::IsNull => "==",
            Self::NotEquals | Self::IsNotNull => "!=",
            Self::LessThan => "=lt=",
            Self::LessOrEquals => "=le=",
            Self::GreaterThan => "=gt=",
            Self::GreaterOrEquals => "=ge=",
        }
    }

    /// Operator-facing symbol.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "==",
            Self::NotEquals => "!=",
            Self::LessThan => "<",
            Self::LessOrEquals => "=le=",
            Self::GreaterThan => ">",
            Self::GreaterOrEquals => "=ge=",
            Self::IsNull => "NULL",
            Self::IsNotNull => "NOT NULL",
        }
    }

    fn takes_value(self) -> bool {
        !matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

impl std::str::FromStr for Comparator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "==" | "=" | "eq" => Ok(Self::Equals),
            "!=" | "ne" => Ok(Self::NotEquals),
            "<" | "=lt=" | "lt" => Ok(Self::LessThan),
            "<=" | "=le=" | "le" => Ok(Self::LessOrEquals),
            ">" | "=gt=" | "gt" => Ok(Self::GreaterThan),
            ">=" | "=ge=" | "ge" => Ok(Self::GreaterOrEquals),
            other => match other.to_ascii_uppercase().as_str() {
                "NULL" | "IS NULL" => Ok(Self::IsNull),
                "NOT NULL" | "IS NOT NULL" => Ok(Self::IsNotNull),
                _ => Err(CoreError::validation(format!("unknown comparator {other}"))),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchClause {
    pub kind: ClauseType,
    /// How this clause joins the ones before it; ignored on the first.
    pub operator: Operator,
    pub comparator: Comparator,
    /// Attribute name; unused by membership and resource clauses.
    pub property: String,
    pub value: String,
}

impl SearchClause {
    pub fn attribute(property: impl Into<String>, comparator: Comparator, value: impl Into<String>) -> Self {
        Self {
            kind: ClauseType::Attribute,
            comparator,
            property: property.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self {
            kind: ClauseType::GroupMembership,
            value: name.into(),
            ..Self::default()
        }
    }

    pub fn role(name: impl Into<String>) -> Self {
        Self {
            kind: ClauseType::RoleMembership,
            value: name.into(),
            ..Self::default()
        }
    }

    pub fn resource(name: impl Into<String>) -> Self {
        Self {
            kind: ClauseType::Resource,
            value: name.into(),
            ..Self::default()
        }
    }

    pub fn or(mut self) -> Self {
        self.operator = Operator::Or;
        self
    }

    /// Parse `property<op>value`, e.g. `username==rossini`, `email=gt=a`,
    /// `$groups==root` or `firstname NULL`.
    pub fn parse(expr: &str) -> Result<Self, CoreError> {
        let expr = expr.trim();
        for suffix in [" NOT NULL", " NULL"] {
            let Some(cut) = expr.len().checked_sub(suffix.len()).filter(|cut| *cut > 0) else {
                continue;
            };
            // `cut` may fall inside a multibyte character of the value.
            let (Some(property), Some(tail)) = (expr.get(..cut), expr.get(cut..)) else {
                continue;
            };
            if tail.eq_ignore_ascii_case(suffix) {
                let comparator = suffix.trim().parse()?;
                return Ok(Self::attribute(property.trim(), comparator, ""));
            }
        }
        let (property, comparator, value) = split_comparison(expr)
            .ok_or_else(|| CoreError::validation(format!("not a search clause: {expr}")))?;
        Ok(classify(property, comparator, &unescape(value)))
    }

    fn render(&self) -> String {
        let (property, comparator) = match self.kind {
            ClauseType::Attribute | ClauseType::Custom => {
                (self.property.as_str(), self.comparator)
            }
            ClauseType::GroupMembership => (GROUPS_PROPERTY, self.comparator),
            ClauseType::RoleMembership => (ROLES_PROPERTY, self.comparator),
            ClauseType::Resource => (RESOURCES_PROPERTY, self.comparator),
            ClauseType::Relationship => (RELATIONSHIPS_PROPERTY, self.comparator),
        };
        let value = if comparator.takes_value() {
            escape(&self.value)
        } else {
            NULL_VALUE.to_owned()
        };
        format!("{property}{}{value}", comparator.fiql())
    }
}

/// Escape FIQL separators inside a value.
pub fn escape(value: &str) -> String {
    value
        .replace(',', "%252C")
        .replace(';', "%253B")
        .replace('+', "%252B")
}

pub fn unescape(value: &str) -> String {
    value
        .replace("%252C", ",")
        .replace("%253B", ";")
        .replace("%252B", "+")
}

/// Render clauses to FIQL; `None` when there is nothing to filter on.
pub fn build_fiql(clauses: &[SearchClause]) -> Option<String> {
    let mut fiql = String::new();
    let mut has_or = false;
    for clause in clauses {
        if clause.kind != ClauseType::Attribute && clause.kind != ClauseType::Custom
            && clause.value.is_empty()
        {
            continue;
        }
        if clause.kind == ClauseType::Attribute && clause.property.is_empty() {
            continue;
        }
        let rendered = clause.render();
        if fiql.is_empty() {
            fiql = rendered;
            continue;
        }
        match clause.operator {
            Operator::Or => {
                fiql = format!("{fiql},{rendered}");
                has_or = true;
            }
            Operator::And if has_or => {
                fiql = format!("({fiql});{rendered}");
                has_or = false;
            }
            Operator::And => fiql = format!("{fiql};{rendered}"),
        }
    }
    Some(fiql).filter(|f| !f.is_empty())
}

/// Parse FIQL produced by [`build_fiql`] back into clauses. Grouping
/// parentheses are dropped, parentheses inside a value are kept; each
/// clause keeps the separator that preceded it.
pub fn parse_fiql(fiql: &str) -> Result<Vec<SearchClause>, CoreError> {
    let mut clauses = Vec::new();
    let mut operator = Operator::And;
    let mut current = String::new();
    let mut flush = |current: &mut String, operator: Operator| -> Result<(), CoreError> {
        let expr = current.trim();
        if !expr.is_empty() {
            let mut clause = SearchClause::parse(expr)?;
            clause.operator = operator;
            clauses.push(clause);
        }
        current.clear();
        Ok(())
    };
    // Open groups, and open parentheses within the current value.
    let mut groups = 0_usize;
    let mut nested = 0_usize;
    for ch in fiql.chars() {
        match ch {
            '(' if current.trim().is_empty() => groups += 1,
            '(' => {
                nested += 1;
                current.push(ch);
            }
            ')' if nested > 0 => {
                nested -= 1;
                current.push(ch);
            }
            ')' if groups > 0 => groups -= 1,
            ';' => {
                flush(&mut current, operator)?;
                nested = 0;
                operator = Operator::And;
            }
            ',' => {
                flush(&mut current, operator)?;
                nested = 0;
                operator = Operator::Or;
            }
            c => current.push(c),
        }
    }
    flush(&mut current, operator)?;
    if let Some(first) = clauses.first_mut() {
        first.operator = Operator::And;
    }
    Ok(clauses)
}

/// Keyword filter and clauses of a directory search, joined with AND.
pub fn directory_fiql(
    kind: EntityKind,
    keyword: Option<&str>,
    clauses: &[SearchClause],
) -> Option<String> {
    let keyword = keyword.and_then(|k| keyword_fiql(kind, k));
    match (keyword, build_fiql(clauses)) {
        (Some(k), Some(c)) if c.contains(',') => Some(format!("{k};({c})")),
        (Some(k), Some(c)) => Some(format!("{k};{c}")),
        (k, c) => k.or(c),
    }
}

/// Filter matching `keyword` anywhere in the name of `kind`.
pub fn keyword_fiql(kind: EntityKind, keyword: &str) -> Option<String> {
    let keyword = keyword.trim();
    if keyword.is_empty() {
        return None;
    }
    let property = match kind {
        EntityKind::User => "username",
        EntityKind::Group | EntityKind::Realm => "name",
        _ => "key",
    };
    Some(format!("{property}=~*{}*", escape(keyword)))
}

const COMPARATORS: &[(&str, Comparator)] = &[
    ("=lt=", Comparator::LessThan),
    ("=le=", Comparator::LessOrEquals),
    ("=gt=", Comparator::GreaterThan),
    ("=ge=", Comparator::GreaterOrEquals),
    ("==", Comparator::Equals),
    ("!=", Comparator::NotEquals),
    ("=~", Comparator::Equals),
];

fn split_comparison(expr: &str) -> Option<(&str, Comparator, &str)> {
    COMPARATORS
        .iter()
        .filter_map(|(op, cmp)| expr.find(op).map(|idx| (idx, *op, *cmp)))
        .min_by_key(|(idx, op, _)| (*idx, usize::MAX - op.len()))
        .map(|(idx, op, cmp)| (expr[..idx].trim(), cmp, expr[idx + op.len()..].trim()))
}

fn classify(property: &str, comparator: Comparator, value: &str) -> SearchClause {
    let comparator = match (comparator, value == NULL_VALUE) {
        (Comparator::Equals, true) => Comparator::IsNull,
        (Comparator::NotEquals, true) => Comparator::IsNotNull,
        (c, _) => c,
    };
    let value = if comparator.takes_value() {
        value.to_owned()
    } else {
        String::new()
    };
    let kind = match property {
        GROUPS_PROPERTY => ClauseType::GroupMembership,
        ROLES_PROPERTY => ClauseType::RoleMembership,
        RESOURCES_PROPERTY => ClauseType::Resource,
        RELATIONSHIPS_PROPERTY => ClauseType::Relationship,
        p if p.starts_with('$') => ClauseType::Custom,
        _ => ClauseType::Attribute,
    };
    let property = match kind {
        ClauseType::Attribute | ClauseType::Custom => property.to_owned(),
        _ => String::new(),
    };
    SearchClause {
        kind,
        operator: Operator::And,
        comparator,
        property,
        value,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn renders_clause_types() {
        let clauses = vec![
            SearchClause::attribute("username", Comparator::Equals, "rossini"),
            SearchClause::group("root"),
            SearchClause::role("Other").or(),
            SearchClause::resource("resource-ldap"),
        ];
        assert_eq!(
            build_fiql(&clauses).unwrap(),
            "(username==rossini;$groups==root,$roles==Other);$resources==resource-ldap"
        );
    }

    #[test]
    fn null_comparators_use_null_token() {
        let clauses = vec![
            SearchClause::attribute("loginDate", Comparator::IsNull, "ignored"),
            SearchClause::attribute("email", Comparator::IsNotNull, "").or(),
        ];
        assert_eq!(
            build_fiql(&clauses).unwrap(),
            "loginDate==$null,email!=$null"
        );
    }

    #[test]
    fn values_escape_separators() {
        let clause = SearchClause::attribute("fullname", Comparator::Equals, "Verdi, G;+");
        assert_eq!(
            build_fiql(&[clause]).unwrap(),
            "fullname==Verdi%252C G%253B%252B"
        );
    }

    #[test]
    fn empty_clauses_produce_no_filter() {
        assert_eq!(build_fiql(&[]), None);
        assert_eq!(build_fiql(&[SearchClause::group("")]), None);
    }

    #[test]
    fn parse_reverses_build() {
        let clauses = vec![
            SearchClause::attribute("username", Comparator::NotEquals, "a,b"),
            SearchClause::group("root").or(),
            SearchClause::attribute("failedLogins", Comparator::GreaterOrEquals, "3"),
            SearchClause::attribute("email", Comparator::IsNull, ""),
        ];
        let fiql = build_fiql(&clauses).unwrap();
        assert_eq!(parse_fiql(&fiql).unwrap(), clauses);
    }

    #[test]
    fn parse_single_expressions() {
        let c = SearchClause::parse("lastChangeDate=lt=2024-01-01").unwrap();
        assert_eq!(c.comparator, Comparator::LessThan);
        assert_eq!(c.value, "2024-01-01");
        let c = SearchClause::parse("email NOT NULL").unwrap();
        assert_eq!(c.comparator, Comparator::IsNotNull);
        assert_eq!(c.property, "email");
        assert!(SearchClause::parse("username").is_err());
    }

    #[test]
    fn parse_handles_multibyte_values() {
        let c = SearchClause::parse("name==日本").unwrap();
        assert_eq!(c.property, "name");
        assert_eq!(c.value, "日本");
        let c = SearchClause::parse("städte NULL").unwrap();
        assert_eq!(c.comparator, Comparator::IsNull);
        assert_eq!(c.property, "städte");
        assert!(SearchClause::parse("名前").is_err());
    }

    #[test]
    fn parse_keeps_parentheses_inside_values() {
        assert_eq!(
            parse_fiql("name==a(b)").unwrap(),
            vec![SearchClause::attribute("name", Comparator::Equals, "a(b)")]
        );
        let clauses = vec![
            SearchClause::attribute("fullname", Comparator::Equals, "Verdi (G)"),
            SearchClause::group("root").or(),
            SearchClause::attribute("title", Comparator::Equals, "f(x)"),
        ];
        let fiql = build_fiql(&clauses).unwrap();
        assert_eq!(fiql, "(fullname==Verdi (G),$groups==root);title==f(x)");
        assert_eq!(parse_fiql(&fiql).unwrap(), clauses);
    }

    #[test]
    fn keyword_targets_name_property() {
        assert_eq!(
            keyword_fiql(EntityKind::User, "ross").as_deref(),
            Some("username=~*ross*")
        );
        assert_eq!(
            keyword_fiql(EntityKind::Group, "adm").as_deref(),
            Some("name=~*adm*")
        );
        assert_eq!(keyword_fiql(EntityKind::User, "  "), None);
    }

    #[test]
    fn keyword_and_clauses_combine() {
        let clauses = vec![
            SearchClause::group("root"),
            SearchClause::group("child").or(),
        ];
        assert_eq!(
            directory_fiql(EntityKind::User, Some("ross"), &clauses).as_deref(),
            Some("username=~*ross*;($groups==root,$groups==child)")
        );
        assert_eq!(
            directory_fiql(EntityKind::User, None, &clauses[..1]).as_deref(),
            Some("$groups==root")
        );
        assert_eq!(directory_fiql(EntityKind::Group, Some(""), &[]), None);
    }
}
